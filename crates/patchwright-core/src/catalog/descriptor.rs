//! Descriptor parsing: `parameter_groups` JSON into a `SchemaSnapshot`.

use super::{ParameterDataType, ParameterDefinition, ParameterGroup, ParameterRange, SchemaSnapshot};
use crate::error::CatalogError;
use crate::util::{eq_ignore_case, fold_key, non_blank};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
struct GroupEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    parameters: Option<Vec<ParameterEntry>>,
}

#[derive(Deserialize)]
struct ParameterEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    range: Option<RangeEntry>,
    #[serde(default)]
    values: Option<Vec<ValueEntry>>,
    #[serde(default)]
    alias_of: Option<String>,
}

#[derive(Deserialize)]
struct RangeEntry {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    step: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
}

/// Enum/list values come either bare or as `{ "value": ..., "label": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ValueEntry {
    Bare(String),
    Labeled {
        #[serde(default)]
        value: Option<String>,
    },
    Other(serde::de::IgnoredAny),
}

impl ValueEntry {
    fn value(&self) -> Option<&str> {
        match self {
            ValueEntry::Bare(value) => Some(value),
            ValueEntry::Labeled { value } => value.as_deref(),
            ValueEntry::Other(_) => None,
        }
    }
}

pub(super) fn parse_descriptor(text: &str) -> Result<SchemaSnapshot, CatalogError> {
    let root: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| CatalogError::load(format!("Schema file is not valid JSON: {}", e)))?;

    let groups_value = root
        .get("parameter_groups")
        .filter(|v| v.is_array())
        .cloned()
        .ok_or_else(|| CatalogError::load("Schema file is missing 'parameter_groups' array."))?;

    let entries: Vec<GroupEntry> = serde_json::from_value(groups_value)
        .map_err(|e| CatalogError::load(format!("Malformed 'parameter_groups': {}", e)))?;

    let mut parameters: HashMap<String, ParameterDefinition> = HashMap::new();
    let mut groups: Vec<ParameterGroup> = Vec::with_capacity(entries.len());

    for entry in entries {
        let group_id = non_blank(entry.id.as_deref())
            .ok_or_else(|| CatalogError::load("Each parameter group must declare an 'id'."))?
            .to_string();
        if groups.iter().any(|g| eq_ignore_case(&g.id, &group_id)) {
            return Err(CatalogError::load(format!(
                "Parameter group '{}' is declared more than once.",
                group_id
            )));
        }
        let params = entry.parameters.ok_or_else(|| {
            CatalogError::load(format!(
                "Group '{}' must include a 'parameters' array.",
                group_id
            ))
        })?;

        let mut parameter_ids = Vec::with_capacity(params.len());
        for param in params {
            let definition = parse_parameter(&group_id, param)?;
            parameter_ids.push(definition.id.clone());
            parameters.insert(fold_key(&definition.id), definition);
        }

        let label = non_blank(entry.label.as_deref())
            .unwrap_or(&group_id)
            .to_string();
        groups.push(ParameterGroup {
            id: group_id,
            label,
            parameter_ids,
        });
    }

    Ok(SchemaSnapshot::new(parameters, groups))
}

fn parse_parameter(group_id: &str, entry: ParameterEntry) -> Result<ParameterDefinition, CatalogError> {
    let id = non_blank(entry.id.as_deref())
        .ok_or_else(|| {
            CatalogError::load(format!(
                "Parameter in group '{}' is missing an 'id'.",
                group_id
            ))
        })?
        .to_string();

    let type_str = non_blank(entry.kind.as_deref())
        .ok_or_else(|| CatalogError::load(format!("Parameter '{}' is missing a 'type'.", id)))?;
    let data_type = ParameterDataType::parse(type_str).ok_or_else(|| {
        CatalogError::load(format!(
            "Unsupported parameter type '{}' for '{}'.",
            type_str, id
        ))
    })?;

    let range = match entry.range {
        Some(range) => match (range.min, range.max) {
            (Some(min), Some(max)) => Some(ParameterRange {
                min,
                max,
                step: range.step,
                unit: non_blank(range.unit.as_deref()).map(str::to_string),
            }),
            _ => {
                return Err(CatalogError::load(format!(
                    "Parameter '{}' range must declare both 'min' and 'max'.",
                    id
                )))
            }
        },
        None => None,
    };

    let mut allowed_values: Vec<String> = Vec::new();
    for value_entry in entry.values.iter().flatten() {
        let Some(value) = non_blank(value_entry.value()) else {
            continue;
        };
        if !allowed_values.iter().any(|seen| eq_ignore_case(seen, value)) {
            allowed_values.push(value.to_string());
        }
    }

    let alias_of = if data_type == ParameterDataType::Alias {
        let target = non_blank(entry.alias_of.as_deref()).ok_or_else(|| {
            CatalogError::load(format!(
                "Alias parameter '{}' must declare 'alias_of'.",
                id
            ))
        })?;
        Some(target.to_string())
    } else {
        None
    };

    let label = non_blank(entry.name.as_deref())
        .or_else(|| non_blank(entry.label.as_deref()))
        .unwrap_or(&id)
        .to_string();

    Ok(ParameterDefinition {
        id,
        label,
        data_type,
        range,
        allowed_values,
        alias_of,
    })
}
