//! Generation-facing view of the catalog.
//!
//! Collapses the schema's data types into the three value types a model is
//! asked to produce, and renders the deterministic catalog text embedded in
//! the system prompt.

use super::{ParameterDataType, ParameterRange, SchemaSnapshot};
use crate::util::{eq_ignore_case, fold_key, format_number};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prompt lines longer than this are left out of the rendered catalog.
const MAX_PROMPT_ENTRY_CHARS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Continuous,
    Enumeration,
    Boolean,
}

impl ValueType {
    /// Boolean and Enum keep their identity; everything else is continuous.
    pub fn from_data_type(data_type: ParameterDataType) -> Self {
        match data_type {
            ParameterDataType::Boolean => ValueType::Boolean,
            ParameterDataType::Enum => ValueType::Enumeration,
            _ => ValueType::Continuous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Continuous => "continuous",
            ValueType::Enumeration => "enumeration",
            ValueType::Boolean => "boolean",
        }
    }

    /// Case-insensitive match against a model-supplied value type string.
    pub fn matches(&self, raw: &str) -> bool {
        eq_ignore_case(raw.trim(), self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogControl {
    pub id: String,
    pub label: String,
    pub group_id: String,
    pub group_label: String,
    pub value_type: ValueType,
    pub range: Option<ParameterRange>,
    pub allowed_values: Vec<String>,
}

impl CatalogControl {
    fn prompt_entry(&self) -> String {
        let mut entry = format!(
            "- id: {}; label: {}; valueType: {}",
            self.id,
            self.label,
            self.value_type.as_str()
        );
        if let Some(range) = &self.range {
            entry.push_str(&format!(
                "; range: {}..{}",
                format_number(range.min),
                format_number(range.max)
            ));
            if let Some(unit) = &range.unit {
                entry.push(' ');
                entry.push_str(unit);
            }
        }
        if !self.allowed_values.is_empty() {
            entry.push_str("; allowed: ");
            entry.push_str(&self.allowed_values.join(", "));
        }
        entry
    }
}

/// Members of one descriptor group, sorted by label.
#[derive(Debug, Clone)]
pub struct ControlGroup {
    pub id: String,
    pub label: String,
    members: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ControlCatalog {
    controls: Vec<CatalogControl>,
    index: HashMap<String, usize>,
    groups: Vec<ControlGroup>,
}

impl ControlCatalog {
    pub fn from_schema(schema: &SchemaSnapshot) -> Self {
        let mut controls = Vec::with_capacity(schema.parameter_count());
        let mut index = HashMap::new();
        let mut groups = Vec::with_capacity(schema.groups().len());

        for group in schema.groups() {
            let mut members = Vec::with_capacity(group.parameter_ids.len());
            for id in &group.parameter_ids {
                let Some(definition) = schema.parameter(id) else {
                    continue;
                };
                let position = controls.len();
                controls.push(CatalogControl {
                    id: definition.id.clone(),
                    label: definition.label.clone(),
                    group_id: group.id.clone(),
                    group_label: group.label.clone(),
                    value_type: ValueType::from_data_type(definition.data_type),
                    range: definition.range.clone(),
                    allowed_values: definition.allowed_values.clone(),
                });
                index.entry(fold_key(id)).or_insert(position);
                members.push(position);
            }
            members.sort_by_cached_key(|&idx| controls[idx].label.to_lowercase());
            groups.push(ControlGroup {
                id: group.id.clone(),
                label: group.label.clone(),
                members,
            });
        }

        Self {
            controls,
            index,
            groups,
        }
    }

    /// All controls in descriptor order.
    pub fn controls(&self) -> &[CatalogControl] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogControl> {
        self.index.get(&fold_key(id)).map(|&idx| &self.controls[idx])
    }

    pub fn groups(&self) -> &[ControlGroup] {
        &self.groups
    }

    /// Controls of one group sorted by label.
    pub fn group_members(&self, group: &ControlGroup) -> Vec<&CatalogControl> {
        group.members.iter().map(|&idx| &self.controls[idx]).collect()
    }

    /// The first `limit_per_group` controls (by label) of every group.
    pub fn prompt_subset(&self, limit_per_group: usize) -> Vec<&CatalogControl> {
        self.groups
            .iter()
            .flat_map(|group| {
                group
                    .members
                    .iter()
                    .take(limit_per_group)
                    .map(|&idx| &self.controls[idx])
            })
            .collect()
    }

    /// Render the prompt subset as `[Group]` blocks sorted by group label,
    /// one line per control sorted by label.
    pub fn build_prompt_catalog(&self, limit_per_group: usize) -> String {
        let mut blocks: Vec<(&str, Vec<&CatalogControl>)> = Vec::new();
        for control in self.prompt_subset(limit_per_group) {
            match blocks
                .iter_mut()
                .find(|(label, _)| *label == control.group_label)
            {
                Some((_, members)) => members.push(control),
                None => blocks.push((control.group_label.as_str(), vec![control])),
            }
        }
        blocks.sort_by_cached_key(|(label, _)| label.to_lowercase());

        let mut out = String::new();
        for (label, mut members) in blocks {
            members.sort_by_cached_key(|control| control.label.to_lowercase());
            out.push_str(&format!("[{}]\n", label));
            for control in members {
                let entry = control.prompt_entry();
                if entry.chars().count() <= MAX_PROMPT_ENTRY_CHARS {
                    out.push_str(&entry);
                    out.push('\n');
                }
            }
            out.push('\n');
        }
        out.trim().to_string()
    }
}
