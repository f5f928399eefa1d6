//! Parameter catalog
//!
//! A canonical, alias-aware description of every control a patch may contain.
//! Built once from the JSON descriptor and immutable afterwards.

pub mod controls;
mod descriptor;

pub use controls::{CatalogControl, ControlCatalog, ControlGroup, ValueType};

use crate::error::CatalogError;
use crate::suggest::Suggestion;
use crate::util::{eq_ignore_case, fold_key};
use crate::validate::{DocumentValidator, SuggestionValidator, ValidationOutcome};
use crate::value::PatchValue;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Data type declared by the descriptor's `type` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterDataType {
    Float,
    Integer,
    Enum,
    Boolean,
    List,
    Alias,
}

impl ParameterDataType {
    /// Match a descriptor type string case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "float" => Some(ParameterDataType::Float),
            "integer" => Some(ParameterDataType::Integer),
            "enum" => Some(ParameterDataType::Enum),
            "boolean" => Some(ParameterDataType::Boolean),
            "list" => Some(ParameterDataType::List),
            "alias" => Some(ParameterDataType::Alias),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterDataType::Float => "float",
            ParameterDataType::Integer => "integer",
            ParameterDataType::Enum => "enum",
            ParameterDataType::Boolean => "boolean",
            ParameterDataType::List => "list",
            ParameterDataType::Alias => "alias",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ParameterRange {
    /// Inclusive on both bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDefinition {
    pub id: String,
    /// Display name from the descriptor, falling back to the id.
    pub label: String,
    pub data_type: ParameterDataType,
    pub range: Option<ParameterRange>,
    /// Unique case-insensitively, in first-seen order.
    pub allowed_values: Vec<String>,
    /// Present only for `Alias` definitions.
    pub alias_of: Option<String>,
}

impl ParameterDefinition {
    pub fn is_alias(&self) -> bool {
        self.data_type == ParameterDataType::Alias
    }

    /// Whether `value` case-insensitively matches one of the declared values.
    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values
            .iter()
            .any(|allowed| eq_ignore_case(allowed, value))
    }
}

/// A required top-level section of a full patch document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterGroup {
    pub id: String,
    pub label: String,
    /// Declaration order from the descriptor.
    pub parameter_ids: Vec<String>,
}

/// The fully built parameter and group maps. All validation reads go through
/// one shared instance of this.
#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    parameters: HashMap<String, ParameterDefinition>,
    groups: Vec<ParameterGroup>,
    group_index: HashMap<String, usize>,
}

impl SchemaSnapshot {
    pub(crate) fn new(
        parameters: HashMap<String, ParameterDefinition>,
        groups: Vec<ParameterGroup>,
    ) -> Self {
        let group_index = groups
            .iter()
            .enumerate()
            .map(|(idx, group)| (fold_key(&group.id), idx))
            .collect();
        Self {
            parameters,
            groups,
            group_index,
        }
    }

    pub fn parameter(&self, id: &str) -> Option<&ParameterDefinition> {
        self.parameters.get(&fold_key(id))
    }

    pub fn group(&self, id: &str) -> Option<&ParameterGroup> {
        self.group_index.get(&fold_key(id)).map(|&idx| &self.groups[idx])
    }

    /// Groups in declaration order.
    pub fn groups(&self) -> &[ParameterGroup] {
        &self.groups
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Follow `alias_of` links until a non-alias definition is reached.
    ///
    /// Resolving a non-alias definition returns it unchanged.
    pub fn resolve<'a>(
        &'a self,
        definition: &'a ParameterDefinition,
    ) -> Result<&'a ParameterDefinition, CatalogError> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(fold_key(&definition.id));

        let mut current = definition;
        while current.data_type == ParameterDataType::Alias {
            let Some(target) = current.alias_of.as_deref() else {
                return Err(CatalogError::UnknownAliasTarget {
                    alias: current.id.clone(),
                    target: String::new(),
                });
            };
            if !visited.insert(fold_key(target)) {
                return Err(CatalogError::AliasCycle {
                    parameter: definition.id.clone(),
                });
            }
            current = self
                .parameter(target)
                .ok_or_else(|| CatalogError::UnknownAliasTarget {
                    alias: current.id.clone(),
                    target: target.to_string(),
                })?;
        }
        Ok(current)
    }

    /// Resolve every parameter up front. Surfaces a corrupt alias graph
    /// before any document reaches it.
    pub fn verify_aliases(&self) -> Result<(), CatalogError> {
        for group in &self.groups {
            for id in &group.parameter_ids {
                if let Some(definition) = self.parameter(id) {
                    self.resolve(definition)?;
                }
            }
        }
        Ok(())
    }
}

/// Everything built from one descriptor: the schema used for document
/// validation and the generation-facing control view.
#[derive(Debug, Clone)]
pub struct Catalog {
    schema: SchemaSnapshot,
    controls: ControlCatalog,
}

impl Catalog {
    /// Parse a descriptor from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let schema = descriptor::parse_descriptor(text)?;
        let controls = ControlCatalog::from_schema(&schema);
        Ok(Self { schema, controls })
    }

    /// Read and parse the descriptor at `path`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::load(format!(
                "Schema file not found at path '{}'.",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::load(format!(
                "Failed to read schema file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let catalog = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.display(),
            groups = catalog.schema.groups().len(),
            parameters = catalog.schema.parameter_count(),
            "loaded parameter catalog"
        );
        Ok(catalog)
    }

    pub fn schema(&self) -> &SchemaSnapshot {
        &self.schema
    }

    pub fn controls(&self) -> &ControlCatalog {
        &self.controls
    }

    pub fn validate_document(&self, document: &PatchValue) -> Result<ValidationOutcome, CatalogError> {
        DocumentValidator::new(&self.schema).validate(document)
    }

    pub fn validate_suggestion(&self, suggestion: &Suggestion) -> ValidationOutcome {
        SuggestionValidator::new(&self.controls).validate(suggestion)
    }
}
