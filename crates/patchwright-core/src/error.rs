use thiserror::Error;

/// Fatal catalog problems. A process holding one of these cannot serve requests
/// until it is restarted with a corrected descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("schema load error: {message}")]
    SchemaLoad { message: String },

    #[error("alias cycle detected while resolving parameter '{parameter}'")]
    AliasCycle { parameter: String },

    #[error("alias '{alias}' references unknown parameter '{target}'")]
    UnknownAliasTarget { alias: String, target: String },
}

impl CatalogError {
    pub(crate) fn load(message: impl Into<String>) -> Self {
        CatalogError::SchemaLoad {
            message: message.into(),
        }
    }
}
