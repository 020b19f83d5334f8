use thiserror::Error;

/// Errors that stop a merge before any layer runs.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("transfer mapping does not resolve: {0}")]
    UnresolvedMapping(String),
    #[error("unknown task layer '{name}'{}", .suggestion.as_ref().map(|s| format!(", did you mean '{s}'?")).unwrap_or_default())]
    UnknownTaskLayer { name: String, suggestion: Option<String> },
    #[error("task layer '{0}' is configured more than once")]
    DuplicateTaskLayer(String),
    #[error("'{0}' already exists in the asset graph")]
    DuplicateEntity(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Problems with a task layer registry document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("invalid task layer configuration: {0}")]
    Invalid(String),
}

impl From<quick_xml::DeError> for MergeError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Config(ConfigError::Xml(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_layer_message_carries_suggestion() {
        let err = MergeError::UnknownTaskLayer {
            name: "Rigging2".into(),
            suggestion: Some("Rigging".into()),
        };
        assert_eq!(err.to_string(), "unknown task layer 'Rigging2', did you mean 'Rigging'?");

        let bare = MergeError::UnknownTaskLayer {
            name: "Lighting".into(),
            suggestion: None,
        };
        assert_eq!(bare.to_string(), "unknown task layer 'Lighting'");
    }
}
