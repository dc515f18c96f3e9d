use serde_json::{Map, Value};

use crate::errors::GenerationError;

/// Placeholder replaced in raw template text before parsing.
pub const RUNTIME_TOKEN: &str = "DTM_RUNTIME";
/// Fixed timestamp substituted for [`RUNTIME_TOKEN`].
pub const RUNTIME_TIMESTAMP: &str = "2021-09-30T17:53:33.838+0000";

/// Parsed template tree, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: Value,
}

impl Template {
    /// Substitute [`RUNTIME_TOKEN`] and parse the JSON text.
    pub fn parse(text: &str) -> Result<Self, GenerationError> {
        let text = substitute_runtime_token(text);
        let root = serde_json::from_str(&text).map_err(GenerationError::TemplateParse)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.root.as_object()
    }

    /// Top-level keys in declaration order; only object templates have them.
    pub fn keys(&self) -> Result<Vec<String>, GenerationError> {
        self.as_object()
            .map(|map| map.keys().cloned().collect())
            .ok_or_else(|| {
                GenerationError::InvalidTemplate(
                    "template root must be an object to have columns".to_string(),
                )
            })
    }
}

pub fn substitute_runtime_token(text: &str) -> String {
    text.replace(RUNTIME_TOKEN, RUNTIME_TIMESTAMP)
}
