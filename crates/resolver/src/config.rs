use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_FIELD_NAME;

/// Per-supertype resolver configuration.
///
/// Missing keys fall back to their defaults when deserialized, so `{}` is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// JSON key read as the discriminator.
    pub field_name: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            field_name: DEFAULT_FIELD_NAME.to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn with_field_name(field_name: impl Into<String>) -> Self {
        ResolverConfig {
            field_name: field_name.into(),
        }
    }
}
