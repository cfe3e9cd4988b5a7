//! Request DTOs for the registry API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /register
///
/// Both fields are optional at the JSON level so that a missing field is
/// reported as a validation error rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl RegisterRequest {
    /// Splits the request into (name, value), treating absent fields as empty.
    pub fn into_parts(self) -> (String, String) {
        (self.name.unwrap_or_default(), self.value.unwrap_or_default())
    }
}
