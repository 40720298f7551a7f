//! Data service metadata and invocation models.

use serde::{Deserialize, Serialize};

use crate::{Key, LocalizedText, SourceRef};

/// Metadata of a data service, as returned by `/data-service/get/{key}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceMetadata {
    /// The service key.
    #[serde(rename = "_key")]
    pub key: Key,
    /// The unique, human-readable label.
    #[serde(default)]
    pub unique_label: Option<String>,
    /// Localized service name.
    #[serde(default)]
    pub name: LocalizedText,
    /// Localized service description.
    #[serde(default)]
    pub description: LocalizedText,
    /// The source backing the service.
    #[serde(default)]
    pub source: Option<SourceRef>,
    /// The input contract of the service.
    #[serde(default)]
    pub request_definition: RequestDefinition,
}

/// The input contract of a service: which parameters an invocation takes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestDefinition {
    /// The declared parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
}

impl RequestDefinition {
    /// Returns the definition of the named parameter, if declared.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A single declared service parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDefinition {
    /// The parameter name.
    pub name: String,
    /// Localized description.
    #[serde(default)]
    pub description: LocalizedText,
    /// Localized definition text.
    #[serde(default)]
    pub definition: LocalizedText,
    /// Whether the parameter must be provided.
    #[serde(default)]
    pub required: bool,
    /// Type information, if declared.
    #[serde(default)]
    pub schema: Option<ParameterSchema>,
    /// An example value.
    #[serde(default)]
    pub sample: Option<ParameterSample>,
}

/// Declared type of a service parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterSchema {
    /// The type name, e.g. `string`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Example value for a service parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterSample {
    /// The sample value.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// A single input of a service invocation, `{"name": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeParameter {
    /// The parameter name, matching a [`ParameterDefinition`].
    pub name: String,
    /// The value to invoke with.
    pub value: serde_json::Value,
}

impl InvokeParameter {
    /// Creates an invocation parameter.
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = r#"{
        "_key": "23622632",
        "name": {"en": "Address normalization"},
        "description": {"en": "Normalizes a free-form address"},
        "request_definition": {
            "parameters": [
                {
                    "name": "address_string",
                    "description": {"en": "The address"},
                    "definition": {"en": "Free-form postal address"},
                    "required": true,
                    "schema": {"type": "string"},
                    "sample": {"value": "Agnes-Pockels-Bogen 1, 80992 München"}
                }
            ]
        }
    }"#;

    #[test]
    fn test_service_metadata_deserializes() {
        let meta: ServiceMetadata = serde_json::from_str(META).unwrap();
        assert_eq!(meta.key.as_str(), "23622632");
        let param = meta.request_definition.parameter("address_string").unwrap();
        assert!(param.required);
        assert_eq!(param.schema.as_ref().unwrap().kind.as_deref(), Some("string"));
    }

    #[test]
    fn test_invoke_parameter_serializes() {
        let param = InvokeParameter::new("address_string", "Main St 1");
        let json = serde_json::to_string(&param).unwrap();
        assert_eq!(json, r#"{"name":"address_string","value":"Main St 1"}"#);
    }

    #[test]
    fn test_unknown_parameter_lookup() {
        let meta: ServiceMetadata = serde_json::from_str(META).unwrap();
        assert!(meta.request_definition.parameter("zipcode").is_none());
    }
}
