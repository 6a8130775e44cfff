//! TyX function definitions.
//!
//! A function definition tells the editor how to present a Typst function: which positional
//! and named parameters it takes and whether it is shown inline.

use serde::{Deserialize, Serialize};

/// Description of a function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParameterDescription {
    /// The TyX type of this parameter.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Usually the parameter name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Shown on hover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Description of a named function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamedParameterDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Description of a Typst function.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FunctionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positional: Option<Vec<ParameterDescription>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named: Option<Vec<NamedParameterDescription>>,
    /// Whether the editor displays calls to this function inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

impl FunctionDefinition {
    /// Number of parameters the function must be given.
    pub fn required_parameter_count(&self) -> usize {
        let positional = self
            .positional
            .iter()
            .flatten()
            .filter(|p| p.required == Some(true))
            .count();
        let named = self
            .named
            .iter()
            .flatten()
            .filter(|p| p.required == Some(true))
            .count();
        positional + named
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_definition() {
        let input = r#"{
            "positional": [{"type": "content", "required": true, "label": "body"}],
            "named": [
                {"name": "width", "type": "length"},
                {"name": "stroke", "type": "boolean", "required": true}
            ],
            "inline": false
        }"#;

        let definition: FunctionDefinition = serde_json::from_str(input).expect("parse");
        assert_eq!(definition.positional.as_ref().map(Vec::len), Some(1));
        assert_eq!(definition.named.as_ref().map(Vec::len), Some(2));
        assert_eq!(definition.required_parameter_count(), 2);
    }

    #[test]
    fn parameter_type_is_required() {
        let err = serde_json::from_str::<ParameterDescription>(r#"{"label": "x"}"#)
            .expect_err("should reject missing type");
        assert!(err.to_string().contains("missing field `type`"));
    }

    #[test]
    fn named_parameter_needs_name() {
        let parsed = serde_json::from_str::<NamedParameterDescription>(r#"{"type": "length"}"#);
        assert!(parsed.is_err());
    }
}
