//! Typed argument values passed to Typst functions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::RootNode;
use crate::decode::Fields;
use crate::{FieldPath, SchemaError, SchemaResult};

/// A Typst `relative` or `fraction` value.
///
/// `unit` is one of `pt`, `mm`, `cm`, `in`, `em`, `fr` or `%` by convention; it is not checked.
/// `value` keeps the number exactly as typed by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Length {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A value of some Typst type, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterValue {
    Length(Length),
    Boolean {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<bool>,
    },
    Content {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<RootNode>,
    },
}

impl ParameterValue {
    pub const TAGS: &'static [&'static str] = &["length", "boolean", "content"];

    pub fn tag(&self) -> &'static str {
        match self {
            ParameterValue::Length(_) => "length",
            ParameterValue::Boolean { .. } => "boolean",
            ParameterValue::Content { .. } => "content",
        }
    }

    pub(crate) fn check_serializable(&self, path: &FieldPath) -> SchemaResult<()> {
        match self {
            ParameterValue::Content { value: Some(root) } => {
                root.check_serializable(&path.key("value"))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn decode(value: Value, path: &FieldPath) -> SchemaResult<Self> {
        let mut fields = Fields::new(value, path, "a value object")?;
        let tag = fields.tag()?;

        match tag.as_str() {
            "length" => Ok(ParameterValue::Length(Length {
                unit: fields.optional("unit")?,
                value: fields.optional("value")?,
            })),
            "boolean" => Ok(ParameterValue::Boolean {
                value: fields.optional("value")?,
            }),
            "content" => Ok(ParameterValue::Content {
                value: fields.optional_with("value", RootNode::decode)?,
            }),
            other => Err(SchemaError::UnknownVariant {
                field_path: path.key("type"),
                tag: other.to_owned(),
            }),
        }
    }
}
