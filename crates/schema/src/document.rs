//! TyX documents, as saved in `.tyx` files.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::content::{Descendants, Node, RootNode};
use crate::decode::Fields;
use crate::functions::FunctionDefinition;
use crate::values::Length;
use crate::{FieldPath, SchemaResult};

/// Documents created by TyX versions with this prefix use an older, incompatible layout.
pub const INCOMPATIBLE_VERSION_PREFIX: &str = "0.1";

/// An entire TyX document.
///
/// Unknown top-level keys are ignored when decoding and are not written back.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Document {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// The version of TyX in which the document was created.
    pub version: String,
    /// Raw Typst code inserted before the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
    /// Unused by the format itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<DocumentContent>,
    /// Unused by the format itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<DocumentSettings>,
}

/// The serialized content of the editor.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DocumentContent {
    pub root: RootNode,
}

/// Common Typst document configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    /// Root directory for the Typst compiler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Additional font paths for the Typst compiler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justified: Option<bool>,
    /// Paragraph indentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indentation: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<f64>,
    /// Additional function definitions, by function name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<BTreeMap<String, FunctionDefinition>>,
}

impl Document {
    /// An empty document created by TyX `version`.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }

    /// Whether the document layout can be read by this version of TyX.
    pub fn is_compatible(&self) -> bool {
        !self.version.starts_with(INCOMPATIBLE_VERSION_PREFIX)
    }

    /// Top-level content nodes, in reading order.
    pub fn blocks(&self) -> &[Node] {
        self.content
            .as_ref()
            .map(|content| content.root.children.as_slice())
            .unwrap_or(&[])
    }

    /// Depth-first iterator over every content node, in reading order.
    pub fn nodes(&self) -> Descendants<'_> {
        Descendants::new(self.blocks())
    }

    /// Checks that serializing gives back an equal document.
    ///
    /// Fails with [`crate::SchemaError::Serialization`] when a node's `extra` map holds `type` or
    /// a key the node declares; the output would carry that key twice.
    pub fn check_serializable(&self) -> SchemaResult<()> {
        match &self.content {
            Some(content) => content
                .root
                .check_serializable(&FieldPath::root().key("content").key("root")),
            None => Ok(()),
        }
    }

    pub(crate) fn decode(value: Value, path: &FieldPath) -> SchemaResult<Self> {
        let mut fields = Fields::new(value, path, "a document object")?;

        Ok(Self {
            schema: fields.optional("$schema")?,
            version: fields.required("version")?,
            preamble: fields.optional("preamble")?,
            filename: fields.optional("filename")?,
            content: fields.optional_with("content", DocumentContent::decode)?,
            dirty: fields.optional("dirty")?,
            settings: fields.optional("settings")?,
        })
    }
}

impl DocumentContent {
    pub(crate) fn decode(value: Value, path: &FieldPath) -> SchemaResult<Self> {
        let mut fields = Fields::new(value, path, "a content object")?;
        Ok(Self {
            root: fields.required_with("root", RootNode::decode)?,
        })
    }
}
