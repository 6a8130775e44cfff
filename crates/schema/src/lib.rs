//! TyX file format support.
//!
//! This crate defines the typed model of `.tyx` documents and of the app-wide settings file,
//! and translates between those values and JSON bytes. It does no I/O: loading files from disk
//! belongs in `tyx-core`.
//!
//! Parsing either fully succeeds or fails with a single [`SchemaError`]; a partially decoded
//! value is never returned. Every validation error names the [`FieldPath`] of the offending
//! value, e.g. `content.root.children[2].type`.

pub mod content;
mod decode;
pub mod document;
pub mod functions;
pub mod marks;
mod path;
pub mod settings;
pub mod values;

pub use content::{Direction, ElementFormat, HeadingTag, ListType, Node, RootNode};
pub use document::{Document, DocumentContent, DocumentSettings};
pub use functions::{FunctionDefinition, NamedParameterDescription, ParameterDescription};
pub use marks::TextFormat;
pub use path::FieldPath;
pub use settings::{Settings, ShortcutBinding};
pub use values::{Length, ParameterValue};

use serde::Serialize;

/// Errors returned by the `tyx-schema` crate.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The bytes are not syntactically valid JSON.
    #[error("malformed JSON: {source}")]
    MalformedInput {
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON does not match the schema.
    #[error("schema mismatch at {field_path}: {reason}")]
    SchemaValidation { field_path: FieldPath, reason: String },

    /// A `type` discriminator names no known variant.
    #[error("unknown variant `{tag}` at {field_path}")]
    UnknownVariant { field_path: FieldPath, tag: String },

    #[error("failed to serialise: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn mismatch(field_path: FieldPath, reason: impl Into<String>) -> Self {
        SchemaError::SchemaValidation {
            field_path,
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(field_path: FieldPath) -> Self {
        SchemaError::SchemaValidation {
            field_path,
            reason: "missing required field".into(),
        }
    }

    /// Location of the offending value, for validation errors.
    pub fn field_path(&self) -> Option<&FieldPath> {
        match self {
            SchemaError::SchemaValidation { field_path, .. }
            | SchemaError::UnknownVariant { field_path, .. } => Some(field_path),
            SchemaError::MalformedInput { .. } | SchemaError::Serialization(_) => None,
        }
    }
}

/// Type alias for Results that can fail with a [`SchemaError`].
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A value stored on its own in a JSON file.
pub trait TyxFile: Serialize + Sized {
    /// Name used in messages, e.g. "document".
    const KIND: &'static str;

    /// Parse and validate raw file contents.
    fn from_json_bytes(bytes: &[u8]) -> SchemaResult<Self>;

    /// Check that the value serializes to JSON that parses back to an equal value.
    fn check_serializable(&self) -> SchemaResult<()> {
        Ok(())
    }
}

impl TyxFile for Document {
    const KIND: &'static str = "document";

    fn from_json_bytes(bytes: &[u8]) -> SchemaResult<Self> {
        parse_document(bytes)
    }

    fn check_serializable(&self) -> SchemaResult<()> {
        Document::check_serializable(self)
    }
}

impl TyxFile for Settings {
    const KIND: &'static str = "settings";

    fn from_json_bytes(bytes: &[u8]) -> SchemaResult<Self> {
        parse_settings(bytes)
    }
}

/// Parse and validate a `.tyx` document.
///
/// # Errors
///
/// Returns [`SchemaError::MalformedInput`] if `bytes` is not JSON,
/// [`SchemaError::UnknownVariant`] if a node or value has an unrecognised `type`, and
/// [`SchemaError::SchemaValidation`] for any other mismatch.
pub fn parse_document(bytes: &[u8]) -> SchemaResult<Document> {
    let value = decode::read_json(bytes)?;
    Document::decode(value, &FieldPath::root())
}

/// Parse and validate a settings file.
///
/// # Errors
///
/// Returns [`SchemaError::MalformedInput`] if `bytes` is not JSON and
/// [`SchemaError::SchemaValidation`] if it does not match the settings schema.
pub fn parse_settings(bytes: &[u8]) -> SchemaResult<Settings> {
    let value = decode::read_json(bytes)?;
    decode::decode_record(value, &FieldPath::root())
}

/// Serialize a document or settings value as compact JSON.
///
/// # Errors
///
/// Returns [`SchemaError::Serialization`] if a node's `extra` map shadows one of the node's
/// declared keys.
pub fn serialize<T: TyxFile>(value: &T) -> SchemaResult<Vec<u8>> {
    value.check_serializable()?;
    serde_json::to_vec(value).map_err(SchemaError::Serialization)
}

/// Serialize a document or settings value as indented JSON.
pub fn serialize_pretty<T: TyxFile>(value: &T) -> SchemaResult<Vec<u8>> {
    value.check_serializable()?;
    serde_json::to_vec_pretty(value).map_err(SchemaError::Serialization)
}

/// Paths of the keys in a `.tyx` file that parsing and serializing again would not keep.
///
/// Content nodes keep every key, but the other records of a document ignore keys they do not
/// declare. An explicit `null` is not reported.
pub fn dropped_fields(bytes: &[u8]) -> SchemaResult<Vec<FieldPath>> {
    let input = decode::read_json(bytes)?;
    let document = Document::decode(input.clone(), &FieldPath::root())?;
    let output = serde_json::to_value(&document).map_err(SchemaError::Serialization)?;

    let mut dropped = Vec::new();
    decode::collect_dropped(&input, &output, &FieldPath::root(), &mut dropped);
    Ok(dropped)
}

macro_rules! deserialize_with_decoder {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'de> serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: serde::Deserializer<'de>,
                {
                    let value = serde_json::Value::deserialize(deserializer)?;
                    <$ty>::decode(value, &FieldPath::root()).map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

deserialize_with_decoder!(
    Document,
    DocumentContent,
    Node,
    RootNode,
    ParameterValue,
    content::EditorState,
);

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "version": "0.2.7",
        "preamble": "#set text(font: \"Libertinus Serif\")",
        "content": {
            "root": {
                "type": "root",
                "direction": "ltr",
                "format": "",
                "indent": 0,
                "version": 1,
                "children": [
                    {
                        "type": "heading",
                        "tag": "h1",
                        "direction": "ltr",
                        "children": [{"type": "text", "text": "Title", "format": 1, "detail": 0, "mode": "normal", "style": ""}]
                    },
                    {
                        "type": "paragraph",
                        "format": "justify",
                        "textFormat": 0,
                        "children": [
                            {"type": "text", "text": "Euler: ", "format": 0},
                            {"type": "math", "typst": "e^(i pi) + 1 = 0", "inline": true},
                            {"type": "linebreak"}
                        ]
                    },
                    {
                        "type": "functioncall",
                        "name": "figure",
                        "positionParameters": [
                            {"type": "content", "value": {"type": "root", "children": [{"type": "image", "src": "plot.png"}]}}
                        ],
                        "namedParameters": {
                            "placement": {"type": "boolean", "value": true},
                            "gap": {"type": "length", "unit": "em", "value": "1"}
                        }
                    }
                ]
            }
        },
        "settings": {"paper": "a4", "columns": 2, "justified": true}
    }"##;

    #[test]
    fn round_trips_sample_document() {
        let document = parse_document(SAMPLE.as_bytes()).expect("parse sample");
        let bytes = serialize(&document).expect("serialise");
        let reparsed = parse_document(&bytes).expect("reparse");
        assert_eq!(document, reparsed);

        let pretty = serialize_pretty(&document).expect("serialise pretty");
        assert_eq!(parse_document(&pretty).expect("reparse pretty"), document);
    }

    #[test]
    fn parsing_twice_is_idempotent() {
        let first = parse_document(SAMPLE.as_bytes()).expect("parse");
        let second = parse_document(SAMPLE.as_bytes()).expect("parse");
        assert_eq!(first, second);
    }

    #[test]
    fn preserves_block_order() {
        let document = parse_document(SAMPLE.as_bytes()).expect("parse");
        let tags: Vec<&str> = document.blocks().iter().map(Node::tag).collect();
        assert_eq!(tags, vec!["heading", "paragraph", "functioncall"]);

        let reparsed = parse_document(&serialize(&document).expect("serialise")).expect("reparse");
        let tags: Vec<&str> = reparsed.blocks().iter().map(Node::tag).collect();
        assert_eq!(tags, vec!["heading", "paragraph", "functioncall"]);
    }

    #[test]
    fn keeps_editor_bookkeeping_on_nodes() {
        let document = parse_document(SAMPLE.as_bytes()).expect("parse");
        let root = &document.content.as_ref().expect("content").root;
        assert_eq!(root.extra.get("indent"), Some(&serde_json::json!(0)));

        let value: serde_json::Value =
            serde_json::from_slice(&serialize(&document).expect("serialise")).expect("json");
        assert_eq!(value["content"]["root"]["children"][1]["textFormat"], 0);
        assert_eq!(value["content"]["root"]["children"][0]["children"][0]["mode"], "normal");
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_document(b"{\"version\": \"0.2\",").expect_err("should reject");
        assert!(matches!(err, SchemaError::MalformedInput { .. }));
        assert!(err.field_path().is_none());
    }

    #[test]
    fn unknown_node_type_is_reported_with_path() {
        let input = r#"{
            "version": "0.2.7",
            "content": {"root": {"type": "root", "children": [
                {"type": "paragraph", "format": "", "children": []},
                {"type": "paragraph", "format": "", "children": []},
                {"type": "not-a-real-type"}
            ]}}
        }"#;
        let err = parse_document(input.as_bytes()).expect_err("should reject");
        match err {
            SchemaError::UnknownVariant { field_path, tag } => {
                assert_eq!(tag, "not-a-real-type");
                assert_eq!(field_path.to_string(), "content.root.children[2].type");
            }
            other => panic!("expected UnknownVariant, got {other:?}"),
        }
    }

    #[test]
    fn wrong_type_names_field_and_expectation() {
        let input = r#"{"version": "0.2.7", "content": {"root": {"type": "root", "children": [
            {"type": "text", "text": "x", "format": "bold"}
        ]}}}"#;
        let err = parse_document(input.as_bytes()).expect_err("should reject");
        assert_eq!(
            err.field_path().map(ToString::to_string).as_deref(),
            Some("content.root.children[0].format")
        );
        assert!(err.to_string().contains("invalid type"));
    }

    #[test]
    fn document_must_be_an_object() {
        let err = parse_document(b"[]").expect_err("should reject array");
        assert_eq!(err.field_path().map(ToString::to_string).as_deref(), Some("<root>"));
    }

    #[test]
    fn settings_round_trip() {
        let input = br#"{"language": "he", "format": true, "serverDebounce": 750,
            "keyboardShortcuts": [["Ctrl+Shift+M", "insertMath"]],
            "functions": {"note": {"positional": [{"type": "content"}], "inline": true}}}"#;
        let settings = parse_settings(input).expect("parse settings");
        let reparsed = parse_settings(&serialize(&settings).expect("serialise")).expect("reparse");
        assert_eq!(settings, reparsed);
    }

    #[test]
    fn settings_wrong_type_has_path() {
        let err = parse_settings(br#"{"autoStartServer": "yes"}"#).expect_err("should reject");
        assert_eq!(
            err.field_path().map(ToString::to_string).as_deref(),
            Some("autoStartServer")
        );
    }

    #[test]
    fn shadowed_node_key_fails_to_serialise() {
        let mut document = parse_document(SAMPLE.as_bytes()).expect("parse");
        let root = &mut document.content.as_mut().expect("content").root;
        if let Node::Heading(heading) = &mut root.children[0] {
            if let Node::Text(text) = &mut heading.children[0] {
                text.extra.insert("text".into(), serde_json::json!("shadow"));
            }
        }

        for result in [serialize(&document), serialize_pretty(&document)] {
            let err = result.expect_err("should refuse duplicate key");
            assert!(matches!(err, SchemaError::Serialization(_)));
            assert!(err
                .to_string()
                .contains("content.root.children[0].children[0].text"));
        }
    }

    #[test]
    fn shadowed_key_inside_parameter_content_fails_to_serialise() {
        let mut document = parse_document(SAMPLE.as_bytes()).expect("parse");
        let root = &mut document.content.as_mut().expect("content").root;
        if let Node::FunctionCall(call) = &mut root.children[2] {
            let parameters = call.position_parameters.as_mut().expect("parameters");
            if let ParameterValue::Content { value: Some(content) } = &mut parameters[0] {
                content.extra.insert("children".into(), serde_json::json!([]));
            }
        }

        let err = serialize(&document).expect_err("should refuse duplicate key");
        assert!(err
            .to_string()
            .contains("content.root.children[2].positionParameters[0].value.children"));
    }

    #[test]
    fn unknown_document_keys_are_listed_as_dropped() {
        let input = br#"{
            "version": "0.2.7",
            "zoom": 1.5,
            "preamble": null,
            "content": {"root": {"type": "root", "indent": 0, "children": [
                {"type": "image", "src": "a.png", "width": 10}
            ]}, "selection": {"anchor": 0}},
            "settings": {"paper": "a4", "margin": "2cm", "columns": 2}
        }"#;
        let dropped: Vec<String> = dropped_fields(input)
            .expect("parse")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(dropped, vec!["content.selection", "settings.margin", "zoom"]);
    }

    #[test]
    fn sample_drops_nothing() {
        assert!(dropped_fields(SAMPLE.as_bytes()).expect("parse").is_empty());
    }

    #[test]
    fn nodes_deserialize_through_serde() {
        let node: Node =
            serde_json::from_str(r#"{"type": "image", "src": "a.png"}"#).expect("parse");
        assert_eq!(node.tag(), "image");
        assert!(serde_json::from_str::<Node>(r#"{"type": "video"}"#).is_err());
    }
}
