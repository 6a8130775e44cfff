//! Content nodes.
//!
//! A document's content is a tree of nodes in reading order. Each node is a JSON object whose
//! `type` key selects one of a closed set of variants; the variant decides which other keys are
//! required. Nodes are loose objects: keys the schema does not declare are kept in `extra` and
//! written back unchanged, because the editor stores its own bookkeeping on every node.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::decode::{decode_map, decode_seq, Fields};
use crate::marks::TextFormat;
use crate::values::ParameterValue;
use crate::{FieldPath, SchemaError, SchemaResult};

/// Direction of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

/// Horizontal alignment of a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementFormat {
    Left,
    Start,
    Center,
    Right,
    End,
    Justify,
    /// No explicit alignment (`""`).
    #[default]
    #[serde(rename = "")]
    Unset,
}

/// Kind of list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Bullet,
    Number,
    Check,
}

/// Heading level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingTag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingTag {
    /// Heading level from 1 to 6.
    pub fn level(self) -> u8 {
        match self {
            HeadingTag::H1 => 1,
            HeadingTag::H2 => 2,
            HeadingTag::H3 => 3,
            HeadingTag::H4 => 4,
            HeadingTag::H5 => 5,
            HeadingTag::H6 => 6,
        }
    }
}

/// The node at the root of a document or of a nested editor.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "type", rename = "root")]
pub struct RootNode {
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A paragraph.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "paragraph")]
pub struct ParagraphNode {
    pub children: Vec<Node>,
    pub format: ElementFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A run of text with uniform marks.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "text")]
pub struct TextNode {
    pub text: String,
    pub format: TextFormat,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A math equation, inline or displayed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "math")]
pub struct MathNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typst: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "listitem")]
pub struct ListItemNode {
    pub value: i64,
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A bullet, numbered or check list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "list", rename_all = "camelCase")]
pub struct ListNode {
    pub children: Vec<Node>,
    pub list_type: ListType,
    pub start: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "code")]
pub struct CodeNode {
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "quote")]
pub struct QuoteNode {
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "table")]
pub struct TableNode {
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "tablerow")]
pub struct TableRowNode {
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "tablecell")]
pub struct TableCellNode {
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "type", rename = "linebreak")]
pub struct LineBreakNode {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "type", rename = "horizontalrule")]
pub struct HorizontalRuleNode {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw Typst code, edited in a nested editor.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "typstcode")]
pub struct TypstCodeNode {
    pub text: EditorState,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "image")]
pub struct ImageNode {
    pub src: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "link")]
pub struct LinkNode {
    pub children: Vec<Node>,
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename = "heading")]
pub struct HeadingNode {
    pub tag: HeadingTag,
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A call to a Typst function with TyX-typed arguments.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "type", rename = "functioncall", rename_all = "camelCase")]
pub struct FunctionCallNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_parameters: Option<Vec<ParameterValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named_parameters: Option<BTreeMap<String, ParameterValue>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Serialized state of a nested editor.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub editor_state: EditorStateContent,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EditorStateContent {
    pub root: RootNode,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Any content node.
///
/// Each variant serializes its own `type` key.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Root(RootNode),
    Paragraph(ParagraphNode),
    Text(TextNode),
    Math(MathNode),
    ListItem(ListItemNode),
    List(ListNode),
    Code(CodeNode),
    Quote(QuoteNode),
    Table(TableNode),
    TableRow(TableRowNode),
    TableCell(TableCellNode),
    LineBreak(LineBreakNode),
    HorizontalRule(HorizontalRuleNode),
    TypstCode(TypstCodeNode),
    Image(ImageNode),
    Link(LinkNode),
    Heading(HeadingNode),
    FunctionCall(FunctionCallNode),
}

impl Node {
    /// Every accepted value of the `type` discriminator.
    pub const TAGS: &'static [&'static str] = &[
        "root",
        "paragraph",
        "text",
        "math",
        "listitem",
        "list",
        "code",
        "quote",
        "table",
        "tablerow",
        "tablecell",
        "linebreak",
        "horizontalrule",
        "typstcode",
        "image",
        "link",
        "heading",
        "functioncall",
    ];

    /// The `type` discriminator of this node.
    pub fn tag(&self) -> &'static str {
        match self {
            Node::Root(_) => "root",
            Node::Paragraph(_) => "paragraph",
            Node::Text(_) => "text",
            Node::Math(_) => "math",
            Node::ListItem(_) => "listitem",
            Node::List(_) => "list",
            Node::Code(_) => "code",
            Node::Quote(_) => "quote",
            Node::Table(_) => "table",
            Node::TableRow(_) => "tablerow",
            Node::TableCell(_) => "tablecell",
            Node::LineBreak(_) => "linebreak",
            Node::HorizontalRule(_) => "horizontalrule",
            Node::TypstCode(_) => "typstcode",
            Node::Image(_) => "image",
            Node::Link(_) => "link",
            Node::Heading(_) => "heading",
            Node::FunctionCall(_) => "functioncall",
        }
    }

    /// Child nodes in reading order; empty for leaf variants.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root(n) => &n.children,
            Node::Paragraph(n) => &n.children,
            Node::ListItem(n) => &n.children,
            Node::List(n) => &n.children,
            Node::Code(n) => &n.children,
            Node::Quote(n) => &n.children,
            Node::Table(n) => &n.children,
            Node::TableRow(n) => &n.children,
            Node::TableCell(n) => &n.children,
            Node::Link(n) => &n.children,
            Node::Heading(n) => &n.children,
            Node::Text(_)
            | Node::Math(_)
            | Node::LineBreak(_)
            | Node::HorizontalRule(_)
            | Node::TypstCode(_)
            | Node::Image(_)
            | Node::FunctionCall(_) => &[],
        }
    }

    /// Keys of this node that the schema does not declare.
    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            Node::Root(n) => &n.extra,
            Node::Paragraph(n) => &n.extra,
            Node::Text(n) => &n.extra,
            Node::Math(n) => &n.extra,
            Node::ListItem(n) => &n.extra,
            Node::List(n) => &n.extra,
            Node::Code(n) => &n.extra,
            Node::Quote(n) => &n.extra,
            Node::Table(n) => &n.extra,
            Node::TableRow(n) => &n.extra,
            Node::TableCell(n) => &n.extra,
            Node::LineBreak(n) => &n.extra,
            Node::HorizontalRule(n) => &n.extra,
            Node::TypstCode(n) => &n.extra,
            Node::Image(n) => &n.extra,
            Node::Link(n) => &n.extra,
            Node::Heading(n) => &n.extra,
            Node::FunctionCall(n) => &n.extra,
        }
    }

    /// Depth-first iterator over the descendants of this node, in reading order.
    ///
    /// Nested editors (Typst code, content parameters) are not entered.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::new(self.children())
    }

    pub(crate) fn decode(value: Value, path: &FieldPath) -> SchemaResult<Self> {
        let mut fields = Fields::new(value, path, "a node object")?;
        let tag = fields.tag()?;

        let node = match tag.as_str() {
            "root" => Node::Root(RootNode {
                children: fields.children()?,
                direction: fields.optional("direction")?,
                extra: fields.into_extra(),
            }),
            "paragraph" => Node::Paragraph(ParagraphNode {
                children: fields.children()?,
                format: fields.required("format")?,
                direction: fields.optional("direction")?,
                extra: fields.into_extra(),
            }),
            "text" => Node::Text(TextNode {
                text: fields.required("text")?,
                format: fields.required("format")?,
                extra: fields.into_extra(),
            }),
            "math" => Node::Math(MathNode {
                typst: fields.optional("typst")?,
                formula: fields.optional("formula")?,
                inline: fields.optional("inline")?,
                extra: fields.into_extra(),
            }),
            "listitem" => Node::ListItem(ListItemNode {
                value: fields.required("value")?,
                children: fields.children()?,
                extra: fields.into_extra(),
            }),
            "list" => Node::List(ListNode {
                children: fields.children()?,
                list_type: fields.required("listType")?,
                start: fields.required("start")?,
                direction: fields.optional("direction")?,
                extra: fields.into_extra(),
            }),
            "code" => Node::Code(CodeNode {
                children: fields.children()?,
                language: fields.optional("language")?,
                extra: fields.into_extra(),
            }),
            "quote" => Node::Quote(QuoteNode {
                children: fields.children()?,
                direction: fields.optional("direction")?,
                extra: fields.into_extra(),
            }),
            "table" => Node::Table(TableNode {
                children: fields.children()?,
                direction: fields.optional("direction")?,
                extra: fields.into_extra(),
            }),
            "tablerow" => Node::TableRow(TableRowNode {
                children: fields.children()?,
                extra: fields.into_extra(),
            }),
            "tablecell" => Node::TableCell(TableCellNode {
                children: fields.children()?,
                direction: fields.optional("direction")?,
                extra: fields.into_extra(),
            }),
            "linebreak" => Node::LineBreak(LineBreakNode {
                extra: fields.into_extra(),
            }),
            "horizontalrule" => Node::HorizontalRule(HorizontalRuleNode {
                extra: fields.into_extra(),
            }),
            "typstcode" => Node::TypstCode(TypstCodeNode {
                text: fields.required_with("text", EditorState::decode)?,
                extra: fields.into_extra(),
            }),
            "image" => Node::Image(ImageNode {
                src: fields.required("src")?,
                extra: fields.into_extra(),
            }),
            "link" => Node::Link(LinkNode {
                children: fields.children()?,
                url: fields.required("url")?,
                extra: fields.into_extra(),
            }),
            "heading" => Node::Heading(HeadingNode {
                tag: fields.required("tag")?,
                children: fields.children()?,
                extra: fields.into_extra(),
            }),
            "functioncall" => Node::FunctionCall(FunctionCallNode {
                name: fields.optional("name")?,
                position_parameters: fields.optional_with("positionParameters", |value, path| {
                    decode_seq(value, path, ParameterValue::decode)
                })?,
                named_parameters: fields.optional_with("namedParameters", |value, path| {
                    decode_map(value, path, ParameterValue::decode)
                })?,
                extra: fields.into_extra(),
            }),
            other => {
                return Err(SchemaError::UnknownVariant {
                    field_path: path.key("type"),
                    tag: other.to_owned(),
                })
            }
        };

        Ok(node)
    }
}

impl RootNode {
    /// Depth-first iterator over every node below this root, in reading order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants::new(&self.children)
    }

    /// Decode a node that must have the `root` tag.
    pub(crate) fn decode(value: Value, path: &FieldPath) -> SchemaResult<Self> {
        match Node::decode(value, path)? {
            Node::Root(root) => Ok(root),
            other => Err(SchemaError::mismatch(
                path.key("type"),
                format!("expected a `root` node, found `{}`", other.tag()),
            )),
        }
    }
}

impl EditorState {
    pub(crate) fn decode(value: Value, path: &FieldPath) -> SchemaResult<Self> {
        let mut fields = Fields::new(value, path, "an editor state object")?;
        Ok(Self {
            editor_state: fields.required_with("editorState", |value, path| {
                let mut inner = Fields::new(value, path, "an editor state object")?;
                Ok(EditorStateContent {
                    root: inner.required_with("root", RootNode::decode)?,
                    extra: inner.into_extra(),
                })
            })?,
            extra: fields.into_extra(),
        })
    }
}

const ROOT_KEYS: &[&str] = &["type", "children", "direction"];

/// Fails if `extra` holds a key the record writes itself.
///
/// Such a value would serialize with a duplicate key, and parsing it back would not give the
/// same value.
fn check_extra(
    extra: &Map<String, Value>,
    declared: &[&str],
    path: &FieldPath,
) -> SchemaResult<()> {
    match extra.keys().find(|key| declared.contains(&key.as_str())) {
        Some(key) => Err(SchemaError::Serialization(
            <serde_json::Error as serde::ser::Error>::custom(format!(
                "extra key at {} shadows a declared field",
                path.key(key)
            )),
        )),
        None => Ok(()),
    }
}

fn check_children(children: &[Node], path: &FieldPath) -> SchemaResult<()> {
    let path = path.key("children");
    for (index, child) in children.iter().enumerate() {
        child.check_serializable(&path.index(index))?;
    }
    Ok(())
}

impl Node {
    /// Keys this variant writes itself, `type` included.
    pub fn declared_keys(&self) -> &'static [&'static str] {
        match self {
            Node::Root(_) => ROOT_KEYS,
            Node::Paragraph(_) => &["type", "children", "format", "direction"],
            Node::Text(_) => &["type", "text", "format"],
            Node::Math(_) => &["type", "typst", "formula", "inline"],
            Node::ListItem(_) => &["type", "value", "children"],
            Node::List(_) => &["type", "children", "listType", "start", "direction"],
            Node::Code(_) => &["type", "children", "language"],
            Node::Quote(_) | Node::Table(_) | Node::TableCell(_) => {
                &["type", "children", "direction"]
            }
            Node::TableRow(_) => &["type", "children"],
            Node::LineBreak(_) | Node::HorizontalRule(_) => &["type"],
            Node::TypstCode(_) => &["type", "text"],
            Node::Image(_) => &["type", "src"],
            Node::Link(_) => &["type", "children", "url"],
            Node::Heading(_) => &["type", "tag", "children"],
            Node::FunctionCall(_) => &["type", "name", "positionParameters", "namedParameters"],
        }
    }

    /// Checks that no `extra` map in this subtree shadows a declared key.
    pub(crate) fn check_serializable(&self, path: &FieldPath) -> SchemaResult<()> {
        check_extra(self.extra(), self.declared_keys(), path)?;
        check_children(self.children(), path)?;

        match self {
            Node::TypstCode(code) => code.text.check_serializable(&path.key("text")),
            Node::FunctionCall(call) => {
                let positional = path.key("positionParameters");
                for (index, value) in call.position_parameters.iter().flatten().enumerate() {
                    value.check_serializable(&positional.index(index))?;
                }
                let named = path.key("namedParameters");
                for (name, value) in call.named_parameters.iter().flatten() {
                    value.check_serializable(&named.key(name))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl RootNode {
    pub(crate) fn check_serializable(&self, path: &FieldPath) -> SchemaResult<()> {
        check_extra(&self.extra, ROOT_KEYS, path)?;
        check_children(&self.children, path)
    }
}

impl EditorState {
    pub(crate) fn check_serializable(&self, path: &FieldPath) -> SchemaResult<()> {
        check_extra(&self.extra, &["editorState"], path)?;
        let inner = path.key("editorState");
        check_extra(&self.editor_state.extra, &["root"], &inner)?;
        self.editor_state.root.check_serializable(&inner.key("root"))
    }
}

/// Depth-first, pre-order iterator over a node tree.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(children: &'a [Node]) -> Self {
        Self {
            stack: children.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
