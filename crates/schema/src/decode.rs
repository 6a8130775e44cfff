//! Recursive validating decoder.
//!
//! Input bytes are first read into a [`serde_json::Value`] tree. Structures that can contain
//! content nodes (documents, nodes, editor states and parameter values) are then walked by
//! hand so that every error carries the full [`FieldPath`] and discriminators can be checked
//! before anything else. Records that cannot contain nodes (settings, function definitions,
//! lengths) are handed to serde through `serde_path_to_error`, and the path it reports is
//! appended to the current one.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::content::Node;
use crate::{FieldPath, SchemaError, SchemaResult};

/// Decode raw bytes into a JSON tree.
pub(crate) fn read_json(bytes: &[u8]) -> SchemaResult<Value> {
    serde_json::from_slice(bytes).map_err(|source| SchemaError::MalformedInput {
        line: source.line(),
        column: source.column(),
        source,
    })
}

/// Decode a node-free record with serde, reporting failures relative to `path`.
pub(crate) fn decode_record<T: DeserializeOwned>(
    value: Value,
    path: &FieldPath,
) -> SchemaResult<T> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let mut field_path = path.join(err.path());
        let reason = err.into_inner().to_string();
        // serde reports a missing field at the enclosing object; point at the field itself.
        if let Some(name) = missing_field_name(&reason) {
            field_path = field_path.key(name);
        }
        SchemaError::SchemaValidation { field_path, reason }
    })
}

fn missing_field_name(reason: &str) -> Option<&str> {
    reason
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

/// Records paths of non-null `input` keys that have no counterpart in `output`.
pub(crate) fn collect_dropped(
    input: &Value,
    output: &Value,
    path: &FieldPath,
    dropped: &mut Vec<FieldPath>,
) {
    match (input, output) {
        (Value::Object(input), Value::Object(output)) => {
            for (key, value) in input {
                match output.get(key) {
                    Some(kept) => collect_dropped(value, kept, &path.key(key), dropped),
                    None if value.is_null() => {}
                    None => dropped.push(path.key(key)),
                }
            }
        }
        (Value::Array(input), Value::Array(output)) => {
            for (index, (value, kept)) in input.iter().zip(output).enumerate() {
                collect_dropped(value, kept, &path.index(index), dropped);
            }
        }
        _ => {}
    }
}

/// Short description of a JSON value's type, for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The remaining keys of a JSON object being decoded.
///
/// Every accessor removes the key it reads, so once the declared fields have been taken the
/// leftovers are exactly the keys the schema does not know about.
pub(crate) struct Fields<'p> {
    map: Map<String, Value>,
    path: &'p FieldPath,
}

impl<'p> Fields<'p> {
    /// Start decoding `value`, which must be a JSON object.
    pub(crate) fn new(value: Value, path: &'p FieldPath, expected: &str) -> SchemaResult<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            other => Err(SchemaError::mismatch(
                path.clone(),
                format!("expected {expected}, found {}", kind_of(&other)),
            )),
        }
    }

    /// Read the `type` discriminator.
    pub(crate) fn tag(&mut self) -> SchemaResult<String> {
        let path = self.path.key("type");
        match self.map.remove("type") {
            Some(Value::String(tag)) => Ok(tag),
            Some(other) => Err(SchemaError::mismatch(
                path,
                format!("expected a string, found {}", kind_of(&other)),
            )),
            None => Err(SchemaError::missing(path)),
        }
    }

    pub(crate) fn required<T: DeserializeOwned>(&mut self, key: &str) -> SchemaResult<T> {
        self.required_with(key, decode_record)
    }

    /// Absent keys and explicit `null` both decode to `None`.
    pub(crate) fn optional<T: DeserializeOwned>(&mut self, key: &str) -> SchemaResult<Option<T>> {
        self.optional_with(key, decode_record)
    }

    pub(crate) fn required_with<T>(
        &mut self,
        key: &str,
        decode: impl FnOnce(Value, &FieldPath) -> SchemaResult<T>,
    ) -> SchemaResult<T> {
        let path = self.path.key(key);
        match self.map.remove(key) {
            Some(value) => decode(value, &path),
            None => Err(SchemaError::missing(path)),
        }
    }

    pub(crate) fn optional_with<T>(
        &mut self,
        key: &str,
        decode: impl FnOnce(Value, &FieldPath) -> SchemaResult<T>,
    ) -> SchemaResult<Option<T>> {
        let path = self.path.key(key);
        match self.map.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(value, &path).map(Some),
        }
    }

    /// Read the required `children` array, decoding each node in order.
    pub(crate) fn children(&mut self) -> SchemaResult<Vec<Node>> {
        self.required_with("children", |value, path| decode_seq(value, path, Node::decode))
    }

    /// Consume the helper, returning the keys that were not read.
    pub(crate) fn into_extra(self) -> Map<String, Value> {
        self.map
    }
}

/// Decode a JSON array element by element.
pub(crate) fn decode_seq<T>(
    value: Value,
    path: &FieldPath,
    decode: impl Fn(Value, &FieldPath) -> SchemaResult<T>,
) -> SchemaResult<Vec<T>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| decode(item, &path.index(index)))
            .collect(),
        other => Err(SchemaError::mismatch(
            path.clone(),
            format!("expected an array, found {}", kind_of(&other)),
        )),
    }
}

/// Decode a JSON object whose values all share one type.
pub(crate) fn decode_map<T>(
    value: Value,
    path: &FieldPath,
    decode: impl Fn(Value, &FieldPath) -> SchemaResult<T>,
) -> SchemaResult<std::collections::BTreeMap<String, T>> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, item)| {
                let item = decode(item, &path.key(&key))?;
                Ok((key, item))
            })
            .collect(),
        other => Err(SchemaError::mismatch(
            path.clone(),
            format!("expected an object, found {}", kind_of(&other)),
        )),
    }
}
