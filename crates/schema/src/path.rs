//! Field paths into a JSON document.
//!
//! A [`FieldPath`] locates a value inside the JSON tree being decoded, for example
//! `content.root.children[2].type`. Paths are built up while the decoder descends and are
//! attached to every validation error.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a value in a JSON document.
///
/// Object keys are joined with `.` and array indices are written as `[i]`. The empty path
/// refers to the top-level value and displays as `<root>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// The path of the top-level value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path pointing at `key` inside the object at this path.
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.to_owned()));
        Self(segments)
    }

    /// Returns a new path pointing at element `index` of the array at this path.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    /// True for the path of the top-level value.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a path reported by `serde_path_to_error` (relative to this path).
    pub(crate) fn join(&self, relative: &serde_path_to_error::Path) -> Self {
        let mut segments = self.0.clone();
        for segment in relative.iter() {
            match segment {
                serde_path_to_error::Segment::Seq { index } => {
                    segments.push(Segment::Index(*index))
                }
                serde_path_to_error::Segment::Map { key } => {
                    segments.push(Segment::Key(key.clone()))
                }
                // Enum variant names and unknown segments do not correspond to JSON locations.
                _ => {}
            }
        }
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }

        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
