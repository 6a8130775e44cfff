use std::path::PathBuf;

use tyx_schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to access {path}: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {path}: {source}", path = path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
    #[error(
        "{path} was created by TyX {version}, which is no longer supported",
        path = path.display()
    )]
    IncompatibleVersion { path: PathBuf, version: String },
}

impl CoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn schema(path: &std::path::Path, source: SchemaError) -> Self {
        CoreError::Schema {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The validation error behind this failure, if any.
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            CoreError::Schema { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
