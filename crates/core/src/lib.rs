//! # TyX Core
//!
//! File-level operations over the TyX formats:
//! - loading and validating `.tyx` documents and the settings file
//! - refusing documents written in the old 0.1 layout
//! - locating the settings and sample directories
//! - batch checking a directory of documents
//!
//! **No format concerns**: the data model and the JSON contract live in `tyx-schema`.

pub mod config;
pub mod constants;
mod error;
pub mod loader;

pub use config::{resolve_samples_dir, resolve_settings_dir, CoreConfig};
pub use error::{CoreError, CoreResult};
pub use loader::{
    check_documents, check_files, find_documents, get_document, get_settings, open_document,
    read_settings_file, write_settings_file, CheckReport, FileOutcome,
};
pub use tyx_schema;
