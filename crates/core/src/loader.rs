//! Reading and writing TyX files on disk.
//!
//! Every function here reads the whole file into memory, hands the bytes to `tyx-schema` and
//! attaches the file path to any failure.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tyx_schema::{Document, Settings, TyxFile};

use crate::config::CoreConfig;
use crate::constants::TYX_EXTENSION;
use crate::{CoreError, CoreResult};

fn read_file<T: TyxFile>(path: &Path) -> CoreResult<T> {
    let bytes = fs::read(path).map_err(|e| CoreError::io(path, e))?;
    tracing::debug!("loading {} from {} ({} bytes)", T::KIND, path.display(), bytes.len());
    T::from_json_bytes(&bytes).map_err(|e| CoreError::schema(path, e))
}

/// Read and validate a `.tyx` document.
pub fn get_document(path: impl AsRef<Path>) -> CoreResult<Document> {
    read_file(path.as_ref())
}

/// Read and validate a settings file.
pub fn get_settings(path: impl AsRef<Path>) -> CoreResult<Settings> {
    read_file(path.as_ref())
}

/// Read a document and check that this version of TyX can open it.
///
/// # Errors
///
/// Returns [`CoreError::IncompatibleVersion`] for documents created by TyX 0.1.
pub fn open_document(path: impl AsRef<Path>) -> CoreResult<Document> {
    let path = path.as_ref();
    let document = get_document(path)?;
    if !document.is_compatible() {
        return Err(CoreError::IncompatibleVersion {
            path: path.to_path_buf(),
            version: document.version,
        });
    }
    Ok(document)
}

/// Read the app-wide settings file.
///
/// A missing or blank file yields the default settings.
pub fn read_settings_file(config: &CoreConfig) -> CoreResult<Settings> {
    let path = config.settings_file();
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("no settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        Err(e) => return Err(CoreError::io(&path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        tracing::debug!("settings file {} is empty, using defaults", path.display());
        return Ok(Settings::default());
    }

    Settings::from_json_bytes(&bytes).map_err(|e| CoreError::schema(&path, e))
}

/// Write the app-wide settings file, creating its directory if needed.
///
/// Returns the path written.
pub fn write_settings_file(config: &CoreConfig, settings: &Settings) -> CoreResult<PathBuf> {
    let dir = config.settings_dir();
    fs::create_dir_all(dir).map_err(|e| CoreError::io(dir, e))?;

    let path = config.settings_file();
    let bytes = tyx_schema::serialize_pretty(settings).map_err(|e| CoreError::schema(&path, e))?;
    fs::write(&path, bytes).map_err(|e| CoreError::io(&path, e))?;
    tracing::info!("wrote settings to {}", path.display());
    Ok(path)
}

fn is_tyx_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(TYX_EXTENSION)
}

/// List the `.tyx` files directly inside `dir`, sorted by path.
pub fn find_documents(dir: impl AsRef<Path>) -> CoreResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CoreError::io(dir, e))?;
        let path = entry.path();
        if is_tyx_file(&path) {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Outcome of checking one file.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// `None` when the file opened cleanly.
    pub error: Option<CoreError>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-file results of a batch check, in the order the files were checked.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub outcomes: Vec<FileOutcome>,
}

impl CheckReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_ok)
    }
}

/// Open each file in turn, recording every failure instead of stopping at the first.
pub fn check_files<I, P>(paths: I) -> CheckReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let outcomes = paths
        .into_iter()
        .map(|path| {
            let path = path.as_ref().to_path_buf();
            let error = open_document(&path).err();
            if let Some(e) = &error {
                tracing::debug!("check failed: {e}");
            }
            FileOutcome { path, error }
        })
        .collect();
    CheckReport { outcomes }
}

/// Check every `.tyx` file directly inside `dir`.
///
/// Fails only if the directory itself cannot be listed.
pub fn check_documents(dir: impl AsRef<Path>) -> CoreResult<CheckReport> {
    let documents = find_documents(dir.as_ref())?;
    tracing::debug!("checking {} documents in {}", documents.len(), dir.as_ref().display());
    Ok(check_files(documents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolve_samples_dir;
    use tempfile::TempDir;
    use tyx_schema::SchemaError;

    const MINIMAL: &str = r#"{"version": "0.2.7", "content": {"root": {"type": "root", "children": [
        {"type": "paragraph", "format": "", "children": [{"type": "text", "text": "hi", "format": 0}]}
    ]}}}"#;

    fn config(dir: &TempDir) -> CoreConfig {
        CoreConfig::new(dir.path().join("settings"), dir.path().join("samples")).expect("config")
    }

    #[test]
    fn get_document_reads_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("doc.tyx");
        fs::write(&path, MINIMAL).expect("write");

        let document = get_document(&path).expect("load");
        assert_eq!(document.blocks().len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = get_document(dir.path().join("nope.tyx")).expect_err("should fail");
        assert!(matches!(err, CoreError::Io { .. }));
    }

    #[test]
    fn schema_errors_carry_the_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bad.tyx");
        fs::write(&path, r#"{"content": {}}"#).expect("write");

        let err = get_document(&path).expect_err("should fail");
        match &err {
            CoreError::Schema { path: p, source } => {
                assert_eq!(p, &path);
                assert!(matches!(source, SchemaError::SchemaValidation { .. }));
            }
            other => panic!("expected Schema error, got {other:?}"),
        }
        assert!(err.schema_error().is_some());
    }

    #[test]
    fn open_document_rejects_old_versions() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("old.tyx");
        fs::write(&path, r#"{"version": "0.1.4"}"#).expect("write");

        assert!(get_document(&path).is_ok());
        let err = open_document(&path).expect_err("should reject");
        assert!(matches!(
            err,
            CoreError::IncompatibleVersion { ref version, .. } if version == "0.1.4"
        ));
    }

    #[test]
    fn missing_settings_file_gives_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let settings = read_settings_file(&config(&dir)).expect("defaults");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn blank_settings_file_gives_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = config(&dir);
        fs::create_dir_all(cfg.settings_dir()).expect("mkdir");
        fs::write(cfg.settings_file(), "  \n").expect("write");
        assert_eq!(read_settings_file(&cfg).expect("defaults"), Settings::default());
    }

    #[test]
    fn settings_write_then_read() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = config(&dir);
        let settings = Settings {
            language: Some("fr".into()),
            auto_start_server: Some(true),
            server_debounce: Some(300.0),
            ..Default::default()
        };

        let written = write_settings_file(&cfg, &settings).expect("write");
        assert_eq!(written, cfg.settings_file());
        assert_eq!(read_settings_file(&cfg).expect("read"), settings);
        assert_eq!(get_settings(&written).expect("get"), settings);
    }

    #[test]
    fn invalid_settings_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = config(&dir);
        fs::create_dir_all(cfg.settings_dir()).expect("mkdir");
        fs::write(cfg.settings_file(), r#"{"format": "yes"}"#).expect("write");
        let err = read_settings_file(&cfg).expect_err("should reject");
        assert!(matches!(err, CoreError::Schema { .. }));
    }

    #[test]
    fn find_documents_is_sorted_and_filtered() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("b.tyx"), MINIMAL).expect("write");
        fs::write(dir.path().join("a.tyx"), MINIMAL).expect("write");
        fs::write(dir.path().join("notes.txt"), "x").expect("write");
        fs::create_dir(dir.path().join("dir.tyx")).expect("mkdir");

        let found = find_documents(dir.path()).expect("list");
        let names: Vec<_> = found
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.tyx", "b.tyx"]);
    }

    #[test]
    fn check_documents_reports_every_file() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("good.tyx"), MINIMAL).expect("write");
        fs::write(dir.path().join("broken.tyx"), "{").expect("write");
        fs::write(dir.path().join("old.tyx"), r#"{"version": "0.1"}"#).expect("write");

        let report = check_documents(dir.path()).expect("check");
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed().count(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn every_sample_opens() {
        let samples = resolve_samples_dir(None).expect("samples dir");
        let report = check_documents(&samples).expect("check");
        assert!(!report.outcomes.is_empty());
        for outcome in report.failed() {
            panic!("{}: {:?}", outcome.path.display(), outcome.error);
        }
    }

    #[test]
    fn sample_settings_parse() {
        let samples = resolve_samples_dir(None).expect("samples dir");
        let settings = get_settings(samples.join("settings.json")).expect("load");
        assert!(settings.format_enabled());
        assert_eq!(settings.keyboard_map, None);
        assert_eq!(settings.server_debounce(), std::time::Duration::from_millis(750));
    }

    #[test]
    fn samples_round_trip() {
        let samples = resolve_samples_dir(None).expect("samples dir");
        for path in find_documents(&samples).expect("list") {
            let document = get_document(&path).expect("load");
            let bytes = tyx_schema::serialize(&document).expect("serialise");
            let reparsed = tyx_schema::parse_document(&bytes).expect("reparse");
            assert_eq!(document, reparsed, "{}", path.display());

            let original = fs::read(&path).expect("read");
            let dropped = tyx_schema::dropped_fields(&original).expect("parse");
            assert!(dropped.is_empty(), "{}: {dropped:?}", path.display());
        }
    }
}
