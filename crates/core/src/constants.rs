//! Constants used throughout the TyX core crate.

/// Application identifier, used as the name of the settings directory.
pub const IDENTIFIER: &str = "com.tyx-editor.tyx";

/// Filename of the app-wide settings file inside the settings directory.
pub const SETTINGS_FILENAME: &str = "settings.json";

/// Directory holding the bundled sample documents.
pub const SAMPLES_DIR: &str = "samples";

/// Extension of TyX document files, without the dot.
pub const TYX_EXTENSION: &str = "tyx";
