//! App-wide TyX settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::functions::FunctionDefinition;

/// Debounce applied before updating the PDF preview when `serverDebounce` is not set.
pub const DEFAULT_SERVER_DEBOUNCE_MILLISECONDS: u64 = 500;

/// A `[shortcut, command]` pair.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShortcutBinding(pub String, pub String);

impl ShortcutBinding {
    pub fn shortcut(&self) -> &str {
        &self.0
    }

    pub fn command(&self) -> &str {
        &self.1
    }
}

/// App-wide customization for TyX.
///
/// Every field is optional. Unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// UI language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard_shortcuts: Option<Vec<ShortcutBinding>>,
    /// `null` in the file is treated like an absent key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard_map: Option<String>,
    /// LaTeX-style inline math replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_inline_shortcuts: Option<Vec<ShortcutBinding>>,
    /// Whether to format the generated Typst output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start_server: Option<bool>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_debounce: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<BTreeMap<String, FunctionDefinition>>,
}

impl Settings {
    /// Effective preview debounce.
    ///
    /// Falls back to [`DEFAULT_SERVER_DEBOUNCE_MILLISECONDS`] when unset, negative or not finite.
    pub fn server_debounce(&self) -> Duration {
        self.server_debounce
            .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
            .unwrap_or(Duration::from_millis(DEFAULT_SERVER_DEBOUNCE_MILLISECONDS))
    }

    /// Whether output formatting is enabled (off unless set).
    pub fn format_enabled(&self) -> bool {
        self.format.unwrap_or(false)
    }
}
