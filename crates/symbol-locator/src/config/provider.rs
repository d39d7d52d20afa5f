use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// How to launch and talk to the language server backing the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Executable of the language server; empty when none is configured.
    pub command: String,
    pub args: Vec<String>,
    /// Overrides the language id derived from file extensions.
    pub language_id: Option<String>,
    pub request_timeout_ms: u64,
    pub initialization_options: Option<Value>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            language_id: None,
            request_timeout_ms: 10_000,
            initialization_options: None,
        }
    }
}

impl ProviderSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: ProviderSettingsPatch,
    ) {
        if let Some(v) = patch.command {
            self.command = v;
        }
        if let Some(v) = patch.args {
            self.args = v;
        }
        if let Some(v) = patch.language_id {
            self.language_id = Some(v);
        }
        if let Some(v) = patch.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = patch.initialization_options {
            self.initialization_options = Some(v);
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.command = self.command.trim().to_string();
        self.args = self.args.iter().map(|a| a.trim().to_string()).filter(|a| !a.is_empty()).collect();
        self.language_id = self.language_id.take().map(|id| id.trim().to_string()).filter(|id| !id.is_empty());
        self.request_timeout_ms = self.request_timeout_ms.clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS);
    }

    pub fn is_configured(&self) -> bool {
        !self.command.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ProviderSettingsPatch {
    pub(crate) command: Option<String>,
    pub(crate) args: Option<Vec<String>>,
    pub(crate) language_id: Option<String>,
    pub(crate) request_timeout_ms: Option<u64>,
    pub(crate) initialization_options: Option<Value>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
