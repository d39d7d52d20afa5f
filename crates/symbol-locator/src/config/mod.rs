//! Layered settings.
//!
//! Settings are split into one file per category. [`Settings`] aggregates
//! all categories and merges partial patches from a TOML file or a JSON
//! payload. Unknown keys are tolerated and out-of-range values are clamped.

pub(crate) mod logging;
pub(crate) mod overview;
pub(crate) mod provider;
pub(crate) mod report;

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    path::Path,
};

use logging::LoggingSettingsPatch;
pub use logging::{LogLevel, LoggingSettings};
use overview::OverviewSettingsPatch;
pub use overview::{MAX_MAX_FILE_SIZE_KB, MIN_MAX_ANSWER_CHARS, MIN_MAX_FILE_SIZE_KB, OverviewSettings};
use provider::ProviderSettingsPatch;
pub use provider::{MAX_REQUEST_TIMEOUT_MS, MIN_REQUEST_TIMEOUT_MS, ProviderSettings};
use report::ReportSettingsPatch;
pub use report::{MIN_REPORT_DEPTH, ReportSettings};
use serde::Deserialize;
use serde_json::Value;

pub const SETTINGS_SECTION_KEY: &str = "symbol-locator";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub overview: OverviewSettings,
    pub report: ReportSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn from_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let payload: Value = toml::from_str(text).map_err(|error| SettingsError::Parse(error.to_string()))?;
        Ok(Self::from_payload(Some(&payload)))
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|error| SettingsError::Read {
            path: path.display().to_string(),
            reason: error.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn merged_with_payload(
        &self,
        payload: &Value,
    ) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            if let Ok(patch) = serde_json::from_value::<SettingsPatch>(candidate.clone()) {
                merged.apply_patch(patch);
            }
        }

        merged.normalize();
        merged
    }

    fn apply_patch(
        &mut self,
        patch: SettingsPatch,
    ) {
        if let Some(p) = patch.provider {
            self.provider.apply_patch(p);
        }
        if let Some(p) = patch.overview {
            self.overview.apply_patch(p);
        }
        if let Some(p) = patch.report {
            self.report.apply_patch(p);
        }
        if let Some(p) = patch.logging {
            self.logging.apply_patch(p);
        }
    }

    fn normalize(&mut self) {
        self.provider.normalize();
        self.overview.normalize();
        self.report.normalize();
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct SettingsPatch {
    provider: Option<ProviderSettingsPatch>,
    overview: Option<OverviewSettingsPatch>,
    report: Option<ReportSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(payload: &Value) -> Vec<Value> {
    let mut candidates = Vec::new();
    candidates.push(payload.clone());
    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped.clone());
    }
    candidates
}

#[derive(Debug)]
pub enum SettingsError {
    Read {
        path: String,
        reason: String,
    },
    Parse(String),
}

impl Display for SettingsError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Read {
                path,
                reason,
            } => {
                write!(f, "cannot read settings file {path}: {reason}")
            },
            Self::Parse(reason) => write!(f, "invalid settings: {reason}"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
#[path = "../../tests/src/config/settings_tests.rs"]
mod tests;
