use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::report::MAX_REPORT_DEPTH;

pub const MIN_REPORT_DEPTH: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    /// Upper bound for descendant reports, including `"all"`.
    pub max_depth: usize,
    pub include_hover: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_depth: MAX_REPORT_DEPTH,
            include_hover: false,
        }
    }
}

impl ReportSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: ReportSettingsPatch,
    ) {
        if let Some(v) = patch.max_depth {
            self.max_depth = v;
        }
        if let Some(v) = patch.include_hover {
            self.include_hover = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.max_depth = self.max_depth.clamp(MIN_REPORT_DEPTH, MAX_REPORT_DEPTH);
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ReportSettingsPatch {
    pub(crate) max_depth: Option<usize>,
    pub(crate) include_hover: Option<bool>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
