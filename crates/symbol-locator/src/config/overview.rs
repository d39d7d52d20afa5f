use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

pub const MIN_MAX_ANSWER_CHARS: usize = 1;
pub const MIN_MAX_FILE_SIZE_KB: u64 = 16;
pub const MAX_MAX_FILE_SIZE_KB: u64 = 1024 * 64;

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewSettings {
    pub max_answer_chars: usize,
    /// File extensions (without dot) considered source files; empty means all.
    pub extensions: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub max_file_size_kb: u64,
}

impl Default for OverviewSettings {
    fn default() -> Self {
        Self {
            max_answer_chars: 200_000,
            extensions: Vec::new(),
            exclude_paths: Vec::new(),
            max_file_size_kb: 512,
        }
    }
}

impl OverviewSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: OverviewSettingsPatch,
    ) {
        if let Some(v) = patch.max_answer_chars {
            self.max_answer_chars = v;
        }
        if let Some(v) = patch.extensions {
            self.extensions = v;
        }
        if let Some(v) = patch.exclude_paths {
            self.exclude_paths = v;
        }
        if let Some(v) = patch.max_file_size_kb {
            self.max_file_size_kb = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.max_answer_chars = self.max_answer_chars.max(MIN_MAX_ANSWER_CHARS);
        self.max_file_size_kb = self.max_file_size_kb.clamp(MIN_MAX_FILE_SIZE_KB, MAX_MAX_FILE_SIZE_KB);

        let mut seen = HashSet::new();
        self.extensions = self
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .filter(|e| seen.insert(e.clone()))
            .collect();

        let mut seen = HashSet::new();
        self.exclude_paths = self
            .exclude_paths
            .iter()
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .filter(|p| seen.insert(p.clone()))
            .collect();
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb.saturating_mul(1024)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct OverviewSettingsPatch {
    pub(crate) max_answer_chars: Option<usize>,
    pub(crate) extensions: Option<Vec<String>>,
    pub(crate) exclude_paths: Option<Vec<String>>,
    pub(crate) max_file_size_kb: Option<u64>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
