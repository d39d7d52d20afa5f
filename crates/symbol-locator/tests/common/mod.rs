#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lsp_types::{Position, Url};
use symbol_locator::InMemoryProvider;

pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn workspace_root() -> PathBuf {
    fixtures_root().join("workspace")
}

pub fn fixture_path(relative_path: &str) -> PathBuf {
    workspace_root().join(relative_path)
}

pub fn fixture_uri(relative_path: &str) -> Url {
    Url::from_file_path(fixture_path(relative_path)).expect("fixture path is valid file:// URI")
}

pub fn read_fixture(relative_path: &str) -> String {
    std::fs::read_to_string(fixture_path(relative_path)).expect("fixture must exist")
}

/// Declarations recorded for the fixture workspace.
pub fn snapshot_provider() -> InMemoryProvider {
    InMemoryProvider::from_snapshot_file(&fixtures_root().join("workspace.symbols.json")).expect("snapshot loads")
}

/// Position of the first occurrence of `needle` in `source`.
pub fn position_of(
    source: &str,
    needle: &str,
) -> Position {
    for (line_idx, line) in source.lines().enumerate() {
        if let Some(col) = line.find(needle) {
            return Position::new(line_idx as u32, col as u32);
        }
    }
    panic!("needle {needle:?} not found in source");
}

pub fn settings_fixture() -> PathBuf {
    fixtures_root().join("symbol-locator.toml")
}

pub fn assert_relative(path: &str) {
    assert!(!Path::new(path).is_absolute(), "{path} should be workspace-relative");
}
