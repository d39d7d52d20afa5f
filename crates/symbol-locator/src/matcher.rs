//! Matching of name-path queries against symbols.
//!
//! A query is either absolute (`/Root/Class/method`, compared for equality
//! with the full name path) or a suffix (`Class/method`, which must end the
//! name path on a segment boundary). Substring mode ignores paths entirely
//! and does a case-insensitive containment test on the bare name.

use std::sync::OnceLock;

use regex::Regex;

use crate::tree::NAME_PATH_SEPARATOR;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub substring: bool,
}

/// `true` when `query` selects the symbol whose name path is `name_path`.
///
/// The bare name is taken to be the last segment of `name_path`.
pub fn matches(
    query: &str,
    name_path: &str,
    options: MatchOptions,
) -> bool {
    let name = name_path.rsplit(NAME_PATH_SEPARATOR).next().unwrap_or(name_path);
    matches_symbol(query, name, name_path, options)
}

/// Same as [`matches`], with the symbol's own name supplied separately so
/// that names containing `/` are still compared whole in substring mode.
pub(crate) fn matches_symbol(
    query: &str,
    name: &str,
    name_path: &str,
    options: MatchOptions,
) -> bool {
    if query.is_empty() {
        return true;
    }

    if options.substring {
        return name.to_lowercase().contains(&query.to_lowercase());
    }

    if let Some(absolute) = query.strip_prefix(NAME_PATH_SEPARATOR) {
        return absolute == name_path;
    }

    match name_path.strip_suffix(query) {
        Some(prefix) => prefix.is_empty() || prefix.ends_with(NAME_PATH_SEPARATOR),
        None => false,
    }
}

fn name_path_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| Regex::new(r"^/?[^/]+(?:/[^/]+)*$").expect("name path grammar is a valid regex"))
}

/// A validated, trimmed query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePathQuery {
    text: String,
    substring: bool,
}

impl NamePathQuery {
    /// Returns `None` for empty or whitespace-only input and, outside
    /// substring mode, for text that is not `/?(segment/)*segment`.
    pub fn parse(
        raw: &str,
        substring: bool,
    ) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        if !substring && !name_path_grammar().is_match(text) {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            substring,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_absolute(&self) -> bool {
        !self.substring && self.text.starts_with(NAME_PATH_SEPARATOR)
    }

    pub fn options(&self) -> MatchOptions {
        MatchOptions {
            substring: self.substring,
        }
    }
}

#[cfg(test)]
#[path = "../tests/src/matcher_tests.rs"]
mod tests;
