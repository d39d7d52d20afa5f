use serde_json::json;

use super::*;

#[test]
fn parses_namespaced_payload() {
    let payload = json!({
        "symbol-locator": {
            "provider": {
                "command": " typescript-language-server ",
                "args": ["--stdio", " "],
                "languageId": "typescript",
                "requestTimeoutMs": 2500,
                "initializationOptions": {"preferences": {"quotePreference": "single"}}
            },
            "overview": {
                "maxAnswerChars": 5000,
                "extensions": [".ts", "TSX", "ts"],
                "excludePaths": ["node_modules/", " dist "]
            },
            "report": {
                "maxDepth": 4,
                "includeHover": true
            },
            "logging": {
                "level": "debug"
            }
        }
    });

    let settings = Settings::from_payload(Some(&payload));
    assert_eq!(settings.provider.command, "typescript-language-server");
    assert_eq!(settings.provider.args, vec!["--stdio"]);
    assert_eq!(settings.provider.language_id.as_deref(), Some("typescript"));
    assert_eq!(settings.provider.request_timeout_ms, 2500);
    assert!(settings.provider.initialization_options.is_some());
    assert!(settings.provider.is_configured());
    assert_eq!(settings.overview.max_answer_chars, 5000);
    assert_eq!(settings.overview.extensions, vec!["ts".to_string(), "tsx".to_string()]);
    assert_eq!(settings.overview.exclude_paths, vec!["node_modules".to_string(), "dist".to_string()]);
    assert_eq!(settings.report.max_depth, 4);
    assert!(settings.report.include_hover);
    assert_eq!(settings.logging.level, LogLevel::Debug);
}

#[test]
fn defaults_without_payload() {
    let settings = Settings::from_payload(None);
    assert_eq!(settings, Settings::default());
    assert!(!settings.provider.is_configured());
    assert_eq!(settings.report.max_depth, crate::report::MAX_REPORT_DEPTH);
    assert_eq!(settings.overview.max_answer_chars, 200_000);
}

#[test]
fn out_of_range_values_are_clamped() {
    let payload = json!({
        "provider": {"requestTimeoutMs": 1},
        "overview": {"maxAnswerChars": 0, "maxFileSizeKb": 999999999},
        "report": {"maxDepth": 500}
    });
    let settings = Settings::from_payload(Some(&payload));
    assert_eq!(settings.provider.request_timeout_ms, MIN_REQUEST_TIMEOUT_MS);
    assert_eq!(settings.overview.max_answer_chars, MIN_MAX_ANSWER_CHARS);
    assert_eq!(settings.overview.max_file_size_kb, MAX_MAX_FILE_SIZE_KB);
    assert_eq!(settings.report.max_depth, crate::report::MAX_REPORT_DEPTH);

    let zero_depth = Settings::from_payload(Some(&json!({"report": {"maxDepth": 0}})));
    assert_eq!(zero_depth.report.max_depth, MIN_REPORT_DEPTH);
}

#[test]
fn invalid_sections_are_ignored() {
    let payload = json!({
        "report": {"maxDepth": "deep"},
        "unknownSection": {"x": 1}
    });
    let settings = Settings::from_payload(Some(&payload));
    assert_eq!(settings.report, ReportSettings::default());
}

#[test]
fn merge_keeps_previous_values() {
    let base = Settings::from_payload(Some(&json!({"provider": {"command": "rust-analyzer"}})));
    let merged = base.merged_with_payload(&json!({"report": {"includeHover": true}}));
    assert_eq!(merged.provider.command, "rust-analyzer");
    assert!(merged.report.include_hover);
}

#[test]
fn parses_toml_file_contents() {
    let text = r#"
[provider]
command = "rust-analyzer"
requestTimeoutMs = 30000

[overview]
extensions = ["rs"]
excludePaths = ["target"]

[logging]
level = "warn"
"#;
    let settings = Settings::from_toml_str(text).expect("valid toml");
    assert_eq!(settings.provider.command, "rust-analyzer");
    assert_eq!(settings.provider.request_timeout_ms, 30_000);
    assert_eq!(settings.overview.extensions, vec!["rs"]);
    assert_eq!(settings.overview.exclude_paths, vec!["target"]);
    assert_eq!(settings.logging.level, LogLevel::Warn);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let error = Settings::from_toml_str("[provider\ncommand = 1").expect_err("must fail");
    assert!(matches!(error, SettingsError::Parse(_)), "got {error}");
}

#[test]
fn missing_file_is_a_read_error() {
    let error = Settings::from_file(Path::new("/nonexistent/symbol-locator.toml")).expect_err("must fail");
    assert!(matches!(error, SettingsError::Read { .. }), "got {error}");
}
