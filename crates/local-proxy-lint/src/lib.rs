//! Scenario file schema and linter for local-proxy.
//!
//! This library owns the typed scenario model and the validator that turns a
//! decoded JSON document into it. Validation collects every violation, each
//! tagged with a dotted path such as `rules.0.scenarios.success.status`.
//! It can be used as a library or through the `local-proxy-lint` CLI binary.
//!
//! # Example
//!
//! ```no_run
//! use local_proxy_lint::{lint_file, parse_scenario_file};
//! use std::path::Path;
//!
//! let result = lint_file(Path::new("scenarios.json"));
//! if result.has_errors() {
//!     eprintln!("Found {} errors", result.errors);
//! }
//!
//! let value = serde_json::json!({ "rules": [] });
//! let file = parse_scenario_file(&value).unwrap();
//! assert!(file.rules.is_empty());
//! ```

mod schema;
mod types;
mod validator;

use std::path::Path;

pub use schema::{normalize_path, HttpMethod, Rule, Scenario, ScenarioFile, DEFAULT_STATUS};
pub use types::{LintIssue, LintResult, Severity, ValidationError};
pub use validator::{
    parse_rule, parse_scenario, parse_scenario_file, validate_rule, validate_scenario,
    validate_scenario_file,
};

/// Lint a single scenario file on disk.
pub fn lint_file(path: &Path) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            result.add_issue(LintIssue::error(
                "E001",
                format!("Failed to read file: {e}"),
                path.to_path_buf(),
            ));
            return result;
        }
    };

    lint_content(&content, path, &mut result);
    result
}

/// Lint every `*.json` file in a directory (non-recursive).
pub fn lint_directory(path: &Path) -> LintResult {
    let mut result = LintResult::new();

    let entries = match std::fs::read_dir(path) {
        Ok(e) => e,
        Err(e) => {
            result.add_issue(LintIssue::error(
                "E001",
                format!("Failed to read directory: {e}"),
                path.to_path_buf(),
            ));
            return result;
        }
    };

    let mut files: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for file in files {
        result.merge(lint_file(&file));
    }

    result
}

/// Lint a JSON string directly (useful for in-memory validation).
pub fn lint_json(json: &str, source_name: &str) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;
    lint_content(json, Path::new(source_name), &mut result);
    result
}

/// Lint an already decoded JSON value.
pub fn lint_value(value: &serde_json::Value, source_name: &str) -> LintResult {
    let mut result = LintResult::new();
    result.files_checked = 1;
    validate_scenario_file(Path::new(source_name), value, &mut result);
    result
}

fn lint_content(content: &str, path: &Path, result: &mut LintResult) {
    // An empty file is the same as a missing one: no rules.
    if content.trim().is_empty() {
        return;
    }

    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value) => {
            validate_scenario_file(path, &value, result);
        }
        Err(e) => result.add_issue(
            LintIssue::error("E002", format!("Invalid JSON: {e}"), path.to_path_buf())
                .with_suggestion("Check for JSON syntax errors"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lint_json_invalid_syntax() {
        let result = lint_json("invalid json", "scenarios.json");
        assert_eq!(result.errors, 1);
        assert_eq!(result.issues[0].code, "E002");
    }

    #[test]
    fn test_lint_json_empty_document() {
        let result = lint_json("  \n", "scenarios.json");
        assert!(result.is_valid());
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_lint_value_reports_locations() {
        let value = serde_json::json!({
            "rules": [{
                "method": "GET",
                "match": "/users",
                "enabled": true,
                "active_scenario": "missing",
                "scenarios": { "ok": { "json": {} } }
            }]
        });
        let result = lint_value(&value, "inline");
        assert_eq!(result.errors, 1);
        assert_eq!(
            result.issues[0].location.as_deref(),
            Some("rules.0.active_scenario")
        );
    }

    #[test]
    fn test_lint_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = lint_file(&dir.path().join("nope.json"));
        assert_eq!(result.issues[0].code, "E001");
    }

    #[test]
    fn test_lint_directory_only_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut good = std::fs::File::create(dir.path().join("good.json")).unwrap();
        write!(good, r#"{{"rules": []}}"#).unwrap();
        let mut bad = std::fs::File::create(dir.path().join("bad.json")).unwrap();
        write!(bad, "{{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not json").unwrap();

        let result = lint_directory(dir.path());
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.errors, 1);
    }
}
