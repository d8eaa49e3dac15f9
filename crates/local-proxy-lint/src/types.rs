//! Diagnostic types shared by the validator and the lint CLI.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Errors block loading; warnings are only reported by the linter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One finding, tied to the file and the dotted field path it concerns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LintIssue {
    pub severity: Severity,
    /// `E0xx` for errors, `W0xx` for warnings.
    pub code: String,
    pub message: String,
    #[serde(serialize_with = "path_as_str")]
    pub file: PathBuf,
    /// e.g. `rules.0.scenarios.ok.status`; `None` or empty for the root value.
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

fn path_as_str<S: serde::Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&path.display())
}

impl LintIssue {
    pub fn error(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self::with_severity(Severity::Error, code.into(), message.into(), file)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self::with_severity(Severity::Warning, code.into(), message.into(), file)
    }

    fn with_severity(severity: Severity, code: String, message: String, file: PathBuf) -> Self {
        Self {
            severity,
            code,
            message,
            file,
            location: None,
            suggestion: None,
        }
    }

    pub fn with_location(self, location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..self
        }
    }

    pub fn with_suggestion(self, suggestion: impl Into<String>) -> Self {
        Self {
            suggestion: Some(suggestion.into()),
            ..self
        }
    }

    /// The location, or `<root>` for issues about the top-level value.
    pub fn location_or_root(&self) -> &str {
        match self.location.as_deref() {
            Some(location) if !location.is_empty() => location,
            _ => "<root>",
        }
    }
}

/// Findings for one or more files, with running counts per severity.
#[derive(Debug, Default, Serialize)]
pub struct LintResult {
    pub issues: Vec<LintIssue>,
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl LintResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: LintIssue) {
        let counter = match issue.severity {
            Severity::Error => &mut self.errors,
            Severity::Warning => &mut self.warnings,
        };
        *counter += 1;
        self.issues.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    /// Warnings alone do not make a file invalid.
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn merge(&mut self, other: LintResult) {
        let LintResult {
            issues,
            files_checked,
            errors,
            warnings,
        } = other;
        self.issues.extend(issues);
        self.files_checked += files_checked;
        self.errors += errors;
        self.warnings += warnings;
    }

    /// Split off the error-severity issues as a [`ValidationError`], if any.
    pub fn into_validation_error(self) -> Option<ValidationError> {
        let violations: Vec<LintIssue> = self
            .issues
            .into_iter()
            .filter(|issue| issue.severity == Severity::Error)
            .collect();
        if violations.is_empty() {
            None
        } else {
            Some(ValidationError { violations })
        }
    }
}

/// Every schema violation found in a single scenario document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", describe_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<LintIssue>,
}

fn describe_violations(violations: &[LintIssue]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.location_or_root(), v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Whether any violation is reported at exactly this dotted path.
    pub fn has_violation_at(&self, location: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.location.as_deref() == Some(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut result = LintResult::new();
        result.add_issue(LintIssue::error("E010", "bad", PathBuf::from("a.json")));
        result.add_issue(LintIssue::warning("W001", "meh", PathBuf::from("a.json")));

        assert_eq!(result.errors, 1);
        assert_eq!(result.warnings, 1);
        assert!(!result.is_valid());
        assert!(result.has_warnings());
    }

    #[test]
    fn test_validation_error_keeps_only_errors() {
        let mut result = LintResult::new();
        result.add_issue(
            LintIssue::error("E014", "status out of range", PathBuf::from("s.json"))
                .with_location("rules.0.scenarios.ok.status"),
        );
        result.add_issue(LintIssue::warning("W003", "no slash", PathBuf::from("s.json")));

        let err = result.into_validation_error().unwrap();
        assert_eq!(err.violations.len(), 1);
        assert!(err.has_violation_at("rules.0.scenarios.ok.status"));
    }

    #[test]
    fn test_warnings_alone_are_not_a_validation_error() {
        let mut result = LintResult::new();
        result.add_issue(LintIssue::warning("W002", "both", PathBuf::from("s.json")));
        assert!(result.into_validation_error().is_none());
    }

    #[test]
    fn test_display_lists_every_violation() {
        let err = ValidationError {
            violations: vec![
                LintIssue::error("E011", "Invalid method", PathBuf::new())
                    .with_location("rules.0.method"),
                LintIssue::error("E010", "Expected object", PathBuf::new()).with_location(""),
            ],
        };
        assert_eq!(
            err.to_string(),
            "rules.0.method: Invalid method; <root>: Expected object"
        );
    }
}
