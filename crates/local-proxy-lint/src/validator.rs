//! Core validation logic for scenario files.
//!
//! The walkers never stop at the first problem: every violation is pushed
//! into the [`LintResult`] and the typed value is only produced when the
//! walked subtree is free of errors.

use crate::schema::{HttpMethod, Rule, Scenario, ScenarioFile, DEFAULT_STATUS};
use crate::types::{LintIssue, LintResult, ValidationError};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Validate a complete scenario file.
///
/// Returns the typed file when no errors were found. Warnings do not prevent
/// a file from loading.
pub fn validate_scenario_file(
    file: &Path,
    value: &Value,
    result: &mut LintResult,
) -> Option<ScenarioFile> {
    let errors_before = result.errors;

    let root = match value.as_object() {
        Some(obj) => obj,
        None => {
            result.add_issue(type_mismatch(file, "", "object", value));
            return None;
        }
    };

    let mut rules = Vec::new();
    match root.get("rules") {
        None => {}
        Some(Value::Array(items)) => {
            for (idx, item) in items.iter().enumerate() {
                if let Some(rule) = validate_rule(file, item, &format!("rules.{idx}"), result) {
                    rules.push((idx, rule));
                }
            }
        }
        Some(other) => result.add_issue(type_mismatch(file, "rules", "array", other)),
    }

    check_unreachable_rules(file, &rules, result);

    if result.errors > errors_before {
        return None;
    }
    Some(ScenarioFile {
        rules: rules.into_iter().map(|(_, rule)| rule).collect(),
    })
}

/// Validate a single rule located at `location`.
pub fn validate_rule(
    file: &Path,
    value: &Value,
    location: &str,
    result: &mut LintResult,
) -> Option<Rule> {
    let errors_before = result.errors;

    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            result.add_issue(type_mismatch(file, location, "object", value));
            return None;
        }
    };

    let method = required_str(file, obj, location, "method", result).and_then(|raw| {
        let parsed = HttpMethod::parse(raw);
        if parsed.is_none() {
            let allowed: Vec<&str> = HttpMethod::ALL.iter().map(HttpMethod::as_str).collect();
            result.add_issue(
                LintIssue::error(
                    "E011",
                    format!(
                        "Invalid method \"{raw}\": expected one of {}",
                        allowed.join(", ")
                    ),
                    file.to_path_buf(),
                )
                .with_location(join(location, "method")),
            );
        }
        parsed
    });

    let match_path = required_str(file, obj, location, "match", result).and_then(|raw| {
        if raw.is_empty() {
            result.add_issue(
                LintIssue::error(
                    "E012",
                    "match must be a non-empty string",
                    file.to_path_buf(),
                )
                .with_location(join(location, "match")),
            );
            return None;
        }
        if !raw.starts_with('/') {
            result.add_issue(
                LintIssue::warning(
                    "W003",
                    format!("match \"{raw}\" has no leading '/', it is matched as \"/{raw}\""),
                    file.to_path_buf(),
                )
                .with_location(join(location, "match")),
            );
        }
        Some(raw.to_string())
    });

    let enabled = match required(file, obj, location, "enabled", result) {
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => {
            result.add_issue(type_mismatch(
                file,
                &join(location, "enabled"),
                "boolean",
                other,
            ));
            None
        }
        None => None,
    };

    let active_scenario = required_str(file, obj, location, "active_scenario", result);

    let scenarios_location = join(location, "scenarios");
    let scenarios = match required(file, obj, location, "scenarios", result) {
        Some(Value::Object(entries)) => {
            let mut scenarios = BTreeMap::new();
            for (name, scenario) in entries {
                let scenario_location = join(&scenarios_location, name);
                if name.is_empty() {
                    result.add_issue(
                        LintIssue::error(
                            "E013",
                            "Scenario names must not be empty",
                            file.to_path_buf(),
                        )
                        .with_location(&scenario_location),
                    );
                }
                if let Some(parsed) = validate_scenario(file, scenario, &scenario_location, result)
                {
                    scenarios.insert(name.clone(), parsed);
                }
            }
            Some((entries, scenarios))
        }
        Some(other) => {
            result.add_issue(type_mismatch(file, &scenarios_location, "object", other));
            None
        }
        None => None,
    };

    if let (Some(active), Some((entries, _))) = (active_scenario, scenarios.as_ref()) {
        if !entries.contains_key(active) {
            let known: Vec<&str> = entries.keys().map(String::as_str).collect();
            result.add_issue(
                LintIssue::error(
                    "E017",
                    "active_scenario must exist in scenarios",
                    file.to_path_buf(),
                )
                .with_location(join(location, "active_scenario"))
                .with_suggestion(if known.is_empty() {
                    "Add at least one scenario".to_string()
                } else {
                    format!("Use one of: {}", known.join(", "))
                }),
            );
        }
    }

    if result.errors > errors_before {
        return None;
    }
    Some(Rule {
        method: method?,
        match_path: match_path?,
        enabled: enabled?,
        active_scenario: active_scenario?.to_string(),
        scenarios: scenarios?.1,
    })
}

/// Validate a single scenario located at `location`.
pub fn validate_scenario(
    file: &Path,
    value: &Value,
    location: &str,
    result: &mut LintResult,
) -> Option<Scenario> {
    let errors_before = result.errors;

    let obj = match value.as_object() {
        Some(obj) => obj,
        None => {
            result.add_issue(type_mismatch(file, location, "object", value));
            return None;
        }
    };

    let status = match obj.get("status") {
        None => DEFAULT_STATUS,
        Some(raw) => match integer_value(raw) {
            Some(code) if (100..=599).contains(&code) => code as u16,
            Some(code) => {
                result.add_issue(
                    LintIssue::error(
                        "E014",
                        format!("Status {code} is out of range (100-599)"),
                        file.to_path_buf(),
                    )
                    .with_location(join(location, "status")),
                );
                DEFAULT_STATUS
            }
            None => {
                result.add_issue(type_mismatch(
                    file,
                    &join(location, "status"),
                    "integer",
                    raw,
                ));
                DEFAULT_STATUS
            }
        },
    };

    let payload = match obj.get("json") {
        None => None,
        Some(raw @ Value::Object(_)) => Some(raw.clone()),
        Some(other) => {
            result.add_issue(type_mismatch(file, &join(location, "json"), "object", other));
            None
        }
    };

    let fixture_path = match obj.get("file") {
        None => None,
        Some(Value::String(path)) if !path.is_empty() => Some(path.clone()),
        Some(Value::String(_)) => {
            result.add_issue(
                LintIssue::error("E010", "file must be a non-empty string", file.to_path_buf())
                    .with_location(join(location, "file")),
            );
            None
        }
        Some(other) => {
            result.add_issue(type_mismatch(file, &join(location, "file"), "string", other));
            None
        }
    };

    let delay_seconds = match obj.get("delay") {
        None => None,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(secs) if secs > 0.0 => Some(secs),
            _ => {
                result.add_issue(
                    LintIssue::error(
                        "E015",
                        format!("delay must be a positive number, got {n}"),
                        file.to_path_buf(),
                    )
                    .with_location(join(location, "delay")),
                );
                None
            }
        },
        Some(other) => {
            result.add_issue(type_mismatch(file, &join(location, "delay"), "number", other));
            None
        }
    };

    if !obj.contains_key("json") && !obj.contains_key("file") {
        result.add_issue(
            LintIssue::error(
                "E016",
                "Scenario must have either \"json\" or \"file\"",
                file.to_path_buf(),
            )
            .with_location(location)
            .with_suggestion("Add an inline \"json\" body or a \"file\" fixture path"),
        );
    }

    if payload.is_some() && fixture_path.is_some() {
        result.add_issue(
            LintIssue::warning(
                "W002",
                "Scenario defines both \"json\" and \"file\"; the fixture is served and \"json\" is ignored",
                file.to_path_buf(),
            )
            .with_location(location),
        );
    }

    if result.errors > errors_before {
        return None;
    }
    Some(Scenario {
        status,
        payload,
        fixture_path,
        delay_seconds,
    })
}

/// Warn about enabled rules shadowed by an earlier enabled rule.
fn check_unreachable_rules(file: &Path, rules: &[(usize, Rule)], result: &mut LintResult) {
    let mut seen: HashMap<(HttpMethod, String), usize> = HashMap::new();

    for (idx, rule) in rules.iter().filter(|(_, rule)| rule.enabled) {
        let key = (rule.method, rule.normalized_path().into_owned());
        if let Some(first) = seen.get(&key) {
            result.add_issue(
                LintIssue::warning(
                    "W001",
                    format!(
                        "Rule is unreachable: rules.{first} already answers {} {}",
                        key.0, key.1
                    ),
                    file.to_path_buf(),
                )
                .with_location(format!("rules.{idx}"))
                .with_suggestion("Disable one of the rules or switch scenarios instead"),
            );
        } else {
            seen.insert(key, *idx);
        }
    }
}

/// Parse and validate a whole scenario document.
pub fn parse_scenario_file(value: &Value) -> Result<ScenarioFile, ValidationError> {
    let mut result = LintResult::new();
    let parsed = validate_scenario_file(Path::new(""), value, &mut result);
    finish(parsed, result)
}

/// Parse and validate a single rule object.
pub fn parse_rule(value: &Value) -> Result<Rule, ValidationError> {
    let mut result = LintResult::new();
    let parsed = validate_rule(Path::new(""), value, "", &mut result);
    finish(parsed, result)
}

/// Parse and validate a single scenario object.
pub fn parse_scenario(value: &Value) -> Result<Scenario, ValidationError> {
    let mut result = LintResult::new();
    let parsed = validate_scenario(Path::new(""), value, "", &mut result);
    finish(parsed, result)
}

fn finish<T>(parsed: Option<T>, result: LintResult) -> Result<T, ValidationError> {
    match (parsed, result.into_validation_error()) {
        (_, Some(err)) => Err(err),
        (Some(value), None) => Ok(value),
        (None, None) => Err(ValidationError {
            violations: vec![LintIssue::error("E010", "Invalid value", Default::default())],
        }),
    }
}

fn required<'v>(
    file: &Path,
    obj: &'v Map<String, Value>,
    location: &str,
    key: &str,
    result: &mut LintResult,
) -> Option<&'v Value> {
    let value = obj.get(key);
    if value.is_none() {
        result.add_issue(
            LintIssue::error(
                "E010",
                format!("Missing required field: {key}"),
                file.to_path_buf(),
            )
            .with_location(join(location, key)),
        );
    }
    value
}

fn required_str<'v>(
    file: &Path,
    obj: &'v Map<String, Value>,
    location: &str,
    key: &str,
    result: &mut LintResult,
) -> Option<&'v str> {
    match required(file, obj, location, key, result)? {
        Value::String(s) => Some(s.as_str()),
        other => {
            result.add_issue(type_mismatch(file, &join(location, key), "string", other));
            None
        }
    }
}

/// Integers, including floats with no fractional part (`200.0`).
fn integer_value(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n,
        _ => return None,
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        return Some(i64::MAX);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn type_mismatch(file: &Path, location: &str, expected: &str, actual: &Value) -> LintIssue {
    LintIssue::error(
        "E010",
        format!("Expected {expected}, received {}", type_name(actual)),
        file.to_path_buf(),
    )
    .with_location(location)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(location: &str, key: &str) -> String {
    if location.is_empty() {
        key.to_string()
    } else {
        format!("{location}.{key}")
    }
}
