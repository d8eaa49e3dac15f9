//! Validated scenario file model.
//!
//! Values of these types only come out of the validator, so every
//! [`Rule`] already satisfies the cross-field invariants checked there.

use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Status served when a scenario does not set one.
pub const DEFAULT_STATUS: u16 = 200;

/// HTTP verbs a rule may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Parse a canonical, upper-case verb. `"get"` is rejected here.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Case-insensitive comparison against a request method.
    pub fn matches(&self, request_method: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(request_method)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One possible response for a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub status: u16,
    /// Inline JSON body (`json` in the file).
    pub payload: Option<Value>,
    /// Fixture file relative to the base directory (`file` in the file).
    /// Takes precedence over `payload` when both are set.
    pub fixture_path: Option<String>,
    /// Artificial latency (`delay` in the file).
    pub delay_seconds: Option<f64>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            payload: None,
            fixture_path: None,
            delay_seconds: None,
        }
    }
}

impl Scenario {
    /// The configured delay, or `None` when unset or not representable.
    pub fn delay(&self) -> Option<Duration> {
        let secs = self.delay_seconds?;
        if secs <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(secs).ok()
    }
}

/// A method + path matcher bound to a set of named scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub method: HttpMethod,
    /// Path as written in the file (`match`).
    pub match_path: String,
    pub enabled: bool,
    pub active_scenario: String,
    pub scenarios: BTreeMap<String, Scenario>,
}

impl Rule {
    /// The match path with a leading `/` guaranteed.
    pub fn normalized_path(&self) -> Cow<'_, str> {
        normalize_path(&self.match_path)
    }

    /// The scenario currently selected by `active_scenario`.
    pub fn active(&self) -> Option<&Scenario> {
        self.scenarios.get(&self.active_scenario)
    }
}

/// Prepend `/` to a path that lacks one.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    }
}

/// Top-level scenario file: rules in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioFile {
    pub rules: Vec<Rule>,
}

impl ScenarioFile {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
