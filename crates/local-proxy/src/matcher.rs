//! Rule Matcher: first enabled rule whose method and exact path match.

use local_proxy_lint::{Rule, Scenario};

/// The winning rule together with its resolved active scenario.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    pub rule: &'a Rule,
    pub scenario_name: &'a str,
    pub scenario: &'a Scenario,
}

/// Find the rule answering `method path`, in declaration order.
///
/// `path` is the request path with the API prefix already stripped and no
/// query string. A rule whose active scenario cannot be resolved is skipped
/// rather than failing the request.
pub fn match_rule<'a>(rules: &'a [Rule], method: &str, path: &str) -> Option<MatchResult<'a>> {
    rules
        .iter()
        .filter(|rule| rule.enabled)
        .filter(|rule| rule.method.matches(method))
        .filter(|rule| rule.normalized_path() == path)
        .find_map(|rule| {
            let scenario = rule.active()?;
            Some(MatchResult {
                rule,
                scenario_name: rule.active_scenario.as_str(),
                scenario,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use local_proxy_lint::HttpMethod;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn rule(method: HttpMethod, path: &str, enabled: bool, active: &str) -> Rule {
        let mut scenarios = BTreeMap::new();
        scenarios.insert(
            active.to_string(),
            Scenario {
                payload: Some(json!({ "scenario": active })),
                ..Default::default()
            },
        );
        Rule {
            method,
            match_path: path.to_string(),
            enabled,
            active_scenario: active.to_string(),
            scenarios,
        }
    }

    #[test]
    fn test_exact_match() {
        let rules = vec![rule(HttpMethod::Get, "/test", true, "success")];
        let m = match_rule(&rules, "GET", "/test").unwrap();
        assert_eq!(m.scenario_name, "success");
        assert_eq!(m.scenario.payload, Some(json!({ "scenario": "success" })));

        assert!(match_rule(&rules, "GET", "/test/1").is_none());
        assert!(match_rule(&rules, "GET", "/tes").is_none());
        assert!(match_rule(&rules, "POST", "/test").is_none());
    }

    #[test]
    fn test_disabled_rules_never_match() {
        let rules = vec![
            rule(HttpMethod::Get, "/disabled", false, "a"),
            rule(HttpMethod::Delete, "/disabled", false, "b"),
        ];
        for method in ["GET", "get", "DELETE", "POST"] {
            assert!(match_rule(&rules, method, "/disabled").is_none());
        }
    }

    #[test]
    fn test_method_case_insensitive() {
        let rules = vec![rule(HttpMethod::Post, "/users", true, "created")];
        for method in ["POST", "post", "Post"] {
            assert!(match_rule(&rules, method, "/users").is_some(), "{method}");
        }
    }

    #[test]
    fn test_missing_leading_slash_is_normalized() {
        let rules = vec![rule(HttpMethod::Get, "health", true, "ok")];
        assert!(match_rule(&rules, "GET", "/health").is_some());
        assert!(match_rule(&rules, "GET", "health").is_none());
    }

    #[test]
    fn test_first_rule_wins() {
        let rules = vec![
            rule(HttpMethod::Get, "/dup", true, "first"),
            rule(HttpMethod::Get, "/dup", true, "second"),
        ];
        let m = match_rule(&rules, "GET", "/dup").unwrap();
        assert_eq!(m.scenario_name, "first");
        assert!(std::ptr::eq(m.rule, &rules[0]));
    }

    #[test]
    fn test_disabled_rule_does_not_shadow_later_rule() {
        let rules = vec![
            rule(HttpMethod::Get, "/dup", false, "first"),
            rule(HttpMethod::Get, "/dup", true, "second"),
        ];
        assert_eq!(
            match_rule(&rules, "GET", "/dup").unwrap().scenario_name,
            "second"
        );
    }

    #[test]
    fn test_unresolvable_active_scenario_is_skipped() {
        let mut broken = rule(HttpMethod::Get, "/x", true, "ok");
        broken.active_scenario = "gone".to_string();
        let rules = vec![broken, rule(HttpMethod::Get, "/x", true, "fallback")];

        let m = match_rule(&rules, "GET", "/x").unwrap();
        assert_eq!(m.scenario_name, "fallback");

        assert!(match_rule(&rules[..1], "GET", "/x").is_none());
    }

    #[test]
    fn test_no_rules() {
        assert!(match_rule(&[], "GET", "/").is_none());
    }
}
