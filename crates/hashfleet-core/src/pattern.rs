//! Instance-type specification parsing and matching.
//!
//! A specification is a comma-separated list of tokens:
//!
//! ```text
//! *                  every catalogue entry
//! g4dn.*             names starting with "g4dn."
//! *.metal            names ending with ".metal"
//! p3.2xlarge         exactly that name
//! -p4d.*             exclusion; any of the forms above after a leading '-'
//! ```
//!
//! A wildcard may appear once, either first or last. There is no general
//! globbing and no regex.

use std::fmt;

use crate::error::{FleetError, FleetResult};

/// A single-wildcard name pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `*`
    Any,
    /// No wildcard.
    Exact(String),
    /// `prefix*`
    Prefix(String),
    /// `*suffix`
    Suffix(String),
}

impl Pattern {
    /// Parse one trimmed pattern body (without any leading `-`).
    pub fn parse(body: &str) -> FleetResult<Self> {
        if body.is_empty() {
            return Err(FleetError::InvalidSpec("empty pattern".to_string()));
        }
        if body.starts_with('-') {
            return Err(FleetError::InvalidSpec(format!(
                "pattern '{body}' may not start with '-'"
            )));
        }

        match body.matches('*').count() {
            0 => Ok(Pattern::Exact(body.to_string())),
            1 if body == "*" => Ok(Pattern::Any),
            1 => {
                if let Some(prefix) = body.strip_suffix('*') {
                    Ok(Pattern::Prefix(prefix.to_string()))
                } else if let Some(suffix) = body.strip_prefix('*') {
                    Ok(Pattern::Suffix(suffix.to_string()))
                } else {
                    Err(FleetError::InvalidSpec(format!(
                        "wildcard in '{body}' must be the first or last character"
                    )))
                }
            }
            _ => Err(FleetError::InvalidSpec(format!(
                "pattern '{body}' has more than one wildcard"
            ))),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(exact) => name == exact,
            Pattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Pattern::Suffix(suffix) => name.ends_with(suffix.as_str()),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => f.write_str("*"),
            Pattern::Exact(s) => f.write_str(s),
            Pattern::Prefix(s) => write!(f, "{s}*"),
            Pattern::Suffix(s) => write!(f, "*{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Include,
    Exclude,
}

/// One token of a specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    pub kind: RuleKind,
    pub pattern: Pattern,
}

impl MatchRule {
    pub fn include(pattern: Pattern) -> Self {
        Self {
            kind: RuleKind::Include,
            pattern,
        }
    }

    pub fn exclude(pattern: Pattern) -> Self {
        Self {
            kind: RuleKind::Exclude,
            pattern,
        }
    }

    pub fn is_exclude(&self) -> bool {
        self.kind == RuleKind::Exclude
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.matches(name)
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RuleKind::Include => write!(f, "{}", self.pattern),
            RuleKind::Exclude => write!(f, "-{}", self.pattern),
        }
    }
}

/// Parse a specification string into rules, preserving token order.
pub fn parse_spec(spec: &str) -> FleetResult<Vec<MatchRule>> {
    spec.split(',')
        .enumerate()
        .map(|(index, raw)| parse_token(raw.trim(), index))
        .collect()
}

fn parse_token(token: &str, index: usize) -> FleetResult<MatchRule> {
    if token.is_empty() {
        return Err(FleetError::InvalidSpec(format!(
            "token {} is empty",
            index + 1
        )));
    }

    match token.strip_prefix('-') {
        Some(rest) => {
            let body = rest.trim();
            if body.is_empty() {
                return Err(FleetError::InvalidSpec(format!(
                    "token {} is a bare '-' with nothing to exclude",
                    index + 1
                )));
            }
            Ok(MatchRule::exclude(Pattern::parse(body)?))
        }
        None => Ok(MatchRule::include(Pattern::parse(token)?)),
    }
}

/// Render rules back into a canonical specification string.
pub fn render_spec(rules: &[MatchRule]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_universal_wildcard() {
        let rules = parse_spec("*").unwrap();
        assert_eq!(rules, vec![MatchRule::include(Pattern::Any)]);
    }

    #[test]
    fn parses_mixed_tokens_in_order() {
        let rules = parse_spec(" g4dn.* , p3.2xlarge,-p4d.*, *.metal ").unwrap();
        assert_eq!(
            rules,
            vec![
                MatchRule::include(Pattern::Prefix("g4dn.".into())),
                MatchRule::include(Pattern::Exact("p3.2xlarge".into())),
                MatchRule::exclude(Pattern::Prefix("p4d.".into())),
                MatchRule::include(Pattern::Suffix(".metal".into())),
            ]
        );
    }

    #[test]
    fn exclusion_body_is_trimmed() {
        let rules = parse_spec("- g5.*").unwrap();
        assert_eq!(rules, vec![MatchRule::exclude(Pattern::Prefix("g5.".into()))]);
    }

    #[test]
    fn exclude_all() {
        let rules = parse_spec("-*").unwrap();
        assert_eq!(rules, vec![MatchRule::exclude(Pattern::Any)]);
    }

    #[test]
    fn rejects_empty_tokens() {
        assert!(matches!(parse_spec(""), Err(FleetError::InvalidSpec(_))));
        assert!(matches!(parse_spec("g5.*,"), Err(FleetError::InvalidSpec(_))));
        assert!(matches!(parse_spec("g5.*, ,p3.*"), Err(FleetError::InvalidSpec(_))));
    }

    #[test]
    fn rejects_bare_dash() {
        let err = parse_spec("g5.*,-").unwrap_err();
        assert!(err.to_string().contains("bare '-'"));
        assert!(matches!(parse_spec("-  "), Err(FleetError::InvalidSpec(_))));
    }

    #[test]
    fn rejects_interior_and_repeated_wildcards() {
        assert!(matches!(parse_spec("g4*.xlarge"), Err(FleetError::InvalidSpec(_))));
        assert!(matches!(parse_spec("*g4*"), Err(FleetError::InvalidSpec(_))));
        assert!(matches!(parse_spec("**"), Err(FleetError::InvalidSpec(_))));
    }

    #[test]
    fn rejects_double_dash() {
        assert!(matches!(parse_spec("--g5.*"), Err(FleetError::InvalidSpec(_))));
    }

    #[test]
    fn prefix_matching() {
        let p = Pattern::parse("g4dn.*").unwrap();
        assert!(p.matches("g4dn.xlarge"));
        assert!(p.matches("g4dn.metal"));
        assert!(!p.matches("g4ad.xlarge"));
        assert!(!p.matches("g4dnx.large"));
    }

    #[test]
    fn suffix_matching() {
        let p = Pattern::parse("*.metal").unwrap();
        assert!(p.matches("g4dn.metal"));
        assert!(!p.matches("g4dn.xlarge"));
    }

    #[test]
    fn exact_matching_is_whole_name() {
        let p = Pattern::parse("g5.xlarge").unwrap();
        assert!(p.matches("g5.xlarge"));
        assert!(!p.matches("g5.xlarge2"));
        assert!(!p.matches("g5.2xlarge"));
    }

    #[test]
    fn render_is_canonical() {
        let rules = parse_spec(" g4dn.* ,- p4d.*,*").unwrap();
        assert_eq!(render_spec(&rules), "g4dn.*,-p4d.*,*");
    }
}
