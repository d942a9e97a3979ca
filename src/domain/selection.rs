//! Resolving an operator's rule selection against the fetched rule list

use super::rule::AccessRule;
use std::fmt;

/// Keyword selecting every rule, in flags and interactive input alike.
pub const ALL_RULES: &str = "all";

/// Which rules to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSelection {
    All,
    /// 1-based positions, kept as given so bad tokens can be reported
    Indices(Vec<String>),
    Names(Vec<String>),
}

impl RuleSelection {
    /// Pick one selection from the supplied specs: all, then indices, then names.
    pub fn from_specs(
        all: bool,
        indices: Option<Vec<String>>,
        names: Option<Vec<String>>,
    ) -> Option<Self> {
        if all {
            return Some(RuleSelection::All);
        }
        if let Some(indices) = indices.filter(|i| !i.is_empty()) {
            if indices.len() == 1 && indices[0].trim().eq_ignore_ascii_case(ALL_RULES) {
                return Some(RuleSelection::All);
            }
            return Some(RuleSelection::Indices(indices));
        }
        names
            .filter(|n| !n.is_empty())
            .map(RuleSelection::Names)
    }

    /// Parse interactive input: `all` or comma-separated positions.
    pub fn parse_input(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if input.eq_ignore_ascii_case(ALL_RULES) {
            return Some(RuleSelection::All);
        }
        let tokens: Vec<String> = input
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            None
        } else {
            Some(RuleSelection::Indices(tokens))
        }
    }
}

/// A selector that matched nothing. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedSelector {
    NotANumber(String),
    OutOfRange { index: usize, total: usize },
    UnknownName(String),
}

impl fmt::Display for SkippedSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkippedSelector::NotANumber(token) => write!(f, "'{}' is not a rule number", token),
            SkippedSelector::OutOfRange { index, total } => {
                write!(f, "rule {} is out of range (1-{})", index, total)
            }
            SkippedSelector::UnknownName(name) => write!(f, "no rule named '{}'", name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionResult {
    pub rules: Vec<AccessRule>,
    pub skipped: Vec<SkippedSelector>,
}

/// Resolve `selection` against `rules` (fetch order, positions from 1).
///
/// Results follow the selector order. A rule matched twice appears twice.
pub fn select_rules(rules: &[AccessRule], selection: &RuleSelection) -> SelectionResult {
    let mut result = SelectionResult::default();

    match selection {
        RuleSelection::All => result.rules = rules.to_vec(),
        RuleSelection::Indices(tokens) => {
            for token in tokens {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                match token.parse::<usize>() {
                    Ok(index) if (1..=rules.len()).contains(&index) => {
                        result.rules.push(rules[index - 1].clone())
                    }
                    Ok(index) => result.skipped.push(SkippedSelector::OutOfRange {
                        index,
                        total: rules.len(),
                    }),
                    Err(_) => result
                        .skipped
                        .push(SkippedSelector::NotANumber(token.to_string())),
                }
            }
        }
        RuleSelection::Names(names) => {
            for name in names {
                let name = name.trim();
                let before = result.rules.len();
                result.rules.extend(
                    rules
                        .iter()
                        .filter(|r| r.name.as_deref() == Some(name))
                        .cloned(),
                );
                if result.rules.len() == before {
                    result
                        .skipped
                        .push(SkippedSelector::UnknownName(name.to_string()));
                }
            }
        }
    }

    result
}
