//! Selector Resolver
//!
//! Compiles declarative label selectors into validated [`Selector`]s and
//! evaluates them against label sets. Pure: no state, no I/O.
//!
//! Semantics follow Kubernetes: every `matchLabels` pair and every
//! `matchExpressions` requirement must hold; an empty selector matches
//! everything.

use crate::model::Labelled;
use crate::types::Labels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

/// Declarative selector as written in manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub match_labels: Labels,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

impl LabelSelector {
    /// Selector requiring every given pair.
    pub fn with_labels<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            match_labels: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            match_expressions: Vec::new(),
        }
    }

    pub fn with_expression(mut self, key: &str, operator: &str, values: &[&str]) -> Self {
        self.match_expressions.push(LabelSelectorRequirement {
            key: key.to_string(),
            operator: operator.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }
}

/// One `matchExpressions` entry. The operator stays a string so an unknown
/// operator surfaces as a [`SelectorError`] rather than a manifest decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Malformed selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SelectorError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operator {
    Equals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl Operator {
    fn parse(raw: &str) -> Result<Self, SelectorError> {
        match raw {
            "In" => Ok(Operator::In),
            "NotIn" => Ok(Operator::NotIn),
            "Exists" => Ok(Operator::Exists),
            "DoesNotExist" => Ok(Operator::DoesNotExist),
            other => Err(SelectorError(format!("{:?} is not a valid label selector operator", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Requirement {
    key: String,
    op: Operator,
    values: BTreeSet<String>,
}

impl Requirement {
    fn matches(&self, labels: &Labels) -> bool {
        match self.op {
            Operator::Equals | Operator::In => labels
                .get(&self.key)
                .map(|v| self.values.contains(v))
                .unwrap_or(false),
            Operator::NotIn => labels
                .get(&self.key)
                .map(|v| !self.values.contains(v))
                .unwrap_or(true),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = || self.values.iter().cloned().collect::<Vec<_>>().join(",");
        match self.op {
            Operator::Equals => write!(f, "{}={}", self.key, joined()),
            Operator::In => write!(f, "{} in ({})", self.key, joined()),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, joined()),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

/// Validated selector, ready to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

impl Selector {
    /// Selector matching every object.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn compile(raw: &LabelSelector) -> Result<Self, SelectorError> {
        let mut requirements = Vec::with_capacity(raw.match_labels.len() + raw.match_expressions.len());

        for (key, value) in &raw.match_labels {
            validate_key(key)?;
            validate_value(key, value)?;
            requirements.push(Requirement {
                key: key.clone(),
                op: Operator::Equals,
                values: BTreeSet::from([value.clone()]),
            });
        }

        for expr in &raw.match_expressions {
            validate_key(&expr.key)?;
            let op = Operator::parse(&expr.operator)?;
            match op {
                Operator::In | Operator::NotIn if expr.values.is_empty() => {
                    return Err(SelectorError(format!(
                        "values: must be specified when `operator` is 'In' or 'NotIn' (key {:?})",
                        expr.key
                    )));
                }
                Operator::Exists | Operator::DoesNotExist if !expr.values.is_empty() => {
                    return Err(SelectorError(format!(
                        "values: may not be specified when `operator` is 'Exists' or 'DoesNotExist' (key {:?})",
                        expr.key
                    )));
                }
                _ => {}
            }
            for value in &expr.values {
                validate_value(&expr.key, value)?;
            }
            requirements.push(Requirement {
                key: expr.key.clone(),
                op,
                values: expr.values.iter().cloned().collect(),
            });
        }

        requirements.sort();
        Ok(Self { requirements })
    }

    pub fn is_everything(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.requirements.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Subset of `candidates` matching `selector`, optionally confined to one namespace.
///
/// Candidate order is preserved.
pub fn select<'a, T: Labelled>(
    selector: &Selector,
    candidates: &'a [T],
    namespace: Option<&str>,
) -> Vec<&'a T> {
    candidates
        .iter()
        .filter(|c| namespace.map_or(true, |ns| c.namespace() == Some(ns)))
        .filter(|c| selector.matches(c.labels()))
        .collect()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

/// `([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]`, at most 63 chars.
fn is_qualified_name_part(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_NAME_LEN
        && s.chars().all(is_name_char)
        && s.chars().next().map_or(false, |c| c.is_ascii_alphanumeric())
        && s.chars().last().map_or(false, |c| c.is_ascii_alphanumeric())
}

/// Lowercase RFC 1123 subdomain.
fn is_dns_subdomain(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_PREFIX_LEN
        && s.split('.').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                && !part.starts_with('-')
                && !part.ends_with('-')
        })
}

fn validate_key(key: &str) -> Result<(), SelectorError> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };
    if let Some(prefix) = prefix {
        if !is_dns_subdomain(prefix) {
            return Err(SelectorError(format!(
                "invalid label key {:?}: prefix part must be a lowercase DNS subdomain",
                key
            )));
        }
    }
    if !is_qualified_name_part(name) {
        return Err(SelectorError(format!(
            "invalid label key {:?}: name part must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character",
            key
        )));
    }
    Ok(())
}

fn validate_value(key: &str, value: &str) -> Result<(), SelectorError> {
    if value.is_empty() || is_qualified_name_part(value) {
        return Ok(());
    }
    Err(SelectorError(format!(
        "invalid label value {:?} for key {:?}: must be 63 characters or less and consist of alphanumeric characters, '-', '_' or '.'",
        value, key
    )))
}
