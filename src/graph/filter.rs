//! Kind filter expressions.
//!
//! Grammar: whitespace-separated terms, each a kind word optionally prefixed
//! by `~` to exclude it. Commas separate alternatives:
//!
//! ```text
//! class ~unknown ~unresolved
//! method, function
//! ```
//!
//! A kind matches an alternative when it carries every included word and
//! none of the excluded ones. An empty expression matches everything.

use std::fmt;
use std::str::FromStr;

use super::types::Kind;
use crate::error::{GraphError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Alternative {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Alternative {
    fn matches(&self, kind: &Kind) -> bool {
        self.include.iter().all(|w| kind.has_word(w))
            && !self.exclude.iter().any(|w| kind.has_word(w))
    }
}

/// A parsed kind filter. The default value matches every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindFilter {
    alternatives: Vec<Alternative>,
}

impl KindFilter {
    /// Filter that matches every kind.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a filter expression.
    pub fn parse(expr: &str) -> Result<Self> {
        if expr.trim().is_empty() {
            return Ok(Self::all());
        }

        let mut alternatives = Vec::new();
        for alt in expr.split(',') {
            let alt = alt.trim();
            if alt.is_empty() {
                return Err(GraphError::invalid(format!(
                    "empty alternative in kind filter '{expr}'"
                )));
            }
            let mut parsed = Alternative::default();
            for term in alt.split_whitespace() {
                let (negated, word) = match term.strip_prefix('~') {
                    Some(rest) => (true, rest),
                    None => (false, term),
                };
                validate_word(word, expr)?;
                let word = word.to_lowercase();
                if negated {
                    parsed.exclude.push(word);
                } else {
                    parsed.include.push(word);
                }
            }
            alternatives.push(parsed);
        }

        Ok(Self { alternatives })
    }

    /// Parse an optional expression; `None` matches everything.
    pub fn parse_opt(expr: Option<&str>) -> Result<Self> {
        expr.map_or_else(|| Ok(Self::all()), Self::parse)
    }

    /// True when this filter places no constraint.
    pub fn is_all(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn matches(&self, kind: &Kind) -> bool {
        self.is_all() || self.alternatives.iter().any(|alt| alt.matches(kind))
    }
}

fn validate_word(word: &str, expr: &str) -> Result<()> {
    if word.is_empty() {
        return Err(GraphError::invalid(format!(
            "dangling '~' in kind filter '{expr}'"
        )));
    }
    if let Some(bad) = word
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(GraphError::invalid(format!(
            "unexpected character '{bad}' in kind filter '{expr}'"
        )));
    }
    Ok(())
}

impl FromStr for KindFilter {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, alt) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let terms = alt
                .include
                .iter()
                .map(|w| w.to_string())
                .chain(alt.exclude.iter().map(|w| format!("~{w}")))
                .collect::<Vec<_>>();
            f.write_str(&terms.join(" "))?;
        }
        Ok(())
    }
}
