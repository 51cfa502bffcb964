//! Targets: ordered lists of alternative ways to find one logical element.
//!
//! Order encodes preference. Put the most stable strategy (an id or `name`
//! attribute) first and the broad structural patterns last.

use std::fmt;
use thiserror::Error;

/// Number of leading characters used for the partial-text fallback of a nav link.
const NAV_PARTIAL_PREFIX: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// CSS selector over stable attributes (`#id`, `[name=...]`, `[data-qa=...]`).
    Attribute(String),
    /// Exact visible link text.
    Text(String),
    /// Link whose visible text contains the fragment.
    PartialText(String),
    /// XPath expression.
    StructuralPattern(String),
}

impl Strategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Attribute(_) => "attribute",
            Strategy::Text(_) => "text",
            Strategy::PartialText(_) => "partial-text",
            Strategy::StructuralPattern(_) => "structural",
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            Strategy::Attribute(s)
            | Strategy::Text(s)
            | Strategy::PartialText(s)
            | Strategy::StructuralPattern(s) => s,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.payload())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("Target '{0}' has no candidate locators")]
    Empty(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    candidates: Vec<Strategy>,
}

impl Target {
    pub fn new(name: impl Into<String>, first: Strategy) -> Self {
        Self {
            name: name.into(),
            candidates: vec![first],
        }
    }

    /// Append a lower-preference alternative.
    pub fn or(mut self, next: Strategy) -> Self {
        self.candidates.push(next);
        self
    }

    pub fn from_candidates(
        name: impl Into<String>,
        candidates: Vec<Strategy>,
    ) -> Result<Self, TargetError> {
        let name = name.into();
        if candidates.is_empty() {
            return Err(TargetError::Empty(name));
        }
        Ok(Self { name, candidates })
    }

    /// Navigation-bar entry: exact link text, then a partial match on the
    /// leading characters, then any anchor containing the text ignoring case.
    pub fn nav_link(text: &str) -> Self {
        let prefix: String = text.chars().take(NAV_PARTIAL_PREFIX).collect();
        Target::new(text, Strategy::Text(text.to_string()))
            .or(Strategy::PartialText(prefix))
            .or(Strategy::StructuralPattern(anchor_containing_xpath(text)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self) -> &[Strategy] {
        &self.candidates
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Quote `text` as an XPath string literal.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }
    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Case-insensitive "anchor whose text contains" pattern.
pub fn anchor_containing_xpath(text: &str) -> String {
    format!(
        "//a[contains(translate(normalize-space(.), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), {})]",
        xpath_literal(&text.to_lowercase())
    )
}

/// Pattern equivalent of a partial link text lookup.
pub fn partial_link_xpath(fragment: &str) -> String {
    format!("//a[contains(normalize-space(.), {})]", xpath_literal(fragment))
}
