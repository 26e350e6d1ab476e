#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Pattern search and child inspection over a parsed configuration.
//!
//! Everything here is textual: a statement "contains" a setting when one of
//! its child lines reads exactly that text. No attempt is made to understand
//! what the configuration means.

use std::fmt;

use regex::{Regex, RegexBuilder};

use super::parser::{ConfigDocument, Statement};

/// Errors raised while building a query.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// The pattern could not be compiled.
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Pattern as written.
        pattern: String,
        /// Compiler error.
        #[source]
        source:  regex::Error,
    },
}

/// A start-anchored regular expression matched against statement text.
#[derive(Clone)]
pub struct Pattern {
    /// Pattern as written, before anchoring.
    source: String,
    /// Compiled, anchored expression.
    regex:  Regex,
}

impl Pattern {
    /// Compiles a case-sensitive pattern anchored at the start of the text.
    pub fn new(pattern: &str) -> Result<Self, QueryError> {
        Self::build(pattern, false)
    }

    /// Compiles a case-insensitive pattern anchored at the start of the text.
    pub fn case_insensitive(pattern: &str) -> Result<Self, QueryError> {
        Self::build(pattern, true)
    }

    /// Matches exactly `text`, nothing more.
    pub fn exact(text: &str) -> Result<Self, QueryError> {
        Self::new(&format!("{}$", regex::escape(text)))
    }

    /// Matches `text` followed by whitespace or the end of the line.
    pub fn words(text: &str) -> Result<Self, QueryError> {
        Self::new(&format!(r"{}(?:\s|$)", regex::escape(text)))
    }

    /// Shared constructor.
    fn build(pattern: &str, ignore_case: bool) -> Result<Self, QueryError> {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})"))
            .case_insensitive(ignore_case)
            .build()
            .map_err(|source| QueryError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Whether `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Returns capture group `index` of the first match, if any.
    pub fn capture<'t>(&self, text: &'t str, index: usize) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(index))
            .map(|m| m.as_str())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl ConfigDocument {
    /// Top-level statements matching `pattern`, in source order.
    pub fn find_top_level(&self, pattern: &Pattern) -> Vec<Statement<'_>> {
        self.top_level()
            .filter(|stmt| pattern.is_match(stmt.text()))
            .collect()
    }

    /// First top-level statement matching `pattern`.
    pub fn first_top_level(&self, pattern: &Pattern) -> Option<Statement<'_>> {
        self.top_level().find(|stmt| pattern.is_match(stmt.text()))
    }

    /// Whether some top-level statement reads exactly `line`.
    pub fn has_top_level_line(&self, line: &str) -> bool {
        self.top_level().any(|stmt| stmt.text() == line)
    }
}

impl<'a> Statement<'a> {
    /// Text of the immediate children, in order.
    pub fn children_text(&self) -> Vec<&'a str> {
        self.children().map(|child| child.text()).collect()
    }

    /// First immediate child matching `pattern`.
    pub fn find_child(&self, pattern: &Pattern) -> Option<Statement<'a>> {
        self.children().find(|child| pattern.is_match(child.text()))
    }

    /// Whether an immediate child reads exactly `literal`.
    pub fn contains_among_children(&self, literal: &str) -> bool {
        self.children().any(|child| child.text() == literal)
    }

    /// Whether an immediate child contains `fragment` anywhere in its text.
    pub fn any_child_contains(&self, fragment: &str) -> bool {
        self.children().any(|child| child.text().contains(fragment))
    }

    /// First immediate child whose text starts with `prefix`.
    pub fn child_starting_with(&self, prefix: &str) -> Option<Statement<'a>> {
        self.children()
            .find(|child| child.text().starts_with(prefix))
    }
}
