//! Element path filters for streaming
//!
//! A small XPath subset: `//name` matches any element with that local
//! name regardless of depth; `/a/b/c` matches an exact path from the
//! root. Matching is local-name-based and position-agnostic.

use crate::error::{Error, Result};
use crate::names::is_valid_ncname;

/// A parsed element path filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    steps: Vec<String>,
    descendant: bool,
}

impl PathFilter {
    /// Parse a filter expression (`//localname` or `/a/b/c`)
    pub fn parse(expression: &str) -> Result<Self> {
        let (descendant, rest) = if let Some(rest) = expression.strip_prefix("//") {
            (true, rest)
        } else if let Some(rest) = expression.strip_prefix('/') {
            (false, rest)
        } else {
            return Err(Error::Argument(format!(
                "filter expression must start with '/' or '//': '{}'",
                expression
            )));
        };

        if rest.is_empty() {
            return Err(Error::Argument(format!(
                "filter expression has no element names: '{}'",
                expression
            )));
        }

        let steps: Vec<String> = rest.split('/').map(String::from).collect();
        for step in &steps {
            if !is_valid_ncname(step) {
                return Err(Error::Argument(format!(
                    "invalid element name '{}' in filter '{}'",
                    step, expression
                )));
            }
        }

        Ok(Self { steps, descendant })
    }

    /// Check whether the current element path (root-first local names)
    /// matches this filter
    pub fn matches(&self, path: &[String]) -> bool {
        if self.descendant {
            path.len() >= self.steps.len()
                && path[path.len() - self.steps.len()..]
                    .iter()
                    .zip(&self.steps)
                    .all(|(a, b)| a == b)
        } else {
            path.len() == self.steps.len() && path.iter().zip(&self.steps).all(|(a, b)| a == b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_descendant_filter() {
        let filter = PathFilter::parse("//envelope").unwrap();
        assert!(filter.matches(&path(&["envelope"])));
        assert!(filter.matches(&path(&["collection", "member", "envelope"])));
        assert!(!filter.matches(&path(&["collection", "member"])));
    }

    #[test]
    fn test_descendant_multi_step() {
        let filter = PathFilter::parse("//member/envelope").unwrap();
        assert!(filter.matches(&path(&["collection", "member", "envelope"])));
        assert!(!filter.matches(&path(&["collection", "envelope"])));
    }

    #[test]
    fn test_absolute_filter() {
        let filter = PathFilter::parse("/collection/member").unwrap();
        assert!(filter.matches(&path(&["collection", "member"])));
        assert!(!filter.matches(&path(&["collection", "member", "envelope"])));
        assert!(!filter.matches(&path(&["member"])));
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(PathFilter::parse("envelope").is_err());
        assert!(PathFilter::parse("//").is_err());
        assert!(PathFilter::parse("//not a name").is_err());
    }
}
