//! Path pattern matching logic.
//!
//! # Responsibilities
//! - Parse registered prefixes into exact or subtree patterns
//! - Match request paths (case-sensitive)
//! - Normalise request paths and strip matched prefixes
//!
//! # Design Decisions
//! - A pattern ending in `/` matches its whole subtree; any other pattern
//!   matches exactly one path
//! - Among matching patterns the longest wins
//! - No regex to guarantee O(n) matching

use crate::routing::RouteError;

/// A registered URL path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches one path exactly, e.g. `/old`.
    Exact(String),
    /// Matches every path under the prefix, e.g. `/static/`.
    Subtree(String),
}

impl Pattern {
    /// Parse a registered prefix.
    pub fn parse(prefix: &str) -> Result<Self, RouteError> {
        if !prefix.starts_with('/') {
            return Err(RouteError::InvalidPattern(prefix.to_string()));
        }
        Ok(if prefix.ends_with('/') {
            Pattern::Subtree(prefix.to_string())
        } else {
            Pattern::Exact(prefix.to_string())
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Exact(p) | Pattern::Subtree(p) => p,
        }
    }

    /// Returns true if the request path falls under this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Exact(p) => path == p,
            Pattern::Subtree(p) => path.starts_with(p.as_str()),
        }
    }

    /// Specificity used to break ties between matching patterns.
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Path seen by the handler once this pattern's prefix is removed.
    ///
    /// The result is always rooted: `/static/` applied to `/static/a.css`
    /// gives `/a.css`.
    pub fn strip<'a>(&self, path: &'a str) -> std::borrow::Cow<'a, str> {
        let rest = path.strip_prefix(self.as_str()).unwrap_or(path);
        if rest.starts_with('/') {
            std::borrow::Cow::Borrowed(rest)
        } else {
            std::borrow::Cow::Owned(format!("/{rest}"))
        }
    }
}

/// Canonical form of a request path.
///
/// Removes `.` and `..` segments and repeated slashes; keeps a trailing
/// slash. The result always starts with `/`.
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in &segments {
        cleaned.push('/');
        cleaned.push_str(segment);
    }
    if cleaned.is_empty() || path.ends_with('/') {
        cleaned.push('/');
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtree_pattern() {
        let pattern = Pattern::parse("/api/").unwrap();
        assert!(pattern.matches("/api/"));
        assert!(pattern.matches("/api/v1/users"));
        assert!(!pattern.matches("/api"));
        assert!(!pattern.matches("/apix"));
    }

    #[test]
    fn test_exact_pattern() {
        let pattern = Pattern::parse("/old").unwrap();
        assert!(pattern.matches("/old"));
        assert!(!pattern.matches("/old/"));
        assert!(!pattern.matches("/older"));
    }

    #[test]
    fn test_pattern_must_be_rooted() {
        assert!(matches!(Pattern::parse("api/"), Err(RouteError::InvalidPattern(_))));
    }

    #[test]
    fn test_strip() {
        let pattern = Pattern::parse("/a/b/").unwrap();
        assert_eq!(pattern.strip("/a/b/c"), "/c");
        assert_eq!(pattern.strip("/a/b/"), "/");

        let exact = Pattern::parse("/old").unwrap();
        assert_eq!(exact.strip("/old"), "/");

        let root = Pattern::parse("/").unwrap();
        assert_eq!(root.strip("/x/y"), "/x/y");
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("/a//b"), "/a/b");
        assert_eq!(clean_path("/a/./b/"), "/a/b/");
        assert_eq!(clean_path("/a/../../b"), "/b");
        assert_eq!(clean_path("/.."), "/");
        assert_eq!(clean_path("relative/x"), "/relative/x");
    }
}
