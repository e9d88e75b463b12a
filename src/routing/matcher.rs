//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against a prefix on segment boundaries
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/api/movies` matches `/api/movies` and `/api/movies/...`, never
//!   `/api/moviesextra`
//! - `/` is the universal prefix
//! - No regex to guarantee O(n) matching

/// A normalized path prefix with segment-boundary semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefix {
    prefix: String,
}

impl PathPrefix {
    /// Create a prefix. A trailing slash (other than the root) is dropped, so
    /// `/api/movies/` and `/api/movies` are the same rule.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        let prefix = if trimmed.is_empty() && prefix.starts_with('/') {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        Self { prefix }
    }

    /// True if this prefix matches every path.
    pub fn is_universal(&self) -> bool {
        self.prefix == "/"
    }

    /// True if the prefix is rooted at `/`.
    pub fn is_absolute(&self) -> bool {
        self.prefix.starts_with('/')
    }

    /// Returns true if `path` equals the prefix or continues with `/` right
    /// after it.
    pub fn matches(&self, path: &str) -> bool {
        if self.is_universal() {
            return true;
        }

        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// True if every path matched by `other` is also matched by `self`.
    pub fn covers(&self, other: &PathPrefix) -> bool {
        self.matches(&other.prefix)
    }
}

impl std::fmt::Display for PathPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prefix)
    }
}
