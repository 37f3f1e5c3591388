//! Deny-list for paths served from a directory.
//!
//! A path is denied when any of its segments matches any configured glob pattern,
//! so `.git` blocks `/.git/config` as well as `/sub/.git/HEAD`.
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, Default)]
pub struct DenyList {
    patterns: Vec<Pattern>,
}

impl DenyList {
    /// Build from a comma-separated pattern list. Invalid patterns are logged and skipped.
    pub fn parse(list: &str) -> Self {
        let patterns = list
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .filter_map(|raw| match Pattern::new(raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("Ignoring invalid deny pattern '{}': {}", raw, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether a single path segment (a file or directory name) is denied.
    pub fn denies_segment(&self, segment: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(segment, MATCH_OPTIONS))
    }

    /// Whether any `/`-separated segment of `path` is denied.
    pub fn is_denied(&self, path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .any(|segment| self.denies_segment(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_never_denies() {
        let deny = DenyList::parse("");
        assert!(deny.is_empty());
        assert!(!deny.is_denied("/.git/config"));
        assert!(!deny.is_denied("/"));
    }

    #[test]
    fn test_any_segment_matching_any_pattern_is_denied() {
        let deny = DenyList::parse(".git, *.key ,secret*");
        assert_eq!(deny.len(), 3);

        assert!(deny.is_denied("/.git/config"));
        assert!(deny.is_denied("/project/.git/HEAD"));
        assert!(deny.is_denied("/certs/server.key"));
        assert!(deny.is_denied("/secrets/readme.txt"));
        assert!(!deny.is_denied("/index.html"));
        assert!(!deny.is_denied("/keys/public.pem"));
        assert!(!deny.is_denied("/gitignore"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let deny = DenyList::parse(".env");
        assert!(deny.is_denied("/.env"));
        assert!(!deny.is_denied("/.ENV"));
    }

    #[test]
    fn test_wildcard_does_not_cross_segments() {
        let deny = DenyList::parse("a*b");
        assert!(deny.is_denied("/axxb"));
        assert!(!deny.is_denied("/a/b"));
    }

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let deny = DenyList::parse("[, .git,,");
        assert_eq!(deny.len(), 1);
        assert!(deny.is_denied("/.git"));
    }
}
