//! Glob exclusions for heuristic detection.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled exclusion patterns for one workspace.
///
/// Supports `**`, `*` and `?`. A single `*` never crosses a `/`.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    root: PathBuf,
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// Compile `patterns` for the workspace at `root`.
    ///
    /// Invalid patterns are logged and skipped.
    #[must_use]
    pub fn new(root: &Path, patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|raw| match Pattern::new(&raw.replace('\\', "/")) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %raw, error = %e, "Ignoring invalid exclusion pattern");
                    None
                }
            })
            .collect();

        Self {
            root: root.to_path_buf(),
            patterns,
        }
    }

    /// Whether detection is suppressed for `path`.
    ///
    /// Both the absolute and the workspace-relative form are tried.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let absolute = to_slashes(path);
        let relative = path
            .strip_prefix(&self.root)
            .ok()
            .map(to_slashes)
            .filter(|rel| !rel.is_empty());

        self.patterns.iter().any(|pattern| {
            pattern.matches_with(&absolute, MATCH_OPTIONS)
                || relative
                    .as_deref()
                    .is_some_and(|rel| pattern.matches_with(rel, MATCH_OPTIONS))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn to_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> ExclusionSet {
        let patterns: Vec<String> = patterns.iter().map(ToString::to_string).collect();
        ExclusionSet::new(Path::new("/ws"), &patterns)
    }

    #[test]
    fn test_double_star_matches_any_depth() {
        let excl = set(&["**/node_modules/**"]);
        assert!(excl.is_excluded(Path::new("/ws/node_modules/a.js")));
        assert!(excl.is_excluded(Path::new("/ws/pkg/node_modules/x/y/z.js")));
        assert!(!excl.is_excluded(Path::new("/ws/src/main.rs")));
    }

    #[test]
    fn test_single_star_stays_in_component() {
        let excl = set(&["*.log"]);
        assert!(excl.is_excluded(Path::new("/ws/debug.log")));
        assert!(!excl.is_excluded(Path::new("/ws/logs/debug.log")));
    }

    #[test]
    fn test_question_mark() {
        let excl = set(&["tmp?.txt"]);
        assert!(excl.is_excluded(Path::new("/ws/tmp1.txt")));
        assert!(!excl.is_excluded(Path::new("/ws/tmp12.txt")));
    }

    #[test]
    fn test_absolute_pattern() {
        let excl = set(&["/ws/generated/**"]);
        assert!(excl.is_excluded(Path::new("/ws/generated/api.rs")));
        assert!(!excl.is_excluded(Path::new("/ws/src/api.rs")));
    }

    #[test]
    fn test_path_outside_root_uses_absolute_form() {
        let excl = set(&["**/.git/**"]);
        assert!(excl.is_excluded(Path::new("/other/.git/config")));
    }

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let excl = set(&["[", "**/dist/**"]);
        assert_eq!(excl.len(), 1);
        assert!(excl.is_excluded(Path::new("/ws/dist/app.js")));
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let excl = set(&[]);
        assert!(excl.is_empty());
        assert!(!excl.is_excluded(Path::new("/ws/anything")));
    }
}
