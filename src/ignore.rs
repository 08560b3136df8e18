// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ignore rules, checked before any filesystem access

use glob::Pattern;
use std::path::Path;

use crate::Result;

/// Configured glob patterns plus the baseline ignores
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    patterns: Vec<Pattern>,
}

impl IgnoreList {
    /// Compile the configured patterns
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// True if the file must never reach classification
    pub fn is_ignored(&self, path: &Path) -> bool {
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy(),
            None => return true,
        };

        // Hidden and temporary files, regardless of configuration
        if name.starts_with('.') || name.ends_with(".tmp") {
            return true;
        }

        self.patterns.iter().any(|p| p.matches(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_ignores_without_patterns() {
        let ignore = IgnoreList::default();
        assert!(ignore.is_ignored(Path::new("/w/.DS_Store")));
        assert!(ignore.is_ignored(Path::new("/w/build.tmp")));
        assert!(!ignore.is_ignored(Path::new("/w/build.TMP.txt")));
        assert!(!ignore.is_ignored(Path::new("/w/photo.jpg")));
    }

    #[test]
    fn test_patterns_match_base_name_only() {
        let ignore = IgnoreList::new(&["*.part", "draft-*"]).unwrap();
        assert!(ignore.is_ignored(Path::new("/downloads/movie.mkv.part")));
        assert!(ignore.is_ignored(Path::new("/downloads/draft-1.docx")));
        assert!(!ignore.is_ignored(Path::new("/draft-dir/final.docx")));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(IgnoreList::new(&["[unclosed"]).is_err());
    }
}
