// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Rule matching
//!
//! Rules are tried in precedence order. For each rule the extension, then the
//! content type, then the keywords are checked; the first rule with any hit
//! wins. The result depends only on the file name and the configuration.

use std::path::Path;

use crate::content_type::{dotted_extension, ContentTypes};
use crate::rules::{Rule, RuleSet};

/// Which criterion selected a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Extension,
    ContentType,
    Keyword,
}

/// A successful classification
#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    pub rule: &'a Rule,
    pub matched_by: MatchKind,
}

impl Classification<'_> {
    pub fn folder(&self) -> &Path {
        &self.rule.folder
    }
}

/// Maps a file name to a destination folder using a [`RuleSet`]
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleSet,
    content_types: ContentTypes,
}

impl Classifier {
    pub fn new(rules: RuleSet, content_types: ContentTypes) -> Self {
        Self {
            rules,
            content_types,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify a path, or `None` when no rule matches
    pub fn classify(&self, path: &Path) -> Option<Classification<'_>> {
        let file_name = path.file_name()?.to_string_lossy().to_lowercase();
        let extension = dotted_extension(path);
        let content_type = self.content_types.resolve(path);

        self.rules.iter().find_map(|rule| {
            Self::match_rule(rule, extension.as_deref(), content_type, &file_name)
                .map(|matched_by| Classification { rule, matched_by })
        })
    }

    fn match_rule(
        rule: &Rule,
        extension: Option<&str>,
        content_type: Option<&str>,
        file_name: &str,
    ) -> Option<MatchKind> {
        if let Some(ext) = extension {
            if rule.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                return Some(MatchKind::Extension);
            }
        }

        if let Some(ty) = content_type {
            if rule.content_types.iter().any(|prefix| ty.starts_with(prefix.as_str())) {
                return Some(MatchKind::ContentType);
            }
        }

        if rule.keywords.iter().any(|k| file_name.contains(k.as_str())) {
            return Some(MatchKind::Keyword);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn classifier(rules: Vec<Rule>) -> Classifier {
        Classifier::new(rules.into_iter().collect(), ContentTypes::default())
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let c = classifier(vec![Rule::new("images", "out/img").with_extensions(&[".jpg"])]);
        let hit = c.classify(Path::new("/watch/photo.JPG")).unwrap();
        assert_eq!(hit.folder(), Path::new("out/img"));
        assert_eq!(hit.matched_by, MatchKind::Extension);
    }

    #[test]
    fn test_earlier_rule_wins_on_shared_extension() {
        let c = classifier(vec![
            Rule::new("first", "one").with_extensions(&[".pdf"]),
            Rule::new("second", "two").with_extensions(&[".pdf"]),
        ]);
        assert_eq!(c.classify(Path::new("a.pdf")).unwrap().rule.category, "first");
    }

    #[test]
    fn test_earlier_rule_wins_even_by_weaker_criterion() {
        // Keyword in the first rule beats an extension in the second.
        let c = classifier(vec![
            Rule::new("finance", "fin").with_keywords(&["Invoice"]),
            Rule::new("documents", "docs").with_extensions(&[".pdf"]),
        ]);
        let hit = c.classify(Path::new("march_INVOICE.pdf")).unwrap();
        assert_eq!(hit.rule.category, "finance");
        assert_eq!(hit.matched_by, MatchKind::Keyword);
    }

    #[test]
    fn test_content_type_prefix_match() {
        let c = classifier(vec![Rule::new("video", "vid").with_content_types(&["video/"])]);
        let hit = c.classify(Path::new("clip.webm")).unwrap();
        assert_eq!(hit.matched_by, MatchKind::ContentType);
    }

    #[test]
    fn test_content_type_override_is_consulted() {
        let mut overrides = BTreeMap::new();
        overrides.insert(".dmg".to_string(), "application/x-apple-diskimage".to_string());
        let c = Classifier::new(
            [Rule::new("programs", "prog").with_content_types(&["application/x-apple"])]
                .into_iter()
                .collect(),
            ContentTypes::new(&overrides),
        );
        assert!(c.classify(Path::new("Installer.dmg")).is_some());
    }

    #[test]
    fn test_no_match() {
        let c = classifier(vec![
            Rule::new("images", "img")
                .with_extensions(&[".png"])
                .with_content_types(&["image/"]),
            Rule::new("empty", "never"),
        ]);
        assert!(c.classify(&PathBuf::from("notes.xyz")).is_none());
        assert!(c.classify(Path::new("README")).is_none());
    }
}
