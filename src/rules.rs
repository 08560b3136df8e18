// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Sort rules and the ordered rule set
//!
//! A [`RuleSet`] is keyed by category but iterates in insertion order, which is
//! also the match precedence. On disk it is a JSON object; entries are read and
//! written in document order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// A named policy mapping match criteria to a destination folder
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rule {
    /// Category name, taken from the map key
    #[serde(skip)]
    pub category: String,

    /// Destination folder
    pub folder: PathBuf,

    /// Extensions, lower-case with a leading dot
    #[serde(default, rename = "extension", alias = "extensions")]
    pub extensions: Vec<String>,

    /// Content-type prefixes such as `image/`
    #[serde(default, rename = "mime_types")]
    pub content_types: Vec<String>,

    /// Filename substrings, lower-case
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Rule {
    /// Create an empty rule for a category
    pub fn new(category: impl Into<String>, folder: impl Into<PathBuf>) -> Self {
        Self {
            category: category.into(),
            folder: folder.into(),
            extensions: Vec::new(),
            content_types: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self.normalize();
        self
    }

    pub fn with_content_types(mut self, prefixes: &[&str]) -> Self {
        self.content_types = prefixes.iter().map(|p| p.to_string()).collect();
        self.normalize();
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self.normalize();
        self
    }

    /// True when no criterion is set, so the rule can never match
    pub fn is_inert(&self) -> bool {
        self.extensions.is_empty() && self.content_types.is_empty() && self.keywords.is_empty()
    }

    /// Canonicalize match lists: lower-case, dotted extensions, no empty entries
    pub fn normalize(&mut self) {
        self.extensions = self
            .extensions
            .iter()
            .filter_map(|e| normalize_extension(e))
            .collect();
        self.content_types.retain(|p| !p.trim().is_empty());
        self.keywords = self
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
    }
}

/// Lower-case an extension and make sure it starts with a dot
pub fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(format!(".{}", ext.to_lowercase()))
    }
}

/// Ordered collection of rules, keyed by category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. A rule with an existing category replaces it in place,
    /// keeping the original precedence slot.
    pub fn insert(&mut self, rule: Rule) {
        match self.rules.iter_mut().find(|r| r.category == rule.category) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Look up a rule by category
    pub fn get(&self, category: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.category == category)
    }

    /// Rules in precedence order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Category names in precedence order
    pub fn categories(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.category.as_str()).collect()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut set = Self::new();
        for rule in iter {
            set.insert(rule);
        }
        set
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(&rule.category, rule)?;
        }
        map.end()
    }
}

struct RuleSetVisitor;

impl<'de> Visitor<'de> for RuleSetVisitor {
    type Value = RuleSet;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of category to sort rule")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RuleSet, A::Error> {
        let mut set = RuleSet::new();
        while let Some((category, mut rule)) = access.next_entry::<String, Rule>()? {
            rule.category = category;
            rule.normalize();
            set.insert(rule);
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RuleSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_order_is_preserved() {
        let json = r#"{
            "zeta": { "folder": "z", "extension": [".z"] },
            "alpha": { "folder": "a", "extension": [".a"] },
            "mid": { "folder": "m", "keywords": ["M"] }
        }"#;
        let set: RuleSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.categories(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(set.get("mid").unwrap().keywords, vec!["m"]);
    }

    #[test]
    fn test_round_trip_keeps_order_and_key_names() {
        let set: RuleSet = [
            Rule::new("b", "out/b").with_extensions(&[".b"]),
            Rule::new("a", "out/a").with_content_types(&["text/"]),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&set).unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
        assert!(json.contains("\"extension\""));
        assert!(json.contains("\"mime_types\""));

        let back: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_extensions_alias_and_normalization() {
        let json = r#"{ "pics": { "folder": "p", "extensions": ["JPG", ".Png", ""] } }"#;
        let set: RuleSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.get("pics").unwrap().extensions, vec![".jpg", ".png"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = RuleSet::new();
        set.insert(Rule::new("one", "1"));
        set.insert(Rule::new("two", "2"));
        set.insert(Rule::new("one", "uno"));
        assert_eq!(set.categories(), vec!["one", "two"]);
        assert_eq!(set.get("one").unwrap().folder, PathBuf::from("uno"));
    }

    #[test]
    fn test_inert_rule() {
        assert!(Rule::new("empty", "e").is_inert());
        assert!(!Rule::new("kw", "k").with_keywords(&["invoice"]).is_inert());
    }
}
