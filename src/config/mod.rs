// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for autosort

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::rules::{normalize_extension, Rule, RuleSet};
use crate::{Result, SorterError};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SorterConfig {
    /// Directory to watch
    pub watch_folder: PathBuf,

    /// Sort rules, in match precedence order
    pub sort_rules: RuleSet,

    /// Write log lines to `log_file` instead of stdout
    #[serde(default)]
    pub enable_logging: bool,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Report moves without touching the filesystem
    #[serde(default)]
    pub dry_run: bool,

    /// Glob patterns matched against the base file name
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Extension to content type, consulted before the built-in table
    #[serde(default)]
    pub custom_mime_map: BTreeMap<String, String>,

    /// Cap on per-file pipelines running at once
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Wait applied to live events before the stability check
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Delay between size samples
    #[serde(default = "default_stability_delay_ms")]
    pub stability_delay_ms: u64,

    /// Number of size samples; all must agree
    #[serde(default = "default_stability_samples")]
    pub stability_samples: u32,
}

// Default value functions
fn default_log_file() -> PathBuf { PathBuf::from("./auto-sort.log") }
fn default_max_concurrent_tasks() -> usize { 8 }
fn default_settle_delay_ms() -> u64 { 100 }
fn default_stability_delay_ms() -> u64 { 50 }
fn default_stability_samples() -> u32 { 2 }

fn default_rules() -> RuleSet {
    [
        Rule::new("images", "./Downloads/Images")
            .with_extensions(&[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".ico"])
            .with_content_types(&["image/"]),
        Rule::new("videos", "./Downloads/Videos")
            .with_extensions(&[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v"])
            .with_content_types(&["video/"]),
        Rule::new("audio", "./Downloads/Audio")
            .with_extensions(&[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a"])
            .with_content_types(&["audio/"]),
        Rule::new("archives", "./Downloads/Archives")
            .with_extensions(&[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"])
            .with_content_types(&["application/zip", "application/x-rar"]),
        Rule::new("executables", "./Downloads/Programs")
            .with_extensions(&[".exe", ".msi", ".deb", ".rpm", ".dmg", ".pkg", ".appx"])
            .with_content_types(&["application/x-executable", "application/x-msdos-program"]),
        Rule::new("code", "./Downloads/Code")
            .with_extensions(&[
                ".go", ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".h", ".php", ".rb",
                ".rs",
            ])
            .with_content_types(&["text/x-go", "text/x-python", "text/javascript"]),
        // Last: "text/" would otherwise claim source files.
        Rule::new("documents", "./Downloads/Documents")
            .with_extensions(&[
                ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx",
            ])
            .with_content_types(&["application/pdf", "application/msword", "text/"]),
    ]
    .into_iter()
    .collect()
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            watch_folder: PathBuf::from("./Downloads"),
            sort_rules: default_rules(),
            enable_logging: true,
            log_file: default_log_file(),
            dry_run: false,
            ignore_patterns: vec!["*.tmp".to_string(), "*.part".to_string(), ".*".to_string()],
            custom_mime_map: [
                (".dmg", "application/x-apple-diskimage"),
                (".deb", "application/x-debian-package"),
                (".rpm", "application/x-rpm"),
                (".appx", "application/appx"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            settle_delay_ms: default_settle_delay_ms(),
            stability_delay_ms: default_stability_delay_ms(),
            stability_samples: default_stability_samples(),
        }
    }
}

impl SorterConfig {
    /// Load configuration from a JSON file, writing the defaults there first
    /// if no file exists
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found at {:?}, writing defaults", path);
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }
        Self::load(path)
    }

    /// Load configuration from an existing JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SorterError::Config(format!("Failed to read {:?}: {}", path, e)))?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| SorterError::Config(format!("Failed to parse config: {}", e)))?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn normalize(&mut self) {
        self.custom_mime_map = std::mem::take(&mut self.custom_mime_map)
            .into_iter()
            .filter_map(|(ext, ty)| normalize_extension(&ext).map(|e| (e, ty)))
            .collect();
    }

    /// Check invariants the sorter relies on
    pub fn validate(&self) -> Result<()> {
        if self.watch_folder.as_os_str().is_empty() {
            return Err(SorterError::Config("watch_folder must not be empty".to_string()));
        }
        for rule in self.sort_rules.iter() {
            if rule.folder.as_os_str().is_empty() {
                return Err(SorterError::Config(format!(
                    "rule '{}' has an empty folder",
                    rule.category
                )));
            }
            if rule.is_inert() {
                warn!("Rule '{}' has no extensions, mime types or keywords and will never match", rule.category);
            }
        }
        if self.max_concurrent_tasks == 0 {
            return Err(SorterError::Config("max_concurrent_tasks must be at least 1".to_string()));
        }
        if self.stability_samples < 2 {
            return Err(SorterError::Config("stability_samples must be at least 2".to_string()));
        }
        for pattern in &self.ignore_patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                SorterError::Config(format!("invalid ignore pattern '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn stability_delay(&self) -> Duration {
        Duration::from_millis(self.stability_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = SorterConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.sort_rules.len(), 7);

        let reloaded = SorterConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded.sort_rules, config.sort_rules);
        assert_eq!(reloaded.ignore_patterns, config.ignore_patterns);
    }

    #[test]
    fn test_defaults_cover_expected_categories() {
        let config = SorterConfig::default();
        for category in ["images", "documents", "videos", "audio", "archives", "executables", "code"] {
            assert!(config.sort_rules.get(category).is_some(), "missing {}", category);
        }
        config.validate().unwrap();
    }

    #[test]
    fn test_minimal_file_uses_field_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "watch_folder": "/tmp/in",
                "sort_rules": { "pics": { "folder": "/tmp/pics", "extension": [".png"] } },
                "custom_mime_map": { "DMG": "application/x-apple-diskimage" }
            }"#,
        )
        .unwrap();

        let config = SorterConfig::load(&path).unwrap();
        assert!(!config.dry_run);
        assert_eq!(config.max_concurrent_tasks, 8);
        assert_eq!(config.stability_samples, 2);
        assert!(config.custom_mime_map.contains_key(".dmg"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SorterConfig::load(&path), Err(SorterError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = SorterConfig::default();
        config.ignore_patterns.push("[".to_string());
        assert!(config.validate().is_err());

        let mut config = SorterConfig::default();
        config.sort_rules.insert(Rule::new("blank", ""));
        assert!(config.validate().is_err());

        let config = SorterConfig {
            stability_samples: 1,
            ..SorterConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
