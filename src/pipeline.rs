// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-file pipeline: ignore check, stability wait, classification, move

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::config::SorterConfig;
use crate::content_type::ContentTypes;
use crate::ignore::IgnoreList;
use crate::mover::{MoveExecutor, MoveOutcome, SkipReason};
use crate::stability::{Stability, StabilityDetector};
use crate::Result;

/// One file awaiting processing, owned by the task handling it
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub id: Uuid,
    pub path: PathBuf,
    pub discovered_at: DateTime<Utc>,
}

impl PendingFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            discovered_at: Utc::now(),
        }
    }
}

/// Read-only components shared by every per-file task
#[derive(Debug, Clone)]
pub struct Pipeline {
    ignore: IgnoreList,
    stability: StabilityDetector,
    classifier: Classifier,
    mover: MoveExecutor,
}

impl Pipeline {
    pub fn new(
        ignore: IgnoreList,
        stability: StabilityDetector,
        classifier: Classifier,
        mover: MoveExecutor,
    ) -> Self {
        Self {
            ignore,
            stability,
            classifier,
            mover,
        }
    }

    /// Build every stage from a loaded configuration
    pub fn from_config(config: &SorterConfig) -> Result<Self> {
        Ok(Self::new(
            IgnoreList::new(config.ignore_patterns.as_slice())?,
            StabilityDetector::new(config.stability_delay(), config.stability_samples),
            Classifier::new(
                config.sort_rules.clone(),
                ContentTypes::new(&config.custom_mime_map),
            ),
            MoveExecutor::new(config.dry_run),
        ))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Cheap name-only check, usable before a task is spawned
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.is_ignored(path)
    }

    /// Run one file through every stage and log the outcome
    pub async fn process(&self, file: PendingFile) -> MoveOutcome {
        let span = tracing::info_span!(
            "file",
            id = %file.id,
            path = ?file.path,
            discovered = %file.discovered_at.format("%H:%M:%S%.3f")
        );
        let outcome = self.run(&file).instrument(span.clone()).await;
        span.in_scope(|| outcome.log());
        outcome
    }

    async fn run(&self, file: &PendingFile) -> MoveOutcome {
        let path = file.path.as_path();

        if self.ignore.is_ignored(path) {
            return MoveOutcome::skipped(path, SkipReason::Ignored);
        }

        match self.stability.check(path).await {
            Stability::Stable { size } => debug!("Stable at {} bytes", size),
            Stability::Growing => return MoveOutcome::skipped(path, SkipReason::Unstable),
            Stability::Vanished => return MoveOutcome::skipped(path, SkipReason::SourceVanished),
            Stability::NotAFile => return MoveOutcome::skipped(path, SkipReason::NotAFile),
        }

        let Some(hit) = self.classifier.classify(path) else {
            return MoveOutcome::skipped(path, SkipReason::NoMatchingRule);
        };
        debug!("Matched rule '{}' by {:?}", hit.rule.category, hit.matched_by);

        self.mover.execute(path, hit.folder()).await
    }
}
