// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Write-completion detection by size sampling

use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Result of a stability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    /// Every sample saw the same size
    Stable { size: u64 },
    /// The size changed between samples
    Growing,
    /// The path could not be stat'ed at some sample
    Vanished,
    /// The path is not a regular file
    NotAFile,
}

impl Stability {
    pub fn is_stable(&self) -> bool {
        matches!(self, Stability::Stable { .. })
    }
}

/// Samples a file's size with a fixed delay between samples
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    delay: Duration,
    samples: u32,
}

impl StabilityDetector {
    /// `samples` is clamped to at least two
    pub fn new(delay: Duration, samples: u32) -> Self {
        Self {
            delay,
            samples: samples.max(2),
        }
    }

    pub async fn is_stable(&self, path: &Path) -> bool {
        self.check(path).await.is_stable()
    }

    /// Only this task sleeps; nothing is held across the delay
    pub async fn check(&self, path: &Path) -> Stability {
        let mut last_size = match Self::sample(path).await {
            Ok(size) => size,
            Err(state) => return state,
        };

        for _ in 1..self.samples {
            tokio::time::sleep(self.delay).await;

            let size = match Self::sample(path).await {
                Ok(size) => size,
                Err(state) => return state,
            };
            if size != last_size {
                debug!("File {:?} still being written, size: {}", path, size);
                return Stability::Growing;
            }
            last_size = size;
        }

        Stability::Stable { size: last_size }
    }

    async fn sample(path: &Path) -> Result<u64, Stability> {
        match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => Ok(m.len()),
            Ok(_) => Err(Stability::NotAFile),
            Err(_) => Err(Stability::Vanished),
        }
    }
}

impl Default for StabilityDetector {
    fn default() -> Self {
        Self::new(Duration::from_millis(50), 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_constant_size_is_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("done.bin");
        std::fs::write(&path, b"complete").unwrap();

        let detector = StabilityDetector::new(Duration::from_millis(20), 3);
        assert_eq!(detector.check(&path).await, Stability::Stable { size: 8 });
    }

    #[tokio::test]
    async fn test_growing_file_is_unstable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("growing.bin");
        std::fs::write(&path, b"part").unwrap();

        let detector = StabilityDetector::new(Duration::from_millis(300), 2);
        let writer_path = path.clone();
        let writer = async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&writer_path)
                .unwrap();
            file.write_all(b" more bytes").unwrap();
        };

        let (state, ()) = tokio::join!(detector.check(&path), writer);
        assert_eq!(state, Stability::Growing);
    }

    #[tokio::test]
    async fn test_missing_file_is_vanished() {
        let dir = TempDir::new().unwrap();
        let detector = StabilityDetector::default();
        assert_eq!(detector.check(&dir.path().join("gone")).await, Stability::Vanished);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let detector = StabilityDetector::default();
        assert_eq!(detector.check(dir.path()).await, Stability::NotAFile);
        assert!(!detector.is_stable(dir.path()).await);
    }
}
