//! Size-bounded directory of synthesized clips.
//!
//! Eviction is oldest-first by modification time. There is no access
//! tracking, and a clip that is still being sent can be deleted under it.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use uuid::Uuid;

pub const AUDIO_EXTENSION: &str = "wav";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// One synthesized clip on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempAudioFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

/// Result of an eviction or clear pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreReport {
    pub before_bytes: u64,
    pub after_bytes: u64,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl StoreReport {
    pub fn before_mb(&self) -> f64 {
        bytes_to_mb(self.before_bytes)
    }

    pub fn after_mb(&self) -> f64 {
        bytes_to_mb(self.after_bytes)
    }
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

/// Recursively sum file sizes under `path`.
///
/// Entries that vanish or can't be stat'ed mid-scan count as zero, and a
/// missing directory has size zero.
pub fn directory_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let entry_path = entry.path();
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => directory_size(&entry_path),
                Ok(_) => entry.metadata().map(|m| m.len()).unwrap_or(0),
                Err(_) => 0,
            }
        })
        .sum()
}

pub struct TempStore {
    dir: PathBuf,
    max_size_mb: u64,
    counter: AtomicU64,
}

impl TempStore {
    pub fn new(dir: impl Into<PathBuf>, max_size_mb: u64) -> Self {
        Self {
            dir: dir.into(),
            max_size_mb,
            counter: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_size_mb(&self) -> u64 {
        self.max_size_mb
    }

    fn budget_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create temp dir: {}", self.dir.display()))
    }

    pub fn size(&self) -> u64 {
        directory_size(&self.dir)
    }

    /// List clips in the store, oldest first.
    ///
    /// Only the top level is scanned. Anything named `*.wav` is included, so a
    /// stray directory with that suffix shows up here and fails to delete.
    /// A missing store directory has no clips.
    pub fn list_clips(&self) -> Result<Vec<TempAudioFile>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read temp dir: {}", self.dir.display()))
            }
        };

        let mut clips: Vec<TempAudioFile> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().extension().and_then(|e| e.to_str()) == Some(AUDIO_EXTENSION)
            })
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                Some(TempAudioFile {
                    path: entry.path(),
                    modified: meta.modified().ok()?,
                    size: meta.len(),
                })
            })
            .collect();

        clips.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        Ok(clips)
    }

    /// Delete oldest clips until the store fits its budget.
    ///
    /// Size is re-measured after every deletion. A clip that fails to delete
    /// is logged and skipped. Files that aren't clips, and clips that won't
    /// delete, can leave the store over budget; nothing is truncated.
    pub fn enforce_budget(&self) -> Result<StoreReport> {
        let budget = self.budget_bytes();
        let before = self.size();
        let mut report = StoreReport {
            before_bytes: before,
            after_bytes: before,
            ..Default::default()
        };

        if before <= budget {
            return Ok(report);
        }

        tracing::info!(
            "Temp dir {:.2}MB exceeds limit {}MB, evicting oldest clips...",
            bytes_to_mb(before),
            self.max_size_mb
        );

        for clip in self.list_clips()? {
            if self.size() <= budget {
                break;
            }
            match fs::remove_file(&clip.path) {
                Ok(()) => {
                    tracing::info!("Removed temp clip: {}", clip.path.display());
                    report.removed.push(clip.path);
                }
                Err(e) => {
                    tracing::error!("Failed to remove temp clip {}: {}", clip.path.display(), e);
                    report.failed.push(clip.path);
                }
            }
        }

        report.after_bytes = self.size();
        tracing::info!("Eviction done, temp dir now {:.2}MB", report.after_mb());
        Ok(report)
    }

    /// Delete every clip regardless of budget.
    pub fn clear_all(&self) -> Result<StoreReport> {
        let mut report = StoreReport {
            before_bytes: self.size(),
            ..Default::default()
        };

        for clip in self.list_clips()? {
            match fs::remove_file(&clip.path) {
                Ok(()) => report.removed.push(clip.path),
                Err(e) => {
                    tracing::error!("Failed to remove temp clip {}: {}", clip.path.display(), e);
                    report.failed.push(clip.path);
                }
            }
        }

        report.after_bytes = self.size();
        Ok(report)
    }

    /// Fresh clip path: `<prefix>_<unix millis>_<digest>_<seq>.wav`.
    ///
    /// The digest is a UUID v5 of the text, so it is stable across restarts;
    /// the sequence number separates identical texts in the same millisecond.
    pub fn allocate_path(&self, prefix: &str, text: &str) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, text.as_bytes()).simple().to_string();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("{}_{}_{}_{}.{}", prefix, millis, &digest[..8], seq, AUDIO_EXTENSION))
    }

    /// Persist a synthesized clip and return its path.
    pub async fn write_clip(&self, prefix: &str, text: &str, audio: &[u8]) -> Result<PathBuf> {
        let path = self.allocate_path(prefix, text);
        tokio::fs::write(&path, audio)
            .await
            .with_context(|| format!("Failed to write clip: {}", path.display()))?;
        Ok(path)
    }
}
