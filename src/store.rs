//! JSON feed-list store.
//!
//! The whole configuration lives in one human-editable JSON document:
//! a list of feeds plus the time of the last completed check. Loading is
//! strict at the document level (a file that is not valid JSON aborts the
//! run — there is nothing to reconcile) but forgiving at the field level:
//! any key a hand-edited entry omits is backfilled with its default.
//!
//! Saving replaces the file atomically via write-temp-then-rename, so a
//! crash mid-save can never leave a half-written feed list behind.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reconcile::Watermark;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    /// The feeds file does not exist yet.
    #[error("no feeds file found at {0}")]
    NotFound(String),

    /// The feeds file exists but is not a valid feed-list document.
    #[error("feeds file is not valid JSON: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("failed to access feeds file: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Data Model
// ============================================================================

/// How urgently a feed's news matters to the user. Informational grouping
/// only — every configured feed is checked on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Immediate,
    #[default]
    Daily,
    Weekly,
}

/// One monitored feed as recorded in the feeds file.
///
/// Only `url` is meaningful to provide by hand; everything else is either
/// cosmetic (`class`, `urgency`) or maintained by the tool (`title` is
/// refreshed from the feed each run, `home_url` backfilled once,
/// `watermark` advanced after each successful check).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub home_url: Option<String>,
    pub title: String,
    /// Free-form grouping label, e.g. "news" or "webcomics".
    pub class: String,
    pub urgency: Urgency,
    pub watermark: Watermark,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            home_url: None,
            title: String::new(),
            class: String::new(),
            urgency: Urgency::default(),
            watermark: Watermark::None,
        }
    }
}

impl FeedConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Root of the feeds file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedList {
    pub feeds: Vec<FeedConfig>,
    /// When the last completed check finished. Stamped only after a run
    /// has fully reconciled and is about to persist.
    pub last_check: Option<DateTime<Utc>>,
}

// ============================================================================
// Load / Save
// ============================================================================

/// Load the feed list from `path`.
///
/// A missing or malformed file is an error for the caller to surface —
/// unlike a single broken feed, a broken feed LIST leaves nothing to work
/// with. Individual feeds with an empty or unparseable URL are tolerated
/// here (they fault at fetch time) but warned about so the user can fix
/// the entry.
pub fn load(path: &Path) -> Result<FeedList, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(StoreError::Io(e)),
    };

    let list: FeedList = serde_json::from_str(&content)?;

    for (index, feed) in list.feeds.iter().enumerate() {
        if feed.url.trim().is_empty() {
            tracing::warn!(index = index, "Feed entry has no URL and will be skipped");
        } else if url::Url::parse(&feed.url).is_err() {
            tracing::warn!(index = index, url = %feed.url, "Feed URL does not parse");
        }
    }

    tracing::debug!(
        path = %path.display(),
        feeds = list.feeds.len(),
        "Loaded feed list"
    );
    Ok(list)
}

/// Persist the feed list to `path`, atomically.
///
/// Writes to a randomized temp file in the same directory, syncs it, then
/// renames over the destination. Either the old document or the complete
/// new one exists at all times — never a partial write. All watermarks
/// therefore land together or not at all.
pub fn save(path: &Path, list: &FeedList) -> Result<(), StoreError> {
    // Randomized temp filename so a predictable path can't be raced with a
    // symlink between check and create.
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let content = serde_json::to_vec_pretty(list)?;

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true) // Fails atomically if file exists (prevents symlink race)
        .open(&temp_path)?;

    if let Err(e) = temp_file.write_all(&content).and_then(|_| temp_file.sync_all()) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StoreError::Io(e));
    }

    // Drop the file handle before rename
    drop(temp_file);

    // Atomic rename (POSIX guarantees atomicity for rename on same filesystem)
    // On Windows, rename fails if destination exists, so remove it first
    #[cfg(windows)]
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(StoreError::Io(e));
        }
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(StoreError::Io(e));
    }

    tracing::debug!(path = %path.display(), feeds = list.feeds.len(), "Saved feed list");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
