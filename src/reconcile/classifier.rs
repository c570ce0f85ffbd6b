use chrono::{DateTime, Utc};
use thiserror::Error;

use super::watermark::Watermark;

/// One item within a fetched feed, as the parser hands it to us.
///
/// `updated` is optional because plenty of real feeds omit per-entry
/// timestamps; those feeds are tracked by title instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub updated: Option<DateTime<Utc>>,
}

/// Outcome of classifying one feed's entries against its watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// Total consecutive-new entries found, NOT capped. The cap only limits
    /// how many titles are carried for display.
    pub new_count: usize,
    /// Titles of the new entries, newest first, truncated to the cap.
    pub new_titles: Vec<String>,
    /// How many new entries were counted but not retained for display.
    pub overflow_count: usize,
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// A feed with zero entries cannot be classified. Callers must treat
    /// this as a skip, never as "zero new entries" — an empty fetch result
    /// usually means the feed is broken, and reporting 0 would silently
    /// advance nothing while looking like a clean check.
    #[error("feed has no entries")]
    EmptyFeed,
}

/// Split a feed's entries into new-since-watermark and already-seen.
///
/// `entries` must be newest first — the order feeds conventionally publish
/// in. The scan trusts that order and stops at the first entry that is not
/// new, so cost is proportional to the number of new entries rather than
/// the feed length. No sorting happens here.
///
/// Comparison mode follows the watermark variant:
///
/// - `Timestamp(t)`: new iff `updated` is present and strictly greater
///   than `t`. An entry with no `updated` is a boundary: the scan stops
///   without counting it, rather than guessing where an undated entry
///   falls in the timeline.
/// - `Title(s)`: new iff the title differs from `s`.
/// - `None`: everything is new (first run).
///
/// All consecutive new entries are counted even past `cap`; only the
/// returned title list is truncated, with the remainder recorded in
/// `overflow_count` so reporting can say "...and N more".
pub fn classify(
    entries: &[Entry],
    watermark: &Watermark,
    cap: usize,
) -> Result<ClassificationResult, ClassifyError> {
    if entries.is_empty() {
        return Err(ClassifyError::EmptyFeed);
    }

    let mut new_count = 0;
    let mut new_titles = Vec::new();

    for entry in entries {
        let is_new = match watermark {
            Watermark::Timestamp(t) => match entry.updated {
                Some(updated) => updated > *t,
                None => false,
            },
            Watermark::Title(s) => entry.title != *s,
            Watermark::None => true,
        };

        if !is_new {
            break;
        }

        new_count += 1;
        if new_titles.len() < cap {
            new_titles.push(entry.title.clone());
        }
    }

    let overflow_count = new_count - new_titles.len();

    Ok(ClassificationResult {
        new_count,
        new_titles,
        overflow_count,
    })
}
