use std::collections::BTreeMap;

use crate::feed::{FeedSnapshot, FetchError};
use crate::store::FeedConfig;

use super::classifier::classify;
use super::faults::{Fault, FaultKind, FaultLog};
use super::summary::{heading, headline, title_block};
use super::watermark::Watermark;

/// Everything one sweep over the feed list produced.
///
/// `summaries` and `entry_lists` hold output only for feeds that had new
/// entries, in configured feed order. `next_watermarks` maps feed index to
/// the watermark that was staged for it; faulted feeds are absent from the
/// map because their stored state must not move.
#[derive(Debug)]
pub struct RunResult {
    pub total_new: usize,
    pub heading: String,
    pub summaries: Vec<String>,
    pub entry_lists: Vec<String>,
    pub next_watermarks: BTreeMap<usize, Watermark>,
    pub faults: Vec<Fault>,
}

/// Reconcile every configured feed against its fetch result.
///
/// Feeds are processed in configured order and the output mirrors that
/// order exactly, so two runs over the same inputs render byte-identical
/// reports. Fetching may have happened concurrently upstream; by the time
/// results reach here they are a plain ordered list.
///
/// Per feed: a fetch error or an empty feed is recorded as a fault and
/// skipped, leaving that feed's config untouched. On success the feed's
/// watermark is advanced, its cached title refreshed from the feed
/// metadata, and its home URL backfilled if it was never set.
pub fn run(
    feeds: &mut [FeedConfig],
    fetched: Vec<Result<FeedSnapshot, FetchError>>,
    cap: usize,
) -> RunResult {
    debug_assert_eq!(feeds.len(), fetched.len());

    let mut total_new = 0;
    let mut summaries = Vec::new();
    let mut entry_lists = Vec::new();
    let mut next_watermarks = BTreeMap::new();
    let mut faults = FaultLog::new();

    for (index, (feed, outcome)) in feeds.iter_mut().zip(fetched).enumerate() {
        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(err) => {
                let kind = if err.is_not_a_feed() {
                    FaultKind::NotAFeed
                } else {
                    FaultKind::FetchFailed
                };
                faults.record(index, kind, err.to_string());
                continue;
            }
        };

        tracing::debug!(feed = %feed.url, entries = snapshot.entries.len(), "Checking feed");

        let result = match classify(&snapshot.entries, &feed.watermark, cap) {
            Ok(result) => result,
            Err(err) => {
                faults.record(index, FaultKind::EmptyFeed, err.to_string());
                continue;
            }
        };

        // Refresh cached metadata before rendering so the report always
        // shows the feed's current self-reported title.
        if let Some(title) = &snapshot.title {
            feed.title = title.clone();
        }
        if feed.home_url.is_none() {
            feed.home_url = snapshot.home_url.clone();
        }

        let display_title = if feed.title.is_empty() {
            feed.url.as_str()
        } else {
            feed.title.as_str()
        };

        total_new += result.new_count;
        if result.new_count > 0 {
            summaries.push(headline(display_title, result.new_count));
            entry_lists.push(title_block(display_title, &result));
        }

        let next = feed.watermark.advance(&snapshot.entries);
        feed.watermark = next.clone();
        next_watermarks.insert(index, next);
    }

    RunResult {
        total_new,
        heading: heading(total_new),
        summaries,
        entry_lists,
        next_watermarks,
        faults: faults.into_faults(),
    }
}
