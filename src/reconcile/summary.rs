//! Text rendering for the reconciliation report.
//!
//! Pure functions of their inputs: no locale machinery, ASCII punctuation,
//! the ` } ` marker the tool has always used for per-feed lines.

use crate::util::truncate_to_width;

use super::classifier::ClassificationResult;

/// Widest an entry title may render before it is clipped with "...".
const MAX_TITLE_WIDTH: usize = 100;

/// One-line summary for a single feed. Empty when nothing is new — zero-new
/// feeds contribute no output at all.
pub fn headline(feed_title: &str, new_count: usize) -> String {
    match new_count {
        0 => String::new(),
        1 => format!(" }} 1 new entry in {feed_title}."),
        n => format!(" }} {n} new entries in {feed_title}."),
    }
}

/// The feed's block in the report body: title line, one indented line per
/// retained new entry, and an overflow note when more were counted than
/// the cap allowed to be shown.
pub fn title_block(feed_title: &str, result: &ClassificationResult) -> String {
    let mut block = String::from(feed_title);
    for title in &result.new_titles {
        block.push_str("\n  ");
        block.push_str(&truncate_to_width(title, MAX_TITLE_WIDTH));
    }
    if result.overflow_count > 0 {
        block.push_str(&format!("\n  ...and {} more.", result.overflow_count));
    }
    block
}

/// The run-level heading, worded for zero, one, or many across all feeds.
pub fn heading(total_new: usize) -> String {
    match total_new {
        0 => "There are no new entries in any of your feeds.".to_string(),
        1 => "There is 1 new entry in all your feeds.".to_string(),
        n => format!("There are {n} new entries in all your feeds."),
    }
}
