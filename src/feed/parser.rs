use feed_rs::parser;

use crate::reconcile::Entry;

/// A fetched feed, normalized to what reconciliation needs.
///
/// Entries keep document order. Feeds conventionally publish newest first
/// and the classifier relies on that; no re-sorting happens here.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub title: Option<String>,
    pub home_url: Option<String>,
    pub entries: Vec<Entry>,
}

pub fn parse_snapshot(bytes: &[u8]) -> Result<FeedSnapshot, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let title = feed.title.map(|t| t.content).filter(|t| !t.is_empty());
    let home_url = feed.links.first().map(|l| l.href.clone());

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let updated = entry.updated.or(entry.published);
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            Entry { title, updated }
        })
        .collect();

    Ok(FeedSnapshot {
        title,
        home_url,
        entries,
    })
}
