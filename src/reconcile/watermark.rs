use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::Entry;

/// The stored reference point used to decide which entries are new.
///
/// Exactly one variant is active per feed:
///
/// - `Timestamp` when the feed publishes usable update times (the normal
///   case). Comparison is strict greater-than, so an entry whose timestamp
///   equals the watermark is not reported again.
/// - `Title` when the feed omits timestamps entirely. Strictly weaker: an
///   entry edited without a title change is invisible in this mode. That is
///   a documented limitation of title comparison, not something we try to
///   paper over.
/// - `None` before the first-ever check, or when the prior newest entry
///   carried no usable signal.
///
/// Serialized adjacently tagged (`{"kind": "timestamp", "value": ...}`) so
/// the feeds file stays readable and hand-editable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Watermark {
    Timestamp(DateTime<Utc>),
    Title(String),
    #[default]
    None,
}

impl std::fmt::Display for Watermark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Watermark::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Watermark::Title(s) => write!(f, "title \"{s}\""),
            Watermark::None => f.write_str("none"),
        }
    }
}

impl Watermark {
    /// Compute the watermark to store after seeing `entries`.
    ///
    /// The newest entry wins: its timestamp if it has one, otherwise its
    /// title. An empty entry list leaves the watermark unchanged — there is
    /// no new signal to record.
    pub fn advance(&self, entries: &[Entry]) -> Watermark {
        match entries.first() {
            Some(newest) => match newest.updated {
                Some(t) => Watermark::Timestamp(t),
                None => Watermark::Title(newest.title.clone()),
            },
            None => self.clone(),
        }
    }
}
