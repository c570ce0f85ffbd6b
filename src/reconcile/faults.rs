use std::fmt;

/// What went wrong with one feed during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The fetch itself failed (network, HTTP status, timeout, size).
    FetchFailed,
    /// The response body could not be parsed as RSS/Atom.
    NotAFeed,
    /// The feed parsed but contained zero entries.
    EmptyFeed,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultKind::FetchFailed => "fetch failed",
            FaultKind::NotAFeed => "not a feed",
            FaultKind::EmptyFeed => "empty feed",
        };
        f.write_str(s)
    }
}

/// One recorded per-feed failure. The feed's stored state (watermark
/// included) is left exactly as it was loaded.
#[derive(Debug, Clone)]
pub struct Fault {
    pub feed_index: usize,
    pub kind: FaultKind,
    pub detail: String,
}

/// Accumulates per-feed faults across a run.
///
/// Recording is infallible and never aborts the sweep; faulted feeds are
/// omitted from the rendered report but logged here so a quiet run is
/// still diagnosable.
#[derive(Debug, Default)]
pub struct FaultLog {
    faults: Vec<Fault>,
}

impl FaultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, feed_index: usize, kind: FaultKind, detail: impl Into<String>) {
        let detail = detail.into();
        tracing::warn!(
            feed_index = feed_index,
            kind = %kind,
            detail = %detail,
            "Feed skipped"
        );
        self.faults.push(Fault {
            feed_index,
            kind,
            detail,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn into_faults(self) -> Vec<Fault> {
        self.faults
    }
}
