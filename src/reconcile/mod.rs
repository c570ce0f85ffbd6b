//! Incremental feed reconciliation: decide what is new since the last check.
//!
//! Given the watermark recorded for a feed (a timestamp, or failing that an
//! entry title) and a freshly fetched newest-first entry list, this module
//! answers three questions:
//!
//! - **Classification**: which leading entries are new? ([`classify`])
//! - **Reporting**: how do we say that in a few lines of text?
//!   ([`headline`], [`title_block`], [`heading`])
//! - **Advancement**: what watermark do we store for next time?
//!   ([`Watermark::advance`])
//!
//! [`run`] drives all three across a whole feed list, isolating per-feed
//! faults so one broken feed never takes down the sweep.

mod classifier;
mod faults;
mod runner;
mod summary;
mod watermark;

pub use classifier::{classify, ClassificationResult, ClassifyError, Entry};
pub use faults::{Fault, FaultKind, FaultLog};
pub use runner::{run, RunResult};
pub use summary::{heading, headline, title_block};
pub use watermark::Watermark;
