//! Feed fetching and normalization.
//!
//! The reconciliation core never touches the network or raw XML; this
//! module is the collaborator that turns a configured URL into a
//! [`FeedSnapshot`] — feed-level metadata plus a newest-first entry list —
//! or a typed [`FetchError`] describing why it could not.
//!
//! - [`parser`] — RSS/Atom normalization using the `feed-rs` crate
//! - [`fetcher`] — concurrent HTTP retrieval with retry and size limits

mod fetcher;
mod parser;

pub use fetcher::{fetch_all, fetch_one, FetchError};
pub use parser::{parse_snapshot, FeedSnapshot};
