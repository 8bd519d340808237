//! Typeahead - incremental substring search for scrolling lists
//!
//! Feeds keystrokes into a [`SearchSession`], which accumulates them into a
//! query, debounces pauses, and searches a circular index range of an
//! in-memory corpus in the background. The best match (lowest match offset,
//! ties resolved towards the next entry after the search start) is published
//! as a single index.
//!
//! The matching engine is a fork/join task tree ([`ParallelSearchTask`])
//! on Rayon; runs are launched on Tokio's blocking pool and cancelled
//! cooperatively whenever a newer keystroke arrives.

pub mod config;
pub mod corpus;
pub mod interface;
pub mod pair;
mod runtime;
pub mod session;
pub mod task;

pub use config::{workload_threshold, SessionConfig, DEFAULT_TIMEOUT_MS};
pub use corpus::{Corpus, ObservableList};
pub use interface::*;
pub use pair::Pair;
pub use session::SearchSession;
pub use task::{find_best_match, ParallelSearchTask};
