//! Adaptive cover path resolution.
//!
//! Library servers disagree on where covers live. The resolver probes a
//! ranked list of path templates, the cache remembers the winner per book,
//! and the service ties both to the shared library client.

mod cache;
mod candidate;
mod error;
mod resolver;
mod service;

pub use cache::{ResolutionCache, ResolvedPathEntry, SettledProbe};
pub use candidate::{attempt_order, CoverPathCandidate};
pub use error::CoverError;
pub use resolver::{CoverImage, PathResolver};
pub use service::{validate_book_id, CoverService};
