//! HTTP surface of the cover proxy.

pub mod error;
pub mod health;
pub mod router;
pub mod server;
pub mod shutdown;

pub use router::{build_router, CANDIDATE_HEADER};
pub use server::{ProxyHandle, ProxyServer};
