//! Cover proxy for a self-hosted ebook library.
//!
//! Resolves which cover path layout the library server speaks, remembers it
//! per book, and shares one authenticated client across requests.

pub mod config;
pub mod covers;
pub mod library;
pub mod logging;
pub mod proxy;
pub mod session;
