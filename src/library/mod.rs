//! Connection management for the external ebook library server.

mod client;
mod registry;

pub use client::{is_auth_status, LibraryClient};
pub use registry::ClientRegistry;
