mod credentials;
mod loader;
mod store;
mod types;

pub use credentials::{Credentials, MissingCredential, SecureString};
pub use loader::ConfigError;
pub use store::ConfigStore;
pub use types::{CacheConfig, Config, LibraryConfig, ServerConfig};
