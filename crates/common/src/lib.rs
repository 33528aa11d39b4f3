//! apiprobe Common Library
//!
//! Session provider, identity backend, service client and the resource
//! pages used by the apiprobe CLI.

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod page;
pub mod resources;
pub mod services;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use client::ServiceClient;
pub use config::{ProbeConfig, Service, ServiceEndpoints};
pub use error::{Error, Result};
pub use identity::IdentityToolkit;
pub use page::{Resource, ResourcePage, Status};
pub use session::{CredentialSource, SessionProvider, SessionState, Snapshot, Subscription};
pub use types::{Credential, Identity};

/// apiprobe version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default state directory
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".apiprobe")
}

/// Default config file path
pub fn default_config_path() -> std::path::PathBuf {
    default_store_path().join("config.toml")
}

/// Default path of the persisted sign-in
pub fn default_session_path() -> std::path::PathBuf {
    default_store_path().join("session.json")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
