//! Access to the vault through the Obsidian Local REST API plugin.

pub mod client;
pub mod config;
pub mod error;
#[cfg(test)]
pub(crate) mod mock;
pub mod types;

pub use client::ObsidianClient;
pub use config::ObsidianConfig;
pub use error::VaultError;
