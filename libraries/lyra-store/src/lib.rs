//! Lyra Store
//!
//! `DataStore` and `AuthProvider` implementations for Lyra.
//!
//! # Features
//!
//! - **Hosted backend**: `RestStore` speaks the PostgREST dialect of the
//!   hosted database; `RestAuth` performs password sign-in
//! - **In-process**: `MemoryStore` keeps the same tables in memory, with
//!   failure injection for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use lyra_store::{BackendClient, BackendConfig, RestAuth, RestStore};
//!
//! # async fn example() -> lyra_core::Result<()> {
//! let client = BackendClient::new(BackendConfig::new(
//!     "https://project.example.co",
//!     "anon-key",
//! ))?;
//!
//! let auth = RestAuth::new(client.clone());
//! auth.sign_in("user@example.com", "password").await?;
//!
//! // Requests made through the store now carry the user's token
//! let store = RestStore::new(client);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod auth;
mod client;
mod config;
mod memory;
mod rest;
mod types;

pub use auth::RestAuth;
pub use client::BackendClient;
pub use config::BackendConfig;
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use types::AuthSession;
