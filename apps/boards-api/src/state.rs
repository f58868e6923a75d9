//! Application state management.
//!
//! The state contains the configuration and the MongoDB handles shared by
//! every router.

use database::mongodb::{Client, Database};

/// Shared application state.
///
/// Cloning is cheap: the MongoDB client and database share one connection pool.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    pub mongo_client: Client,
    /// Database holding the boards collection
    pub db: Database,
}
