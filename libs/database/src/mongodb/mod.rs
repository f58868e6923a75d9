//! MongoDB backend: connection management, health checks and the
//! [`MongoDocumentRepository`].

mod config;
mod connector;
mod health;
mod repository;

pub use config::{DEFAULT_COLLECTION, DEFAULT_DATABASE, MongoConfig};
pub use connector::{MongoError, connect, connect_from_config, connect_from_config_with_retry};
pub use health::{HealthStatus, check_health, check_health_detailed};
pub use repository::{MongoDocumentRepository, filter_document};

pub use mongodb::{Client, Collection, Database};
