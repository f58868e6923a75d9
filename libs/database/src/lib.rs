//! Document storage for the boards service
//!
//! [`document::DocumentRepository`] is the generic CRUD facade (paging, soft
//! delete, partial updates). It has two implementations:
//!
//! - [`document::InMemoryDocumentRepository`], always available, used by tests
//! - `mongodb::MongoDocumentRepository`, behind the `mongodb` feature
//!
//! # Features
//!
//! - `mongodb` - MongoDB backend, connector and health checks
//! - `config` - `core_config::FromEnv` for `MongoConfig`
//!
//! # Example
//!
//! ```ignore
//! use database::document::{DocumentRepository, Filter, ReadOptions};
//! use database::mongodb::{MongoConfig, MongoDocumentRepository, connect_from_config};
//!
//! let config = MongoConfig::new("mongodb://localhost:27017");
//! let client = connect_from_config(&config).await?;
//! let boards = MongoDocumentRepository::<Board>::new(&client.database(&config.database), &config.collection);
//! boards.ensure_indexes().await?;
//!
//! let board = boards.find_one(Filter::by_id(id), ReadOptions::default()).await?;
//! ```

pub mod common;
pub mod document;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DocumentError, DocumentResult};
pub use document::{
    Document, DocumentRepository, Filter, FindResult, InMemoryDocumentRepository, Page,
    ReadOptions, Update, UpdateOutcome,
};
