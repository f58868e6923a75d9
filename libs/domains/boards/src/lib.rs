//! Boards Domain
//!
//! CRUD over the `boards` document collection, exposed as an axum router.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, status-code mapping
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, id generation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← BoardRepository over any DocumentRepository<Board>
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Board, request/response bodies
//! └─────────────┘
//! ```
//!
//! # Routes
//!
//! | Method | Path | Success | Otherwise |
//! |---|---|---|---|
//! | `GET` | `/` | 200 `{boards}` | 404 `{error}` |
//! | `GET` | `/{id}` | 200 `{boards: [board]}` | 404 `{error}` |
//! | `POST` | `/` | 201 + `Location` | 409 duplicate id |
//! | `PUT` | `/{id}` | 204 | 304 |
//! | `DELETE` | `/{id}` | 202 `{message}` (soft delete) | 404 / 400 `{error}` |
//! | `DELETE` | `/{id}/purge` | 202 `{message}` (hard delete) | 404 / 400 `{error}` |
//!
//! # Usage
//!
//! ```rust,ignore
//! use database::mongodb::MongoDocumentRepository;
//! use domain_boards::{Board, BoardService, DocumentBoardRepository, handlers};
//!
//! let store = MongoDocumentRepository::<Board>::new(&db, "boards");
//! let service = BoardService::new(DocumentBoardRepository::new(store));
//! let router = handlers::router(service);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{BoardError, BoardResult};
pub use handlers::ApiDoc;
pub use models::{
    Board, BoardDeleted, BoardInput, BoardLookup, BoardNotFound, BoardParams, BoardQuery,
    BoardsReply,
};
pub use repository::{BoardRepository, DocumentBoardRepository};
pub use service::BoardService;
