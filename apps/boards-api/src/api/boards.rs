//! Boards API routes
//!
//! Wires the boards domain to the configured MongoDB collection.

use axum::Router;
use database::DocumentResult;
use database::mongodb::MongoDocumentRepository;
use domain_boards::{Board, BoardService, DocumentBoardRepository, handlers};

use crate::state::AppState;

fn store(state: &AppState) -> MongoDocumentRepository<Board> {
    MongoDocumentRepository::new(&state.db, state.config.mongodb.collection())
}

/// Create the unique `id` index on the boards collection
pub async fn init_indexes(state: &AppState) -> DocumentResult<()> {
    store(state).ensure_indexes().await
}

/// Create boards router
pub fn router(state: &AppState) -> Router {
    let repository = DocumentBoardRepository::new(store(state));
    let service = BoardService::new(repository);

    handlers::router(service)
}
