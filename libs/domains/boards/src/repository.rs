use async_trait::async_trait;
use database::document::{
    DocumentRepository, Filter, FindResult, Page, ReadOptions, Update, UpdateOutcome,
};
use tracing::instrument;

use crate::error::BoardResult;
use crate::models::Board;

/// Repository trait for Board persistence
///
/// Single-board operations address a board by its application id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Boards matching `filter`, optionally one page of them
    async fn list(
        &self,
        filter: Filter,
        page: Option<Page>,
        options: ReadOptions,
    ) -> BoardResult<FindResult<Board>>;

    async fn get(&self, id: &str, options: ReadOptions) -> BoardResult<Option<Board>>;

    /// Store a new board; the id must already be assigned
    async fn create(&self, board: Board) -> BoardResult<Board>;

    async fn update(&self, id: &str, update: Update<Board>) -> BoardResult<UpdateOutcome<Board>>;

    /// Soft delete; returns how many boards were newly flagged
    async fn soft_delete(&self, id: &str) -> BoardResult<u64>;

    /// Physical delete; returns how many boards were removed
    async fn purge(&self, id: &str) -> BoardResult<u64>;
}

/// [`BoardRepository`] backed by any document store
///
/// ```ignore
/// let store = MongoDocumentRepository::<Board>::new(&db, "boards");
/// let repository = DocumentBoardRepository::new(store);
/// ```
pub struct DocumentBoardRepository<S> {
    store: S,
}

impl<S: DocumentRepository<Board>> DocumentBoardRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying document store
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: DocumentRepository<Board>> BoardRepository for DocumentBoardRepository<S> {
    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: Filter,
        page: Option<Page>,
        options: ReadOptions,
    ) -> BoardResult<FindResult<Board>> {
        Ok(self.store.find(filter, page, options).await?)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str, options: ReadOptions) -> BoardResult<Option<Board>> {
        Ok(self.store.find_one(Filter::by_id(id), options).await?)
    }

    #[instrument(skip(self, board), fields(board_id = ?board.id))]
    async fn create(&self, board: Board) -> BoardResult<Board> {
        Ok(self.store.insert_one(board).await?)
    }

    #[instrument(skip(self, update))]
    async fn update(&self, id: &str, update: Update<Board>) -> BoardResult<UpdateOutcome<Board>> {
        Ok(self.store.update_one(Filter::by_id(id), update).await?)
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: &str) -> BoardResult<u64> {
        Ok(self.store.delete_soft(Filter::by_id(id)).await?)
    }

    #[instrument(skip(self))]
    async fn purge(&self, id: &str) -> BoardResult<u64> {
        Ok(self.store.delete_one(Filter::by_id(id)).await?)
    }
}
