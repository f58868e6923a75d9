//! Board Service - Business logic layer

use database::document::{Document, FindResult, Update, UpdateOutcome};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{BoardError, BoardResult};
use crate::models::{Board, BoardInput, BoardLookup, BoardQuery};
use crate::repository::BoardRepository;

/// Board service providing business logic operations
///
/// Validates input, assigns ids to new boards and translates HTTP-level
/// query options into repository calls.
pub struct BoardService<R: BoardRepository> {
    repository: Arc<R>,
}

impl<R: BoardRepository> BoardService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// List boards matching the query
    #[instrument(skip(self))]
    pub async fn list_boards(&self, query: BoardQuery) -> BoardResult<FindResult<Board>> {
        let page = query.page()?;
        self.repository
            .list(query.filter(), page, query.read_options())
            .await
    }

    /// Get a board by id; soft-deleted boards only with `includeDeleted`
    #[instrument(skip(self))]
    pub async fn get_board(&self, id: &str, lookup: BoardLookup) -> BoardResult<Option<Board>> {
        self.repository.get(id, lookup.read_options()).await
    }

    /// Create a board, generating an id when none was supplied
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_board(&self, input: BoardInput) -> BoardResult<Board> {
        input
            .validate()
            .map_err(|e| BoardError::Validation(e.to_string()))?;

        let mut board = Board::from(input);
        if board.id().is_none() {
            board.set_id(Uuid::now_v7().to_string());
        }

        self.repository.create(board).await
    }

    /// Set the supplied fields on a live board
    #[instrument(skip(self, input))]
    pub async fn update_board(
        &self,
        id: &str,
        input: BoardInput,
    ) -> BoardResult<UpdateOutcome<Board>> {
        input
            .validate()
            .map_err(|e| BoardError::Validation(e.to_string()))?;

        let update = Update::set_value(&input)?;
        self.repository.update(id, update).await
    }

    /// Soft delete a board; returns how many boards were newly flagged
    #[instrument(skip(self))]
    pub async fn soft_delete_board(&self, id: &str) -> BoardResult<u64> {
        self.repository.soft_delete(id).await
    }

    /// Remove a board physically, soft-deleted or not
    #[instrument(skip(self))]
    pub async fn purge_board(&self, id: &str) -> BoardResult<u64> {
        self.repository.purge(id).await
    }
}

impl<R: BoardRepository> Clone for BoardService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockBoardRepository;
    use database::DocumentError;
    use database::document::{Page, ReadOptions};

    fn input(title: &str) -> BoardInput {
        BoardInput {
            id: None,
            title: title.to_string(),
            published: true,
            content: "This is a good board".to_string(),
            tags: vec!["featured".to_string()],
            deleted: false,
        }
    }

    #[tokio::test]
    async fn test_create_board_generates_id() {
        let mut repository = MockBoardRepository::new();
        repository
            .expect_create()
            .withf(|board| board.id.as_deref().is_some_and(|id| Uuid::parse_str(id).is_ok()))
            .times(1)
            .returning(|board| Ok(board));

        let service = BoardService::new(repository);
        let board = service.create_board(input("Good board!")).await.unwrap();
        assert!(board.id.is_some());
    }

    #[tokio::test]
    async fn test_create_board_keeps_supplied_id() {
        let mut repository = MockBoardRepository::new();
        repository
            .expect_create()
            .withf(|board| board.id.as_deref() == Some("board-1"))
            .returning(|board| Ok(board));

        let service = BoardService::new(repository);
        let mut with_id = input("Good board!");
        with_id.id = Some("board-1".to_string());
        let board = service.create_board(with_id).await.unwrap();
        assert_eq!(board.id.as_deref(), Some("board-1"));
    }

    #[tokio::test]
    async fn test_create_board_rejects_empty_title() {
        let mut repository = MockBoardRepository::new();
        repository.expect_create().never();

        let service = BoardService::new(repository);
        let result = service.create_board(input("")).await;
        assert!(matches!(result, Err(BoardError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_boards_passes_paging() {
        let mut repository = MockBoardRepository::new();
        repository
            .expect_list()
            .withf(|_, page, options| {
                *page == Some(Page::new(2, 5)) && *options == ReadOptions::default()
            })
            .returning(|_, _, _| {
                Ok(FindResult {
                    results: vec![],
                    pages_count: 0,
                    count: 0,
                })
            });

        let service = BoardService::new(repository);
        let query = BoardQuery {
            page: Some(2),
            per_page: Some(5),
            ..Default::default()
        };
        let found = service.list_boards(query).await.unwrap();
        assert!(found.results.is_empty());
    }

    #[tokio::test]
    async fn test_update_board_sends_fields() {
        let mut repository = MockBoardRepository::new();
        repository
            .expect_update()
            .withf(|id, update| {
                id == "board-1"
                    && matches!(update, Update::Set(fields) if fields["title"] == "Better board!")
            })
            .returning(|_, _| Ok(UpdateOutcome::NotMatched));

        let service = BoardService::new(repository);
        let outcome = service
            .update_board("board-1", input("Better board!"))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotMatched);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut repository = MockBoardRepository::new();
        repository
            .expect_soft_delete()
            .returning(|_| Err(DocumentError::Backend("connection reset".into()).into()));

        let service = BoardService::new(repository);
        let result = service.soft_delete_board("board-1").await;
        assert!(matches!(
            result,
            Err(BoardError::Store(DocumentError::Backend(_)))
        ));
    }
}
