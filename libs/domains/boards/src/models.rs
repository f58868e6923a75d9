use chrono::{DateTime, Utc};
use database::document::{Document, Filter, Page, ReadOptions};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{BoardError, BoardResult};

/// Board entity as stored in the `boards` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "0192a3b4-5c6d-7e8f-9a0b-1c2d3e4f5a6b",
    "title": "Good board!",
    "published": true,
    "content": "This is a good board",
    "tags": ["featured"],
    "deleted": false
}))]
pub struct Board {
    /// Application id, assigned on insert when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub published: bool,
    pub content: String,
    pub tags: Vec<String>,
    /// Caller-visible soft-delete flag
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<DateTime<Utc>>,
    /// Set once, by the first soft delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_on: Option<DateTime<Utc>>,
}

impl Document for Board {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Board {
    pub fn is_soft_deleted(&self) -> bool {
        self.deleted_on.is_some()
    }
}

/// Request body for creating or updating a board
///
/// Every field except `id` is required. Unknown fields are ignored.
/// `deleted` is accepted but never stored; only `DELETE /{id}` raises it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    pub published: bool,
    pub content: String,
    pub tags: Vec<String>,
    pub deleted: bool,
}

impl From<BoardInput> for Board {
    fn from(input: BoardInput) -> Self {
        Self {
            id: input.id.filter(|id| !id.is_empty()),
            title: input.title,
            published: input.published,
            content: input.content,
            tags: input.tags,
            deleted: input.deleted,
            created_on: None,
            updated_on: None,
            deleted_on: None,
        }
    }
}

/// Path parameters of `/{id}` routes
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Path)]
pub struct BoardParams {
    /// Board id
    #[validate(length(min = 1))]
    pub id: String,
}

/// Query string of `GET /`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BoardQuery {
    /// Only boards whose `deleted` flag has this value
    pub deleted: Option<bool>,
    /// Also return soft-deleted boards
    pub include_deleted: Option<bool>,
    /// 1-indexed page number; defaults to 1 when `perPage` is set
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    /// Page size; enables paging
    #[validate(range(min = 1))]
    pub per_page: Option<u64>,
}

impl BoardQuery {
    pub fn filter(&self) -> Filter {
        match self.deleted {
            Some(deleted) => Filter::all().eq("deleted", deleted),
            None => Filter::all(),
        }
    }

    /// `deleted=true` only makes sense together with soft-deleted boards, so it
    /// implies `includeDeleted`.
    pub fn read_options(&self) -> ReadOptions {
        if self.include_deleted.unwrap_or(false) || self.deleted == Some(true) {
            ReadOptions::include_deleted()
        } else {
            ReadOptions::default()
        }
    }

    pub fn page(&self) -> BoardResult<Option<Page>> {
        match (self.page, self.per_page) {
            (_, Some(per_page)) => Ok(Some(Page::new(self.page.unwrap_or(1), per_page))),
            (Some(_), None) => Err(BoardError::InvalidQuery(
                "perPage is required when page is set".into(),
            )),
            (None, None) => Ok(None),
        }
    }
}

/// Query string of `GET /{id}`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BoardLookup {
    /// Also match a soft-deleted board
    pub include_deleted: Option<bool>,
}

impl BoardLookup {
    pub fn read_options(&self) -> ReadOptions {
        if self.include_deleted.unwrap_or(false) {
            ReadOptions::include_deleted()
        } else {
            ReadOptions::default()
        }
    }
}

/// `{ "boards": [...] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BoardsReply {
    pub boards: Vec<Board>,
}

/// `{ "error": "..." }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(example = json!({"error": "Board not found"}))]
pub struct BoardNotFound {
    pub error: String,
}

impl BoardNotFound {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// `{ "message": "..." }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BoardDeleted {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_board_input_requires_every_field() {
        let missing_tags = json!({
            "title": "Good board!",
            "published": true,
            "content": "This is a good board",
            "deleted": false
        });
        assert!(serde_json::from_value::<BoardInput>(missing_tags).is_err());

        let wrong_type = json!({
            "title": "Good board!",
            "published": "yes",
            "content": "This is a good board",
            "tags": [],
            "deleted": false
        });
        assert!(serde_json::from_value::<BoardInput>(wrong_type).is_err());
    }

    #[test]
    fn test_board_input_drops_unknown_fields() {
        let input: BoardInput = serde_json::from_value(json!({
            "title": "Good board!",
            "published": true,
            "content": "This is a good board",
            "tags": ["featured"],
            "deleted": false,
            "rating": 5
        }))
        .unwrap();

        assert_eq!(input.title, "Good board!");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_empty_title_fails_validation() {
        let input = BoardInput {
            id: None,
            title: String::new(),
            published: false,
            content: String::new(),
            tags: vec![],
            deleted: false,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_empty_input_id_is_treated_as_missing() {
        let board = Board::from(BoardInput {
            id: Some(String::new()),
            title: "Good board!".into(),
            published: true,
            content: "This is a good board".into(),
            tags: vec![],
            deleted: false,
        });
        assert_eq!(board.id, None);
    }

    #[test]
    fn test_board_serializes_camel_case_without_empty_fields() {
        let board = Board::from(BoardInput {
            id: Some("b1".into()),
            title: "Good board!".into(),
            published: true,
            content: "This is a good board".into(),
            tags: vec!["featured".into()],
            deleted: false,
        });

        let value = serde_json::to_value(&board).unwrap();
        assert_eq!(value["id"], "b1");
        assert!(value.get("deletedOn").is_none());
        assert!(value.get("created_on").is_none());
        assert!(!board.is_soft_deleted());
    }

    #[test]
    fn test_query_paging() {
        let query = BoardQuery {
            per_page: Some(2),
            ..Default::default()
        };
        assert_eq!(query.page().unwrap(), Some(Page::new(1, 2)));

        let query = BoardQuery {
            page: Some(3),
            ..Default::default()
        };
        assert!(matches!(query.page(), Err(BoardError::InvalidQuery(_))));

        assert_eq!(BoardQuery::default().page().unwrap(), None);
    }

    #[test]
    fn test_query_read_options() {
        assert_eq!(BoardQuery::default().read_options(), ReadOptions::default());

        let deleted = BoardQuery {
            deleted: Some(true),
            ..Default::default()
        };
        assert_eq!(deleted.read_options(), ReadOptions::include_deleted());
        assert_eq!(deleted.filter().conditions().len(), 1);

        let lookup = BoardLookup {
            include_deleted: Some(true),
        };
        assert_eq!(lookup.read_options(), ReadOptions::include_deleted());
    }

    #[test]
    fn test_unknown_query_parameter_is_rejected() {
        let parsed = serde_json::from_value::<BoardLookup>(json!({"skipDeletedOnDocs": false}));
        assert!(parsed.is_err());
    }
}
