use axum::{
    Json, Router,
    extract::{OriginalUri, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use axum_helpers::{
    ValidatedJson, ValidatedPath, ValidatedQuery,
    errors::responses::{
        BadRequestQueryResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse,
    },
};
use database::document::UpdateOutcome;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::BoardResult;
use crate::models::{
    Board, BoardDeleted, BoardInput, BoardLookup, BoardNotFound, BoardParams, BoardQuery,
    BoardsReply,
};
use crate::repository::BoardRepository;
use crate::service::BoardService;

/// Total number of boards matching a list query
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
/// Number of pages for a paged list query
pub const PAGE_COUNT_HEADER: &str = "x-page-count";

const BOARD_NOT_FOUND: &str = "Board not found";

/// OpenAPI documentation for Boards API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_boards,
        get_board,
        create_board,
        update_board,
        delete_board,
        purge_board,
    ),
    components(
        schemas(Board, BoardInput, BoardNotFound, BoardsReply, BoardDeleted),
        responses(
            BadRequestValidationResponse,
            BadRequestQueryResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Boards", description = "Board management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Create the boards router with all HTTP endpoints
pub fn router<R: BoardRepository + 'static>(service: BoardService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_boards).post(create_board))
        .route(
            "/{id}",
            get(get_board).put(update_board).delete(delete_board),
        )
        .route("/{id}/purge", delete(purge_board))
        .with_state(shared_service)
}

/// URL of a board under the collection path the request was sent to
fn board_location(collection_path: &str, id: &str) -> String {
    format!("{}/{}", collection_path.trim_end_matches('/'), id)
}

fn not_found(error: impl Into<String>) -> Response {
    (StatusCode::NOT_FOUND, Json(BoardNotFound::new(error))).into_response()
}

/// List boards
#[utoipa::path(
    get,
    path = "",
    tag = "Boards",
    params(BoardQuery),
    responses(
        (status = 200, description = "Matching boards", body = BoardsReply,
            headers(
                ("x-total-count" = u64, description = "Number of matching boards"),
                ("x-page-count" = u64, description = "Number of pages")
            )
        ),
        (status = 400, response = BadRequestQueryResponse),
        (status = 404, description = "No board matched", body = BoardNotFound),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_boards<R: BoardRepository>(
    State(service): State<Arc<BoardService<R>>>,
    ValidatedQuery(query): ValidatedQuery<BoardQuery>,
) -> BoardResult<Response> {
    let found = service.list_boards(query).await?;
    if found.results.is_empty() {
        return Ok(not_found(BOARD_NOT_FOUND));
    }

    Ok((
        StatusCode::OK,
        [
            (TOTAL_COUNT_HEADER, found.count.to_string()),
            (PAGE_COUNT_HEADER, found.pages_count.to_string()),
        ],
        Json(BoardsReply {
            boards: found.results,
        }),
    )
        .into_response())
}

/// Get a board by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Boards",
    params(BoardParams, BoardLookup),
    responses(
        (status = 200, description = "Board found", body = BoardsReply),
        (status = 400, response = BadRequestQueryResponse),
        (status = 404, description = "The board was not found", body = BoardNotFound),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_board<R: BoardRepository>(
    State(service): State<Arc<BoardService<R>>>,
    ValidatedPath(params): ValidatedPath<BoardParams>,
    ValidatedQuery(lookup): ValidatedQuery<BoardLookup>,
) -> BoardResult<Response> {
    let response = match service.get_board(&params.id, lookup).await? {
        Some(board) => Json(BoardsReply {
            boards: vec![board],
        })
        .into_response(),
        None => not_found(BOARD_NOT_FOUND),
    };
    Ok(response)
}

/// Create a new board
#[utoipa::path(
    post,
    path = "",
    tag = "Boards",
    request_body = BoardInput,
    responses(
        (status = 201, description = "The board was created", body = Board,
            headers(("Location" = String, description = "URL of the new board"))
        ),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_board<R: BoardRepository>(
    State(service): State<Arc<BoardService<R>>>,
    OriginalUri(uri): OriginalUri,
    ValidatedJson(input): ValidatedJson<BoardInput>,
) -> BoardResult<impl IntoResponse> {
    let board = service.create_board(input).await?;
    let location = board_location(uri.path(), board.id.as_deref().unwrap_or_default());
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(board)))
}

/// Update a board
///
/// Answers 304 when no live board has the id or nothing changed.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Boards",
    params(BoardParams),
    request_body = BoardInput,
    responses(
        (status = 204, description = "The board was updated"),
        (status = 304, description = "The board was not updated"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_board<R: BoardRepository>(
    State(service): State<Arc<BoardService<R>>>,
    ValidatedPath(params): ValidatedPath<BoardParams>,
    ValidatedJson(input): ValidatedJson<BoardInput>,
) -> BoardResult<StatusCode> {
    match service.update_board(&params.id, input).await? {
        UpdateOutcome::Updated(_) => Ok(StatusCode::NO_CONTENT),
        UpdateOutcome::Unchanged(_) | UpdateOutcome::NotMatched => Ok(StatusCode::NOT_MODIFIED),
    }
}

/// Map a delete result onto 202 / 404 / 400
fn delete_response(id: &str, result: BoardResult<u64>) -> Response {
    match result {
        Ok(0) => not_found(format!("Board with id {id} does not exist")),
        Ok(_) => (
            StatusCode::ACCEPTED,
            Json(BoardDeleted {
                message: format!("Successfully removed board with id {id}"),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(board_id = %id, error = %err, "Failed to remove board");
            (
                StatusCode::BAD_REQUEST,
                Json(BoardNotFound::new(format!(
                    "Failed to remove board with id {id}"
                ))),
            )
                .into_response()
        }
    }
}

/// Soft delete a board
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Boards",
    params(BoardParams),
    responses(
        (status = 202, description = "The board was soft deleted", body = BoardDeleted),
        (status = 400, description = "The delete failed", body = BoardNotFound),
        (status = 404, description = "The board was not found", body = BoardNotFound)
    )
)]
async fn delete_board<R: BoardRepository>(
    State(service): State<Arc<BoardService<R>>>,
    ValidatedPath(params): ValidatedPath<BoardParams>,
) -> Response {
    let result = service.soft_delete_board(&params.id).await;
    delete_response(&params.id, result)
}

/// Permanently remove a board
#[utoipa::path(
    delete,
    path = "/{id}/purge",
    tag = "Boards",
    params(BoardParams),
    responses(
        (status = 202, description = "The board was removed", body = BoardDeleted),
        (status = 400, description = "The delete failed", body = BoardNotFound),
        (status = 404, description = "The board was not found", body = BoardNotFound)
    )
)]
async fn purge_board<R: BoardRepository>(
    State(service): State<Arc<BoardService<R>>>,
    ValidatedPath(params): ValidatedPath<BoardParams>,
) -> Response {
    let result = service.purge_board(&params.id).await;
    delete_response(&params.id, result)
}
