//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Boards API",
        version = "0.1.0",
        description = "MongoDB-based REST API for managing boards",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    nest(
        (path = "/api/boards", api = domain_boards::ApiDoc)
    ),
    tags(
        (name = "Boards", description = "Board management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;
