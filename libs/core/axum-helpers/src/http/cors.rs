use axum::http::{HeaderValue, Method, header};
use core_config::Environment;
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Environment variable holding comma-separated allowed origins
pub const CORS_ALLOWED_ORIGIN: &str = "CORS_ALLOWED_ORIGIN";

/// Exposed so browser clients can read paging metadata
const EXPOSED_HEADERS: [&str; 3] = ["x-total-count", "x-page-count", "location"];

/// Creates a CORS layer for the given origins.
///
/// - Methods: GET, POST, PUT, DELETE, OPTIONS
/// - Headers: Content-Type, Accept
/// - Exposes `x-total-count`, `x-page-count` and `Location`
/// - 1 hour max age
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(EXPOSED_HEADERS.map(header::HeaderName::from_static))
        .max_age(Duration::from_secs(3600))
}

/// Creates a permissive CORS layer for development.
///
/// Allows any origin - **DO NOT USE IN PRODUCTION**.
pub fn create_permissive_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Parse a comma-separated origin list
pub fn parse_origins(raw: &str) -> io::Result<Vec<HeaderValue>> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid {} value: {}", CORS_ALLOWED_ORIGIN, e),
            )
        })?;

    if origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} cannot be empty", CORS_ALLOWED_ORIGIN),
        ));
    }
    Ok(origins)
}

/// CORS layer from `CORS_ALLOWED_ORIGIN`.
///
/// The variable is required in production. In development an unset variable
/// falls back to [`create_permissive_cors_layer`].
pub fn cors_layer_from_env(environment: &Environment) -> io::Result<CorsLayer> {
    match std::env::var(CORS_ALLOWED_ORIGIN) {
        Ok(raw) => {
            let origins = parse_origins(&raw)?;
            info!(origins = %raw, "CORS configured");
            Ok(create_cors_layer(origins))
        }
        Err(_) if environment.is_production() => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "{} environment variable is required in production. Example: {}=https://example.com",
                CORS_ALLOWED_ORIGIN, CORS_ALLOWED_ORIGIN
            ),
        )),
        Err(_) => {
            warn!("{} not set, allowing any origin", CORS_ALLOWED_ORIGIN);
            Ok(create_permissive_cors_layer())
        }
    }
}
