use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The mini-app page may be hosted on any origin; it only ever reads the
/// health probe and posts its init data.
pub fn mini_app_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any)
}
