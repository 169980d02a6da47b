//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The board page is a static site. This module serves it together with the
//! `board` wasm bundle under `/pkg`, the image files under `/images`, and the
//! persisted layout document at `/images.json`. The page fetches that
//! document once at startup; a 404 tells it to start with an empty board.

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::layout_file::{self, LayoutFileError};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let site = ServeDir::new(&state.config.site_dir).append_index_html_on_directories(true);
    let images = ServeDir::new(&state.config.images_dir);
    let pkg = ServeDir::new(&state.config.pkg_dir);

    Router::new()
        .route("/images.json", get(layout_json))
        .route("/healthz", get(healthz))
        .with_state(state)
        .nest_service("/images", images)
        .nest_service("/pkg", pkg)
        .fallback_service(site)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /images.json`: the current layout document, read fresh from disk.
async fn layout_json(State(state): State<AppState>) -> Response {
    match layout_file::read_layout(&state.config.layout_path).await {
        Ok(layout) => (
            [(header::CONTENT_TYPE, "application/json"), (header::CACHE_CONTROL, "no-store")],
            layout.text,
        )
            .into_response(),
        Err(LayoutFileError::Missing { path }) => {
            tracing::debug!(path = %path.display(), "layout document requested but absent");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e @ LayoutFileError::Parse { .. }) => {
            tracing::warn!(error = %e, "refusing to serve malformed layout document");
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "layout document read failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
