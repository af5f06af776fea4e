use axum::{
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use rust_embed::RustEmbed;

use crate::AppState;

/// The single-page dashboard in `frontend/`, embedded at compile time.
#[derive(RustEmbed)]
#[folder = "../../frontend/"]
struct FrontendAssets;

pub fn static_router() -> Router<AppState> {
    Router::new().fallback(serve_static)
}

async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    match FrontendAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();
            ([(header::CONTENT_TYPE, mime)], content.data.into_owned()).into_response()
        }
        None if path.starts_with("api/") => StatusCode::NOT_FOUND.into_response(),
        // SPA fallback: serve index.html for all other unmatched paths
        None => match FrontendAssets::get("index.html") {
            Some(index) => (
                [(header::CONTENT_TYPE, "text/html; charset=utf-8".to_string())],
                index.data.into_owned(),
            )
                .into_response(),
            None => (StatusCode::NOT_FOUND, "Dashboard not bundled").into_response(),
        },
    }
}
