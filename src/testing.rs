//! Local image server for download tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

/// Serves `/{size}/{name}`: names starting with `ok` return their own name
/// as the body, everything else is a 404. Returns the base URL and a hit counter.
pub async fn spawn_image_server() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/{size}/{name}", get(serve_image))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), hits)
}

async fn serve_image(
    Path((_size, name)): Path<(String, String)>,
    State(hits): State<Arc<AtomicUsize>>,
) -> (StatusCode, Vec<u8>) {
    hits.fetch_add(1, Ordering::SeqCst);
    if name.starts_with("ok") {
        (StatusCode::OK, name.into_bytes())
    } else {
        (StatusCode::NOT_FOUND, Vec::new())
    }
}
