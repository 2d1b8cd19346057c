//! REST API for shot search
//!
//! `POST /search` runs a query, `/static` hosts the search page and `/media`
//! hosts the movie files the hits point into.

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Redirect};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shotseek::{Embedder, SceneRetriever, SearchHit};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Hits returned when the request does not ask for a count.
pub const DEFAULT_TOP_K: i64 = 5;
/// Most hits one request may ask for.
pub const MAX_TOP_K: i64 = 5;

/// Embedding backend shared by every request.
pub type SharedEmbedder = Arc<dyn Embedder + Send + Sync>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<SceneRetriever<SharedEmbedder>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Clamps a requested hit count into `1..=MAX_TOP_K`.
pub fn clamp_top_k(top_k: Option<i64>) -> usize {
    top_k.unwrap_or(DEFAULT_TOP_K).clamp(1, MAX_TOP_K) as usize
}

/// Create the API router
pub fn create_router(state: AppState, static_dir: &Path, movie_dir: &Path) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/search", post(search))
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service("/media", ServeDir::new(movie_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Redirect {
    Redirect::temporary("/static/index.html")
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "vectors": state.retriever.len(),
    }))
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorBody>)> {
    let top_k = clamp_top_k(request.top_k);
    let retriever = Arc::clone(&state.retriever);
    let query = request.query;

    // Inference blocks, keep it off the async workers.
    let results = tokio::task::spawn_blocking(move || retriever.search(&query, top_k))
        .await
        .map_err(|e| internal_error(format!("search task failed: {e}")))?
        .map_err(|e| internal_error(e.to_string()))?;

    debug!(top_k, hits = results.len(), "served search");
    Ok(Json(SearchResponse { results }))
}

fn internal_error(message: String) -> (StatusCode, Json<ErrorBody>) {
    error!(%message, "search failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { message }),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use shotseek::{
        BuildConfig, IndexBuilder, RetrieverConfig, ShotField, ShotRecord, ShotSource,
        ShotseekError,
    };
    use tower::ServiceExt;

    use super::*;

    /// Maps every text to the same unit vector, so every shot scores 1.0.
    struct ConstEmbedder;

    impl Embedder for ConstEmbedder {
        fn model_id(&self) -> &str {
            "const"
        }

        fn dim(&self) -> usize {
            4
        }

        fn encode_passages(&self, texts: &[&str], _batch_size: usize) -> Result<Vec<Vec<f32>>, ShotseekError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
        }

        fn encode_query(&self, _text: &str) -> Result<Vec<f32>, ShotseekError> {
            Ok(vec![1.0, 0.0, 0.0, 0.0])
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        router: Router,
    }

    fn fixture(shots: usize) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = dir.path().join("artifacts");
        let static_dir = dir.path().join("static");
        let movie_dir = dir.path().join("movie");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::create_dir_all(&movie_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<html></html>").unwrap();
        std::fs::write(movie_dir.join("film.mp4"), b"\x00\x00\x00\x18ftyp").unwrap();

        let records = (0..shots)
            .map(|i| {
                ShotRecord::new(format!("S{i:03}"), format!("0:00:{i:02}"))
                    .with_field(ShotField::DetailedCaption, "a street at night")
            })
            .collect();
        let embedder: SharedEmbedder = Arc::new(ConstEmbedder);
        IndexBuilder::new(Arc::clone(&embedder), BuildConfig::new(&artifacts))
            .unwrap()
            .build(&ShotSource::from_records("mem.csv", records))
            .unwrap();

        let retriever = SceneRetriever::open(embedder, RetrieverConfig::new(&artifacts)).unwrap();
        let state = AppState {
            retriever: Arc::new(retriever),
        };
        Fixture {
            router: create_router(state, &static_dir, &movie_dir),
            _dir: dir,
        }
    }

    async fn post_search(router: &Router, body: serde_json::Value) -> SearchResponse {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/search")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get(router: &Router, uri: &str) -> axum::response::Response {
        router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn top_k_is_clamped() {
        assert_eq!(clamp_top_k(None), 5);
        assert_eq!(clamp_top_k(Some(0)), 1);
        assert_eq!(clamp_top_k(Some(-3)), 1);
        assert_eq!(clamp_top_k(Some(3)), 3);
        assert_eq!(clamp_top_k(Some(50)), 5);
    }

    #[tokio::test]
    async fn search_limits_results_to_five() {
        let fx = fixture(8);

        let resp = post_search(&fx.router, json!({"query": "night street", "top_k": 50})).await;
        assert_eq!(resp.results.len(), 5);
        let ranks: Vec<usize> = resp.results.iter().map(|h| h.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert_eq!(resp.results[0].shot_id, "S000");

        let resp = post_search(&fx.router, json!({"query": "night street"})).await;
        assert_eq!(resp.results.len(), 5);

        let resp = post_search(&fx.router, json!({"query": "night street", "top_k": 0})).await;
        assert_eq!(resp.results.len(), 1);
    }

    #[tokio::test]
    async fn empty_query_returns_no_results() {
        let fx = fixture(3);
        let resp = post_search(&fx.router, json!({"query": "   "})).await;
        assert!(resp.results.is_empty());
    }

    #[tokio::test]
    async fn root_redirects_to_search_page() {
        let fx = fixture(1);
        let response = get(&fx.router, "/").await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/static/index.html"
        );
    }

    #[tokio::test]
    async fn health_reports_vector_count() {
        let fx = fixture(4);
        let response = get(&fx.router, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok", "vectors": 4}));
    }

    #[tokio::test]
    async fn serves_static_and_media_files() {
        let fx = fixture(1);
        assert_eq!(get(&fx.router, "/static/index.html").await.status(), StatusCode::OK);
        assert_eq!(get(&fx.router, "/media/film.mp4").await.status(), StatusCode::OK);
        assert_eq!(get(&fx.router, "/media/missing.mp4").await.status(), StatusCode::NOT_FOUND);
    }
}
