use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::google_books::GoogleBooksClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::IngestService;

mod assets;
mod books;
mod error;
mod ingest;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub ingest_service: Arc<IngestService>,
}

impl AppState {
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn ingest_service(&self) -> &Arc<IngestService> {
        &self.ingest_service
    }
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let client = Arc::new(GoogleBooksClient::new(&config.source)?);
    let ingest_service = Arc::new(IngestService::new(
        store.clone(),
        client,
        config.ingest.clone(),
    ));

    Ok(Arc::new(AppState {
        config,
        store,
        ingest_service,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/books", get(books::list_books))
        .route("/books/{book_id}", get(books::get_book))
        .route("/db", post(ingest::trigger_ingest))
        .fallback(assets::serve_asset)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
