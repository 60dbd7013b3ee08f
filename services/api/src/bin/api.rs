//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{JsonFileStorage, TemplateAnswerAdapter, ThreadRngSource},
    config::Config,
    error::ApiError,
    web::{
        rest::{
            ask_handler, cancel_upload_handler, cycle_theme_handler,
            delete_document_handler, export_document_handler,
            get_document_handler, get_search_handler,
            get_settings_handler, health_handler, list_document_qa_handler,
            list_documents_handler, list_uploads_handler, set_search_handler,
            update_settings_handler, upload_document_handler, ApiDoc,
        },
        AppState,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Persisted Store ---
    info!("Opening data directory {}...", config.data_dir.display());
    let storage = Arc::new(JsonFileStorage::new(config.data_dir.clone())?);

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        storage,
        Arc::new(TemplateAnswerAdapter::new()),
        Arc::new(ThreadRngSource),
    ));
    info!(
        "Store loaded: {} documents, {} Q&A records.",
        app_state.store.documents().len(),
        app_state.store.qa_items().len()
    );

    // --- 4. CORS for the Browser Client ---
    let allowed_origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/documents",
            get(list_documents_handler).post(upload_document_handler),
        )
        .route(
            "/documents/{id}",
            get(get_document_handler).delete(delete_document_handler),
        )
        .route("/documents/{id}/qa", get(list_document_qa_handler))
        .route("/documents/{id}/export", get(export_document_handler))
        .route("/qa", post(ask_handler))
        .route("/uploads", get(list_uploads_handler))
        .route("/uploads/{id}", delete(cancel_upload_handler))
        .route("/search", get(get_search_handler).put(set_search_handler))
        .route(
            "/settings",
            get(get_settings_handler).put(update_settings_handler),
        )
        .route("/settings/theme", post(cycle_theme_handler))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
