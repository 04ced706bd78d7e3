//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        auth::HostedAuthAdapter, category_llm::OpenAiCategoryAdapter, db::PgArchiveStore,
        email::FormRelayEmailAdapter, expansion_llm::OpenAiExpansionAdapter,
        kv::FileRecipientStore, polish_llm::OpenAiPolishAdapter, stt::OpenAiSttAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        history_handler, logout_handler, magic_link_handler, middleware::require_auth,
        rest::ApiDoc, state::AppState, ws_handler,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
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

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let archive_store = Arc::new(PgArchiveStore::new(db_pool.clone()));
    info!("Running database migrations...");
    archive_store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let polish_adapter = Arc::new(OpenAiPolishAdapter::new(
        openai_client.clone(),
        config.polish_model.clone(),
    ));
    let expansion_adapter = Arc::new(OpenAiExpansionAdapter::new(
        openai_client.clone(),
        config.expansion_model.clone(),
    ));
    let category_adapter = Arc::new(OpenAiCategoryAdapter::new(
        openai_client.clone(),
        config.category_model.clone(),
    ));
    let stt_adapter = Arc::new(OpenAiSttAdapter::new(
        openai_client.clone(),
        config.transcription_model.clone(),
    ));

    let http_client = reqwest::Client::new();
    let auth_adapter = Arc::new(HostedAuthAdapter::new(
        http_client.clone(),
        config.auth_base_url.clone(),
        config.auth_anon_key.clone(),
    ));
    let email_adapter = Arc::new(FormRelayEmailAdapter::new(
        http_client,
        config.email_endpoint.clone(),
        config.email_access_key.clone(),
        config.email_from_name.clone(),
    ));
    let recipient_store = Arc::new(FileRecipientStore::new(
        config.default_recipient_path.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        auth: auth_adapter,
        archive: archive_store,
        polisher: polish_adapter,
        expander: expansion_adapter,
        classifier: category_adapter,
        transcriber: stt_adapter,
        email: email_adapter,
        recipient_store,
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required). The websocket authenticates itself
    // via its init message, so it stays public too.
    let public_routes = Router::new()
        .route("/auth/magic-link", post(magic_link_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/ws", get(ws_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/history", get(history_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
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
