// Gatehouse API server
// Decision: Missing DATABASE_URL / REDIS_URL fall back to in-memory dev
// backends so the server runs with no external services
// Decision: Rate limiting belongs to the transport boundary (reverse proxy),
// not to this process

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gatehouse::auth::{routes, AuthConfig, AuthState};
use gatehouse::mail::Mailer;
use gatehouse::session::SessionStore;
use gatehouse::storage::StorageBackend;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        gatehouse::auth::routes::register,
        gatehouse::auth::routes::login,
        gatehouse::auth::routes::logout,
        gatehouse::auth::routes::me,
        gatehouse::auth::routes::confirm_email,
    ),
    components(schemas(
        routes::RegisterRequest,
        routes::LoginRequest,
        routes::UserResponse,
        routes::MeResponse,
        gatehouse::auth::error::ErrorResponse,
    )),
    tags(
        (name = "auth", description = "Account and session endpoints")
    ),
    info(
        title = "Gatehouse API",
        version = "0.1.0",
        description = "Accounts, sessions, and OAuth account linking"
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        )
        .init();

    tracing::info!("gatehouse starting...");

    let config = AuthConfig::from_env();
    tracing::info!(
        oauth = config.oauth_enabled(),
        session_ttl_secs = config.session_ttl.as_secs(),
        "Authentication configured"
    );

    // Account store: PostgreSQL in production, in-memory for dev mode
    let db = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let db = StorageBackend::postgres(&url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            db
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (dev mode)");
            StorageBackend::in_memory()
        }
    };

    // Session store: Redis in production, in-memory for dev mode
    let sessions = match std::env::var("REDIS_URL") {
        Ok(url) => {
            let sessions = SessionStore::redis(&url, config.session_ttl)
                .await
                .context("Failed to connect to Redis")?;
            tracing::info!("Connected to Redis session store");
            sessions
        }
        Err(_) => {
            tracing::warn!("REDIS_URL not set, using in-memory sessions (dev mode)");
            SessionStore::in_memory(config.session_ttl)
        }
    };

    let mailer = match std::env::var("RESEND_API_KEY") {
        Ok(key) if !key.is_empty() => {
            let from = std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Gatehouse <noreply@localhost>".to_string());
            tracing::info!("Resend mailer configured");
            Mailer::resend(key, from)
        }
        _ => {
            tracing::warn!("RESEND_API_KEY not set, confirmation links go to the log");
            Mailer::console()
        }
    };

    let state = AuthState::new(config, db, sessions, mailer);

    let app = gatehouse::app(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Load CORS allowed origins from environment (optional)
    // Only needed when the front-end is served from a different origin.
    // Credentials must be allowed because auth rides on the session cookie.
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    let app = if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
                .allow_credentials(true),
        )
    };

    let app = app.layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4000);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
