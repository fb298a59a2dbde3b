use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use quorum_api::auth::{self, AppState, AppStateInner};
use quorum_api::middleware::require_auth;
use quorum_api::{admin, answers, notifications, platform, questions, tags, votes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quorum=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUORUM_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUORUM_DB_PATH").unwrap_or_else(|_| "quorum.db".into());
    let host = std::env::var("QUORUM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUORUM_PORT")
        .unwrap_or_else(|_| "3001".into())
        .parse()?;
    let admin_password =
        std::env::var("QUORUM_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());

    // Init database
    let db = quorum_db::Database::open(&PathBuf::from(&db_path))?;
    auth::ensure_admin(&db, &admin_password)?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/questions", get(questions::list_questions))
        .route("/api/questions/{question_id}", get(questions::get_question))
        .route(
            "/api/questions/{question_id}/answers",
            get(answers::list_answers),
        )
        .route("/api/tags", get(tags::list_tags))
        .route(
            "/api/platform-messages",
            get(platform::list_platform_messages),
        )
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/api/questions", post(questions::create_question))
        .route(
            "/api/questions/{question_id}/answers",
            post(answers::create_answer),
        )
        .route("/api/answers/{answer_id}/accept", post(answers::accept_answer))
        .route("/api/vote", post(votes::cast_vote))
        .route("/api/notifications", get(notifications::list_notifications))
        .route(
            "/api/notifications/{notification_id}/read",
            post(notifications::mark_read),
        )
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{user_id}/ban", post(admin::ban_user))
        .route(
            "/api/platform-messages",
            post(platform::create_platform_message),
        )
        .route(
            "/api/platform-messages/{message_id}",
            put(platform::set_platform_message_active)
                .delete(platform::delete_platform_message),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quorum server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
