// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, data, quiz, topics, user},
    state::AppState,
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

/// Assembles the main application router.
///
/// * Merges the API sub-routers (quiz, topics, admin, user, data).
/// * Serves the three pages and the static data files.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);
    let static_dir = state.config.static_dir.clone();

    let quiz_routes = Router::new()
        .route("/sessions", post(quiz::create_session))
        .route("/link", get(quiz::open_deep_link))
        .route("/themes", get(quiz::list_themes))
        .route(
            "/sessions/{id}",
            get(quiz::get_session).delete(quiz::close_session),
        )
        .route("/sessions/{id}/filter", post(quiz::update_filter))
        .route("/sessions/{id}/language", post(quiz::set_language))
        .route("/sessions/{id}/answer", post(quiz::answer))
        .route("/sessions/{id}/next", post(quiz::next_question))
        .route("/sessions/{id}/progress", get(quiz::progress))
        .route("/sessions/{id}/user", post(quiz::switch_user))
        .route("/sessions/{id}/reset", post(quiz::reset));

    let topic_routes = Router::new()
        .route("/", get(topics::get_catalog))
        .route("/start", post(topics::start_quiz));

    let admin_routes = Router::new()
        .route("/questions", get(admin::list_questions))
        .route("/questions/{id}", get(admin::question_detail))
        .route("/questions/{id}/html", get(admin::question_detail_html))
        .route("/stats", get(admin::stats))
        .route("/learners", get(admin::list_learners))
        .route(
            "/remind",
            get(admin::list_reminder_candidates).post(admin::send_reminders),
        )
        .route("/logs", get(admin::list_notification_logs));

    let api = Router::new()
        .nest("/quiz", quiz_routes)
        .nest("/topics", topic_routes)
        .nest("/admin", admin_routes)
        .route("/user", get(user::get_user).put(user::set_user))
        .route("/questions", get(data::list_questions))
        .route("/data/reload", post(data::reload));

    Router::new()
        .nest("/api", api)
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/quiz", ServeFile::new(static_dir.join("quiz.html")))
        .route_service("/admin", ServeFile::new(static_dir.join("admin.html")))
        .nest_service("/static", ServeDir::new(&static_dir))
        .fallback_service(ServeDir::new(&static_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
