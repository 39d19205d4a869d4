//! ValueQuest HTTP server: lessons, quizzes, XP, badges, class challenges,
//! sign-ins and notifications over SQLite.

pub mod config;
pub mod error;
pub mod gamification;
pub mod routes;
pub mod storage;

use axum::{
    Router,
    extract::FromRef,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{AppConfig, ServerArgs};
pub use storage::{Db, init_db};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Build the full router, with every API route nested under `/api`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Health
        .route("/health", get(routes::health::health))
        // Profile
        .route(
            "/me",
            get(routes::users::get_me).put(routes::users::update_me),
        )
        // Lessons
        .route(
            "/lessons",
            get(routes::lessons::list_lessons).post(routes::lessons::create_lesson),
        )
        .route(
            "/lessons/{id}",
            get(routes::lessons::get_lesson)
                .put(routes::lessons::update_lesson)
                .delete(routes::lessons::delete_lesson),
        )
        .route(
            "/lessons/{id}/quiz",
            get(routes::quizzes::get_quiz).post(routes::quizzes::submit_quiz),
        )
        // Progress + XP
        .route("/complete-lesson", post(routes::progress::complete_lesson))
        .route("/progress", get(routes::progress::list_progress))
        .route("/xp", get(routes::xp::get_xp))
        .route("/leaderboard", get(routes::xp::leaderboard))
        // Badges
        .route("/badges", get(routes::badges::list_badges))
        .route(
            "/user/achievements/{id}",
            get(routes::badges::achievements),
        )
        .route("/award-badge", post(routes::badges::award_badge))
        // Sign-ins
        .route("/signin", post(routes::signins::signin))
        .route("/signin/streak", get(routes::signins::streak))
        // Challenges
        .route(
            "/challenges",
            get(routes::challenges::list_challenges).post(routes::challenges::create_challenge),
        )
        .route("/challenges/{id}", get(routes::challenges::get_challenge))
        // Notifications
        .route(
            "/notifications",
            get(routes::notifications::list_notifications)
                .post(routes::notifications::create_notification),
        )
        .route(
            "/notifications/read-all",
            put(routes::notifications::mark_all_read),
        )
        .route(
            "/notifications/{id}",
            put(routes::notifications::update_notification)
                .delete(routes::notifications::delete_notification),
        );

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
