use crate::handlers::{
    dashboard::dashboard,
    edit::{edit, edit_page},
    health::health_check,
    login::{login, login_page, logout, logout_done},
    password::{password_change, password_change_done, password_change_page},
    register::{register, register_done, register_page},
};
use crate::schemas::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let timeout = state.settings.request_timeout();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
        .route("/logout_done", get(logout_done))
        // Registration
        .route("/register", get(register_page).post(register))
        .route("/register_done", get(register_done))
        // Logged-in pages
        .route("/", get(dashboard))
        .route("/edit", get(edit_page).post(edit))
        .route("/password_change", get(password_change_page).post(password_change))
        .route("/password_change_done", get(password_change_done))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout)),
        )
        .with_state(state)
}
