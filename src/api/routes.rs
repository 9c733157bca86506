use crate::api::handlers::{activities, analysis, components, health, impacts, projects};
use crate::api::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Projects
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/:id",
            get(projects::get)
                .put(projects::replace)
                .delete(projects::delete),
        )
        // Matrix rows and columns
        .route(
            "/projects/:id/activities",
            get(activities::list).post(activities::create),
        )
        .route(
            "/projects/:id/activities/:activity_id",
            get(activities::get)
                .put(activities::replace)
                .delete(activities::delete),
        )
        .route(
            "/projects/:id/components",
            get(components::list).post(components::create),
        )
        .route(
            "/projects/:id/components/:component_id",
            get(components::get)
                .put(components::replace)
                .delete(components::delete),
        )
        // Matrix cells
        .route(
            "/projects/:id/impacts",
            get(impacts::list).post(impacts::create),
        )
        .route("/projects/:id/impacts/evaluate", post(analysis::evaluate))
        .route(
            "/projects/:id/impacts/:impact_id",
            get(impacts::get)
                .put(impacts::replace)
                .delete(impacts::delete),
        )
        // Generative analysis
        .route("/projects/:id/analyze", post(analysis::analyze_project))
        .route("/projects/:id/pges", post(analysis::generate_pges))
        .route("/impacts/analyze", post(analysis::analyze_impact))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
