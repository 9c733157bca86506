pub mod activities;
pub mod analysis;
pub mod components;
pub mod impacts;
pub mod projects;

use crate::api::error::{ApiError, ApiResult};
use crate::database::ProjectDao;
use crate::matrix::Project;
use crate::matrix::validation::parse_id;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// A JSON body whose decoding failure is reported as a field error.
pub(crate) type Body<T> = Result<Json<T>, JsonRejection>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) fn path_id(field: &str, raw: &str) -> ApiResult<Uuid> {
    Ok(parse_id(field, raw)?)
}

pub(crate) async fn require_project(db: &DatabaseConnection, id: Uuid) -> ApiResult<Project> {
    ProjectDao::find(db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

pub(crate) fn deleted(what: &str) -> Json<Value> {
    Json(json!({ "message": format!("{what} deleted") }))
}
