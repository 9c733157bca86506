use super::{Body, deleted, path_id};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::database::ProjectDao;
use crate::matrix::validation::ProjectPayload;
use crate::matrix::{Project, ProjectDetail};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(ProjectDao::list(&state.db).await?))
}

pub async fn create(
    State(state): State<AppState>,
    body: Body<ProjectPayload>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(payload) = body?;
    let input = payload.validate()?;
    let project = ProjectDao::create(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectDetail>> {
    let id = path_id("id", &id)?;
    let detail = ProjectDao::detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok(Json(detail))
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<ProjectPayload>,
) -> ApiResult<Json<Project>> {
    let id = path_id("id", &id)?;
    let Json(payload) = body?;
    let input = payload.validate()?;
    let project = ProjectDao::replace(&state.db, id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    Ok(Json(project))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = path_id("id", &id)?;
    if !ProjectDao::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Project"));
    }
    Ok(deleted("Project"))
}
