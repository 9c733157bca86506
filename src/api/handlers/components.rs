use super::{Body, deleted, path_id, require_project};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::database::ComponentDao;
use crate::matrix::EnvironmentalComponent;
use crate::matrix::validation::ComponentPayload;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<EnvironmentalComponent>>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    Ok(Json(
        ComponentDao::list_for_project(&state.db, project.id).await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<ComponentPayload>,
) -> ApiResult<(StatusCode, Json<EnvironmentalComponent>)> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let Json(payload) = body?;
    let input = payload.validate()?;
    let component = ComponentDao::create(&state.db, project.id, &input).await?;
    Ok((StatusCode::CREATED, Json(component)))
}

pub async fn get(
    State(state): State<AppState>,
    Path((id, component_id)): Path<(String, String)>,
) -> ApiResult<Json<EnvironmentalComponent>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let component_id = path_id("componentId", &component_id)?;
    let component = ComponentDao::find_in_project(&state.db, project.id, component_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Environmental component"))?;
    Ok(Json(component))
}

pub async fn replace(
    State(state): State<AppState>,
    Path((id, component_id)): Path<(String, String)>,
    body: Body<ComponentPayload>,
) -> ApiResult<Json<EnvironmentalComponent>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let component_id = path_id("componentId", &component_id)?;
    let Json(payload) = body?;
    let input = payload.validate()?;
    let component = ComponentDao::replace(&state.db, project.id, component_id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Environmental component"))?;
    Ok(Json(component))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((id, component_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let component_id = path_id("componentId", &component_id)?;
    if !ComponentDao::delete(&state.db, project.id, component_id).await? {
        return Err(ApiError::not_found("Environmental component"));
    }
    Ok(deleted("Environmental component"))
}
