use super::{Body, deleted, path_id, require_project};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::database::{ActivityDao, ComponentDao, ImpactDao};
use crate::matrix::validation::ImpactPayload;
use crate::matrix::{Activity, EnvironmentalComponent, ImpactDetail};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use uuid::Uuid;

/// Loads both ends of a matrix cell, each of which must belong to the project.
pub(crate) async fn resolve_cell(
    db: &DatabaseConnection,
    project_id: Uuid,
    activity_id: Uuid,
    component_id: Uuid,
) -> ApiResult<(Activity, EnvironmentalComponent)> {
    let activity = ActivityDao::find_in_project(db, project_id, activity_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Activity"))?;
    let component = ComponentDao::find_in_project(db, project_id, component_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Environmental component"))?;
    Ok((activity, component))
}

pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ImpactDetail>>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    Ok(Json(ImpactDao::list_for_project(&state.db, project.id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<ImpactPayload>,
) -> ApiResult<(StatusCode, Json<ImpactDetail>)> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let Json(payload) = body?;
    let input = payload.validate()?;
    let (activity, component) = resolve_cell(
        &state.db,
        project.id,
        input.activity_id,
        input.environmental_component_id,
    )
    .await?;
    if ImpactDao::find_by_cell(&state.db, activity.id, component.id)
        .await?
        .is_some()
    {
        return Err(ApiError::cell_taken());
    }
    let impact = ImpactDao::create(&state.db, project.id, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ImpactDetail {
            impact,
            activity,
            environmental_component: component,
        }),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path((id, impact_id)): Path<(String, String)>,
) -> ApiResult<Json<ImpactDetail>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let impact_id = path_id("impactId", &impact_id)?;
    let impact = ImpactDao::find_in_project(&state.db, project.id, impact_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Impact"))?;
    Ok(Json(ImpactDao::detail(&state.db, impact).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    Path((id, impact_id)): Path<(String, String)>,
    body: Body<ImpactPayload>,
) -> ApiResult<Json<ImpactDetail>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let impact_id = path_id("impactId", &impact_id)?;
    let Json(payload) = body?;
    let input = payload.validate()?;
    if ImpactDao::find_in_project(&state.db, project.id, impact_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Impact"));
    }
    let (activity, component) = resolve_cell(
        &state.db,
        project.id,
        input.activity_id,
        input.environmental_component_id,
    )
    .await?;
    if let Some(occupant) = ImpactDao::find_by_cell(&state.db, activity.id, component.id).await?
        && occupant.id != impact_id
    {
        return Err(ApiError::cell_taken());
    }
    let impact = ImpactDao::replace(&state.db, project.id, impact_id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Impact"))?;
    Ok(Json(ImpactDetail {
        impact,
        activity,
        environmental_component: component,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((id, impact_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let impact_id = path_id("impactId", &impact_id)?;
    if !ImpactDao::delete(&state.db, project.id, impact_id).await? {
        return Err(ApiError::not_found("Impact"));
    }
    Ok(deleted("Impact"))
}
