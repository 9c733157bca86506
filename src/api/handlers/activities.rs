use super::{Body, deleted, path_id, require_project};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::database::ActivityDao;
use crate::matrix::Activity;
use crate::matrix::validation::ActivityPayload;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;

pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Activity>>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    Ok(Json(
        ActivityDao::list_for_project(&state.db, project.id).await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<ActivityPayload>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let Json(payload) = body?;
    let input = payload.validate()?;
    let activity = ActivityDao::create(&state.db, project.id, &input).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn get(
    State(state): State<AppState>,
    Path((id, activity_id)): Path<(String, String)>,
) -> ApiResult<Json<Activity>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let activity_id = path_id("activityId", &activity_id)?;
    let activity = ActivityDao::find_in_project(&state.db, project.id, activity_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Activity"))?;
    Ok(Json(activity))
}

pub async fn replace(
    State(state): State<AppState>,
    Path((id, activity_id)): Path<(String, String)>,
    body: Body<ActivityPayload>,
) -> ApiResult<Json<Activity>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let activity_id = path_id("activityId", &activity_id)?;
    let Json(payload) = body?;
    let input = payload.validate()?;
    let activity = ActivityDao::replace(&state.db, project.id, activity_id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Activity"))?;
    Ok(Json(activity))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((id, activity_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let activity_id = path_id("activityId", &activity_id)?;
    if !ActivityDao::delete(&state.db, project.id, activity_id).await? {
        return Err(ApiError::not_found("Activity"));
    }
    Ok(deleted("Activity"))
}
