//! Routes that call the generative analyst. Each one makes a single model
//! call and blocks until it answers.

use super::impacts::resolve_cell;
use super::{Body, path_id, require_project};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::assessment::{
    ImpactAnalysis, ImpactAnalysisRequest, ImpactAssessment, Pges, PgesImpact, PgesRequest,
    ProjectAnalysisRequest, SuggestedImpact,
};
use crate::database::{ActivityDao, ComponentDao, ImpactDao};
use crate::matrix::validation::{CellPayload, ImpactAnalysisPayload, validate_scores};
use crate::matrix::{
    Activity, Category, EnvironmentalComponent, ImpactDetail, NewImpact, Phase,
};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

/// A model suggestion annotated with the records its ids resolve to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedSuggestion {
    #[serde(flatten)]
    pub suggestion: SuggestedImpact,
    pub activity_name: Option<String>,
    pub component_name: Option<String>,
    pub activity_phase: Option<Phase>,
    pub component_category: Option<Category>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalysisResponse {
    pub message: String,
    pub summary: String,
    pub suggested_impacts: Vec<AnnotatedSuggestion>,
    pub created_impacts: Vec<ImpactDetail>,
    /// Suggestions that could not be stored.
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct PgesResponse {
    pub message: String,
    pub pges: Pges,
}

#[derive(Debug, Serialize)]
pub struct ImpactAnalysisResponse {
    pub impact: ImpactDetail,
    pub analysis: ImpactAnalysis,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub activity_id: Uuid,
    pub environmental_component_id: Uuid,
    pub analysis: ImpactAnalysis,
}

/// `POST /projects/:id/analyze`: asks the model for every significant
/// interaction and replaces the project's impacts with the usable ones.
pub async fn analyze_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectAnalysisResponse>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let analyst = state.analyst()?;
    let activities = ActivityDao::list_for_project(&state.db, project.id).await?;
    let components = ComponentDao::list_for_project(&state.db, project.id).await?;

    let analysis = analyst
        .analyze_project(&ProjectAnalysisRequest {
            project_name: project.name.clone(),
            project_description: project.description.clone(),
            activities: activities.clone(),
            components: components.clone(),
        })
        .await
        .map_err(ApiError::Upstream)?;

    let activities: HashMap<Uuid, Activity> =
        activities.into_iter().map(|a| (a.id, a)).collect();
    let components: HashMap<Uuid, EnvironmentalComponent> =
        components.into_iter().map(|c| (c.id, c)).collect();

    let inputs = usable_suggestions(&analysis.suggested_impacts, &activities, &components);
    let skipped = analysis.suggested_impacts.len() - inputs.len();
    let created = ImpactDao::replace_for_project(&state.db, project.id, &inputs).await?;

    let created_impacts = created
        .into_iter()
        .filter_map(|impact| {
            let activity = activities.get(&impact.activity_id)?.clone();
            let component = components.get(&impact.environmental_component_id)?.clone();
            Some(ImpactDetail {
                impact,
                activity,
                environmental_component: component,
            })
        })
        .collect::<Vec<_>>();

    let suggested_impacts = analysis
        .suggested_impacts
        .into_iter()
        .map(|suggestion| {
            let activity = lookup(&activities, &suggestion.activity_id);
            let component = lookup(&components, &suggestion.component_id);
            AnnotatedSuggestion {
                activity_name: activity.map(|a| a.name.clone()),
                activity_phase: activity.map(|a| a.phase),
                component_name: component.map(|c| c.name.clone()),
                component_category: component.map(|c| c.category),
                suggestion,
            }
        })
        .collect();

    info!(
        project_id=%project.id,
        created = created_impacts.len(),
        skipped,
        "project analysis stored"
    );
    Ok(Json(ProjectAnalysisResponse {
        message: format!("Project analysed, {} impacts created", created_impacts.len()),
        summary: analysis.summary,
        suggested_impacts,
        created_impacts,
        skipped,
    }))
}

fn lookup<'a, T>(records: &'a HashMap<Uuid, T>, raw_id: &str) -> Option<&'a T> {
    Uuid::parse_str(raw_id.trim())
        .ok()
        .and_then(|id| records.get(&id))
}

/// Keeps suggestions whose ids resolve inside the project and whose scores
/// pass the impact rules. The first suggestion for a cell wins.
fn usable_suggestions(
    suggestions: &[SuggestedImpact],
    activities: &HashMap<Uuid, Activity>,
    components: &HashMap<Uuid, EnvironmentalComponent>,
) -> Vec<NewImpact> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for s in suggestions {
        let (Some(activity), Some(component)) = (
            lookup(activities, &s.activity_id),
            lookup(components, &s.component_id),
        ) else {
            warn!(
                activity_id = %s.activity_id,
                component_id = %s.component_id,
                "suggested impact references an unknown activity or component, skipping"
            );
            continue;
        };
        let (magnitude, importance) =
            match validate_scores(i64::from(s.magnitude), i64::from(s.importance)) {
                Ok(scores) => scores,
                Err(errors) => {
                    warn!(
                        activity_id = %activity.id,
                        component_id = %component.id,
                        %errors,
                        "suggested impact has invalid scores, skipping"
                    );
                    continue;
                }
            };
        if !seen.insert((activity.id, component.id)) {
            warn!(
                activity_id = %activity.id,
                component_id = %component.id,
                "duplicate suggestion for a matrix cell, skipping"
            );
            continue;
        }
        let justification = s.justification.trim();
        out.push(NewImpact {
            activity_id: activity.id,
            environmental_component_id: component.id,
            magnitude,
            importance,
            description: (!justification.is_empty()).then(|| justification.to_string()),
            mitigation_measures: None,
        });
    }
    out
}

/// `POST /projects/:id/pges`: drafts the environmental management plan from
/// the impacts already recorded.
pub async fn generate_pges(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PgesResponse>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let impacts = ImpactDao::list_for_project(&state.db, project.id).await?;
    if impacts.is_empty() {
        return Err(ApiError::BadRequest(
            "The project has no impacts to build a management plan from".to_string(),
        ));
    }
    let analyst = state.analyst()?;

    let request = PgesRequest {
        project_name: project.name.clone(),
        project_description: project.description.clone(),
        impacts: impacts
            .into_iter()
            .map(|d| PgesImpact {
                activity_name: d.activity.name,
                activity_phase: d.activity.phase,
                component_name: d.environmental_component.name,
                component_category: d.environmental_component.category,
                magnitude: d.impact.magnitude,
                importance: d.impact.importance,
                analysis: d.impact.ai_analysis,
            })
            .collect(),
    };
    let pges = analyst
        .generate_pges(&request)
        .await
        .map_err(ApiError::Upstream)?;

    info!(
        project_id=%project.id,
        prioritized = pges.prioritized_impacts.len(),
        recommendations = pges.recommendations.len(),
        monitoring = pges.monitoring_plan.len(),
        "management plan generated"
    );
    Ok(Json(PgesResponse {
        message: "Management plan generated".to_string(),
        pges,
    }))
}

/// `POST /impacts/analyze`: justifies a recorded impact and stores the
/// analysis and mitigation measures on it.
pub async fn analyze_impact(
    State(state): State<AppState>,
    body: Body<ImpactAnalysisPayload>,
) -> ApiResult<Json<ImpactAnalysisResponse>> {
    let Json(payload) = body?;
    let impact_id = payload.validate()?;
    let impact = ImpactDao::find(&state.db, impact_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Impact"))?;
    let analyst = state.analyst()?;
    let detail = ImpactDao::detail(&state.db, impact).await?;

    let request = ImpactAnalysisRequest::for_pair(
        &detail.activity,
        &detail.environmental_component,
        ImpactAssessment::Scored {
            magnitude: detail.impact.magnitude,
            importance: detail.impact.importance,
        },
    );
    let analysis = analyst
        .analyze_impact(&request)
        .await
        .map_err(ApiError::Upstream)?;

    let mitigation = bullet_list(&analysis.mitigation_measures);
    let impact = ImpactDao::record_analysis(
        &state.db,
        impact_id,
        analysis.analysis.clone(),
        mitigation,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Impact"))?;

    Ok(Json(ImpactAnalysisResponse {
        impact: ImpactDetail { impact, ..detail },
        analysis,
    }))
}

/// `POST /projects/:id/impacts/evaluate`: asks the model to score a cell.
/// Nothing is stored.
pub async fn evaluate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<CellPayload>,
) -> ApiResult<Json<EvaluationResponse>> {
    let project = require_project(&state.db, path_id("id", &id)?).await?;
    let Json(payload) = body?;
    let (activity_id, component_id) = payload.validate()?;
    let (activity, component) =
        resolve_cell(&state.db, project.id, activity_id, component_id).await?;
    let analyst = state.analyst()?;

    let request =
        ImpactAnalysisRequest::for_pair(&activity, &component, ImpactAssessment::Unscored);
    let analysis = analyst
        .analyze_impact(&request)
        .await
        .map_err(ApiError::Upstream)?;

    Ok(Json(EvaluationResponse {
        activity_id,
        environmental_component_id: component_id,
        analysis,
    }))
}

fn bullet_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(|m| format!("- {m}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
