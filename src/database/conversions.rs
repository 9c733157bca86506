//! Mapping between sea-orm models and the matrix domain records.
use crate::database::entities::{activity, environmental_component, impact, project};
use crate::matrix::{
    Activity, Category, EnvironmentalComponent, Impact, NewActivity, NewComponent, NewImpact,
    NewProject, Phase, Project,
};
use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::Set;
use uuid::Uuid;

pub fn project_from_model(model: project::Model) -> Project {
    Project {
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at,
    }
}

pub fn new_project_active_model(input: &NewProject) -> project::ActiveModel {
    project::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.clone()),
        description: Set(input.description.clone()),
        created_at: Set(Utc::now()),
    }
}

pub fn activity_from_model(model: activity::Model) -> Result<Activity> {
    let phase = model
        .phase
        .parse::<Phase>()
        .map_err(|e| anyhow!("activity {}: {e}", model.id))?;
    Ok(Activity {
        id: model.id,
        project_id: model.project_id,
        name: model.name,
        description: model.description,
        phase,
        created_at: model.created_at,
    })
}

pub fn new_activity_active_model(project_id: Uuid, input: &NewActivity) -> activity::ActiveModel {
    activity::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        name: Set(input.name.clone()),
        description: Set(input.description.clone()),
        phase: Set(input.phase.as_str().to_string()),
        created_at: Set(Utc::now()),
    }
}

pub fn component_from_model(model: environmental_component::Model) -> Result<EnvironmentalComponent> {
    let category = model
        .category
        .parse::<Category>()
        .map_err(|e| anyhow!("environmental component {}: {e}", model.id))?;
    Ok(EnvironmentalComponent {
        id: model.id,
        project_id: model.project_id,
        name: model.name,
        description: model.description,
        category,
        created_at: model.created_at,
    })
}

pub fn new_component_active_model(
    project_id: Uuid,
    input: &NewComponent,
) -> environmental_component::ActiveModel {
    environmental_component::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        name: Set(input.name.clone()),
        description: Set(input.description.clone()),
        category: Set(input.category.as_str().to_string()),
        created_at: Set(Utc::now()),
    }
}

pub fn impact_from_model(model: impact::Model) -> Impact {
    Impact {
        id: model.id,
        project_id: model.project_id,
        activity_id: model.activity_id,
        environmental_component_id: model.environmental_component_id,
        magnitude: model.magnitude,
        importance: model.importance,
        description: model.description,
        mitigation_measures: model.mitigation_measures,
        ai_analysis: model.ai_analysis,
        created_at: model.created_at,
    }
}

pub fn new_impact_active_model(
    project_id: Uuid,
    input: &NewImpact,
) -> impact::ActiveModel {
    impact::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        activity_id: Set(input.activity_id),
        environmental_component_id: Set(input.environmental_component_id),
        magnitude: Set(input.magnitude),
        importance: Set(input.importance),
        description: Set(input.description.clone()),
        mitigation_measures: Set(input.mitigation_measures.clone()),
        ai_analysis: Set(None),
        created_at: Set(Utc::now()),
    }
}
