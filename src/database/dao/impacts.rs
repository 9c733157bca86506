use crate::database::conversions::{
    activity_from_model, component_from_model, impact_from_model, new_impact_active_model,
};
use crate::database::dao::{ActivityDao, ComponentDao};
use crate::database::entities::impact;
use crate::database::entities::{ActivityEntity, ComponentEntity, ImpactEntity};
use crate::matrix::{Impact, ImpactDetail, NewImpact};
use anyhow::{Context, Result, anyhow};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ImpactDao;

impl ImpactDao {
    /// Impacts of a project, most important first, each with its activity
    /// and component embedded.
    pub async fn list_for_project<C>(conn: &C, project_id: Uuid) -> Result<Vec<ImpactDetail>>
    where
        C: ConnectionTrait,
    {
        let activities: HashMap<_, _> = ActivityDao::list_for_project(conn, project_id)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let components: HashMap<_, _> = ComponentDao::list_for_project(conn, project_id)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let models = ImpactEntity::find()
            .filter(impact::Column::ProjectId.eq(project_id))
            .order_by_desc(impact::Column::Importance)
            .order_by_asc(impact::Column::CreatedAt)
            .all(conn)
            .await
            .context("Failed to list impacts")?;

        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let impact = impact_from_model(model);
            let (Some(activity), Some(component)) = (
                activities.get(&impact.activity_id),
                components.get(&impact.environmental_component_id),
            ) else {
                warn!(impact_id=%impact.id, project_id=%project_id, "impact references a record outside its project, skipping");
                continue;
            };
            out.push(ImpactDetail {
                activity: activity.clone(),
                environmental_component: component.clone(),
                impact,
            });
        }
        Ok(out)
    }

    pub async fn find<C>(conn: &C, id: Uuid) -> Result<Option<Impact>>
    where
        C: ConnectionTrait,
    {
        let model = ImpactEntity::find_by_id(id)
            .one(conn)
            .await
            .context("Failed to load impact")?;
        Ok(model.map(impact_from_model))
    }

    pub async fn find_in_project<C>(conn: &C, project_id: Uuid, id: Uuid) -> Result<Option<Impact>>
    where
        C: ConnectionTrait,
    {
        let model = Self::find_model(conn, project_id, id).await?;
        Ok(model.map(impact_from_model))
    }

    async fn find_model<C>(conn: &C, project_id: Uuid, id: Uuid) -> Result<Option<impact::Model>>
    where
        C: ConnectionTrait,
    {
        ImpactEntity::find_by_id(id)
            .filter(impact::Column::ProjectId.eq(project_id))
            .one(conn)
            .await
            .context("Failed to load impact")
    }

    /// Embeds the activity and component an impact links.
    pub async fn detail<C>(conn: &C, impact: Impact) -> Result<ImpactDetail>
    where
        C: ConnectionTrait,
    {
        let activity = ActivityEntity::find_by_id(impact.activity_id)
            .one(conn)
            .await
            .context("Failed to load impact activity")?
            .ok_or_else(|| anyhow!("impact {} has no activity", impact.id))?;
        let component = ComponentEntity::find_by_id(impact.environmental_component_id)
            .one(conn)
            .await
            .context("Failed to load impact component")?
            .ok_or_else(|| anyhow!("impact {} has no environmental component", impact.id))?;
        Ok(ImpactDetail {
            activity: activity_from_model(activity)?,
            environmental_component: component_from_model(component)?,
            impact,
        })
    }

    /// The impact occupying a matrix cell, if any.
    pub async fn find_by_cell<C>(
        conn: &C,
        activity_id: Uuid,
        environmental_component_id: Uuid,
    ) -> Result<Option<Impact>>
    where
        C: ConnectionTrait,
    {
        let model = ImpactEntity::find()
            .filter(impact::Column::ActivityId.eq(activity_id))
            .filter(impact::Column::EnvironmentalComponentId.eq(environmental_component_id))
            .one(conn)
            .await
            .context("Failed to load impact by cell")?;
        Ok(model.map(impact_from_model))
    }

    pub async fn create<C>(conn: &C, project_id: Uuid, input: &NewImpact) -> Result<Impact>
    where
        C: ConnectionTrait,
    {
        let model = new_impact_active_model(project_id, input)
            .insert(conn)
            .await
            .context("Failed to insert impact")?;
        info!(
            project_id=%project_id,
            impact_id=%model.id,
            magnitude = model.magnitude,
            importance = model.importance,
            "impact created"
        );
        Ok(impact_from_model(model))
    }

    /// Full replacement. Moving the impact to another cell drops the stored
    /// analysis, which described the old pair.
    pub async fn replace<C>(
        conn: &C,
        project_id: Uuid,
        id: Uuid,
        input: &NewImpact,
    ) -> Result<Option<Impact>>
    where
        C: ConnectionTrait,
    {
        let Some(model) = Self::find_model(conn, project_id, id).await? else {
            return Ok(None);
        };
        let moved = model.activity_id != input.activity_id
            || model.environmental_component_id != input.environmental_component_id;
        let mut active = model.into_active_model();
        active.activity_id = Set(input.activity_id);
        active.environmental_component_id = Set(input.environmental_component_id);
        active.magnitude = Set(input.magnitude);
        active.importance = Set(input.importance);
        active.description = Set(input.description.clone());
        active.mitigation_measures = Set(input.mitigation_measures.clone());
        if moved {
            active.ai_analysis = Set(None);
        }
        let model = active
            .update(conn)
            .await
            .context("Failed to update impact")?;
        Ok(Some(impact_from_model(model)))
    }

    /// Stores the generated analysis text and mitigation list on an impact.
    pub async fn record_analysis<C>(
        conn: &C,
        id: Uuid,
        ai_analysis: String,
        mitigation_measures: Option<String>,
    ) -> Result<Option<Impact>>
    where
        C: ConnectionTrait,
    {
        let Some(model) = ImpactEntity::find_by_id(id)
            .one(conn)
            .await
            .context("Failed to load impact")?
        else {
            return Ok(None);
        };
        let mut active = model.into_active_model();
        active.ai_analysis = Set(Some(ai_analysis));
        active.mitigation_measures = Set(mitigation_measures);
        let model = active
            .update(conn)
            .await
            .context("Failed to store impact analysis")?;
        Ok(Some(impact_from_model(model)))
    }

    pub async fn delete<C>(conn: &C, project_id: Uuid, id: Uuid) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let res = ImpactEntity::delete_many()
            .filter(impact::Column::Id.eq(id))
            .filter(impact::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await
            .context("Failed to delete impact")?;
        Ok(res.rows_affected > 0)
    }

    /// Replaces every impact of a project as one unit: either the old set
    /// survives or the new one is fully stored.
    pub async fn replace_for_project<C>(
        conn: &C,
        project_id: Uuid,
        impacts: &[NewImpact],
    ) -> Result<Vec<Impact>>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let txn = conn
            .begin()
            .await
            .context("Failed to start database transaction")?;

        let removed = ImpactEntity::delete_many()
            .filter(impact::Column::ProjectId.eq(project_id))
            .exec(&txn)
            .await
            .context("Failed to clear project impacts")?;

        let mut created = Vec::with_capacity(impacts.len());
        for input in impacts {
            let model = new_impact_active_model(project_id, input)
                .insert(&txn)
                .await
                .context("Failed to insert impact")?;
            created.push(impact_from_model(model));
        }

        txn.commit()
            .await
            .context("Failed to commit database transaction")?;

        info!(
            project_id=%project_id,
            removed = removed.rows_affected,
            created = created.len(),
            "project impacts replaced"
        );
        Ok(created)
    }
}
