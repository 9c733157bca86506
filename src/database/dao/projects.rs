use crate::database::conversions::{new_project_active_model, project_from_model};
use crate::database::dao::{ActivityDao, ComponentDao, ImpactDao};
use crate::database::entities::{ActivityEntity, ComponentEntity, ImpactEntity, ProjectEntity};
use crate::database::entities::{activity, environmental_component, impact, project};
use crate::matrix::{NewProject, Project, ProjectDetail};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};
use uuid::Uuid;

pub struct ProjectDao;

impl ProjectDao {
    /// All projects, newest first.
    pub async fn list<C>(conn: &C) -> Result<Vec<Project>>
    where
        C: ConnectionTrait,
    {
        let models = ProjectEntity::find()
            .order_by_desc(project::Column::CreatedAt)
            .order_by_asc(project::Column::Name)
            .all(conn)
            .await
            .context("Failed to list projects")?;
        Ok(models.into_iter().map(project_from_model).collect())
    }

    pub async fn find<C>(conn: &C, id: Uuid) -> Result<Option<Project>>
    where
        C: ConnectionTrait,
    {
        let model = ProjectEntity::find_by_id(id)
            .one(conn)
            .await
            .context("Failed to load project")?;
        Ok(model.map(project_from_model))
    }

    pub async fn create<C>(conn: &C, input: &NewProject) -> Result<Project>
    where
        C: ConnectionTrait,
    {
        let model = new_project_active_model(input)
            .insert(conn)
            .await
            .context("Failed to insert project")?;
        info!(project_id=%model.id, name=%model.name, "project created");
        Ok(project_from_model(model))
    }

    /// Full replacement of the editable fields. `None` when the project does not exist.
    pub async fn replace<C>(conn: &C, id: Uuid, input: &NewProject) -> Result<Option<Project>>
    where
        C: ConnectionTrait,
    {
        let Some(model) = ProjectEntity::find_by_id(id)
            .one(conn)
            .await
            .context("Failed to load project")?
        else {
            return Ok(None);
        };
        let mut active = model.into_active_model();
        active.name = Set(input.name.clone());
        active.description = Set(input.description.clone());
        let model = active
            .update(conn)
            .await
            .context("Failed to update project")?;
        Ok(Some(project_from_model(model)))
    }

    /// Deletes a project and everything it owns. Returns `false` when the
    /// project does not exist.
    pub async fn delete<C>(conn: &C, id: Uuid) -> Result<bool>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let txn = conn
            .begin()
            .await
            .context("Failed to start database transaction")?;

        // Children first; the declared cascades cover the same rows.
        let impacts = ImpactEntity::delete_many()
            .filter(impact::Column::ProjectId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete project impacts")?;
        let activities = ActivityEntity::delete_many()
            .filter(activity::Column::ProjectId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete project activities")?;
        let components = ComponentEntity::delete_many()
            .filter(environmental_component::Column::ProjectId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete project components")?;
        let deleted = ProjectEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete project")?;

        txn.commit()
            .await
            .context("Failed to commit database transaction")?;

        if deleted.rows_affected == 0 {
            debug!(project_id=%id, "project not found for deletion");
            return Ok(false);
        }
        info!(
            project_id=%id,
            activities = activities.rows_affected,
            components = components.rows_affected,
            impacts = impacts.rows_affected,
            "project deleted"
        );
        Ok(true)
    }

    /// The project with its activities, components and embedded impacts.
    pub async fn detail<C>(conn: &C, id: Uuid) -> Result<Option<ProjectDetail>>
    where
        C: ConnectionTrait,
    {
        let Some(project) = Self::find(conn, id).await? else {
            return Ok(None);
        };
        let activities = ActivityDao::list_for_project(conn, id).await?;
        let components = ComponentDao::list_for_project(conn, id).await?;
        let impacts = ImpactDao::list_for_project(conn, id).await?;
        Ok(Some(ProjectDetail {
            project,
            activities,
            components,
            impacts,
        }))
    }
}
