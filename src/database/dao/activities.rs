use crate::database::conversions::{activity_from_model, new_activity_active_model};
use crate::database::entities::{ActivityEntity, ImpactEntity};
use crate::database::entities::{activity, impact};
use crate::matrix::{Activity, NewActivity};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

pub struct ActivityDao;

impl ActivityDao {
    /// Activities of a project ordered by name.
    pub async fn list_for_project<C>(conn: &C, project_id: Uuid) -> Result<Vec<Activity>>
    where
        C: ConnectionTrait,
    {
        ActivityEntity::find()
            .filter(activity::Column::ProjectId.eq(project_id))
            .order_by_asc(activity::Column::Name)
            .order_by_asc(activity::Column::CreatedAt)
            .all(conn)
            .await
            .context("Failed to list activities")?
            .into_iter()
            .map(activity_from_model)
            .collect()
    }

    /// The activity, only if it belongs to `project_id`.
    pub async fn find_in_project<C>(
        conn: &C,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Activity>>
    where
        C: ConnectionTrait,
    {
        let model = Self::find_model(conn, project_id, id).await?;
        model.map(activity_from_model).transpose()
    }

    async fn find_model<C>(conn: &C, project_id: Uuid, id: Uuid) -> Result<Option<activity::Model>>
    where
        C: ConnectionTrait,
    {
        ActivityEntity::find_by_id(id)
            .filter(activity::Column::ProjectId.eq(project_id))
            .one(conn)
            .await
            .context("Failed to load activity")
    }

    pub async fn create<C>(conn: &C, project_id: Uuid, input: &NewActivity) -> Result<Activity>
    where
        C: ConnectionTrait,
    {
        let model = new_activity_active_model(project_id, input)
            .insert(conn)
            .await
            .context("Failed to insert activity")?;
        info!(project_id=%project_id, activity_id=%model.id, "activity created");
        activity_from_model(model)
    }

    pub async fn replace<C>(
        conn: &C,
        project_id: Uuid,
        id: Uuid,
        input: &NewActivity,
    ) -> Result<Option<Activity>>
    where
        C: ConnectionTrait,
    {
        let Some(model) = Self::find_model(conn, project_id, id).await? else {
            return Ok(None);
        };
        let mut active = model.into_active_model();
        active.name = Set(input.name.clone());
        active.description = Set(input.description.clone());
        active.phase = Set(input.phase.as_str().to_string());
        let model = active
            .update(conn)
            .await
            .context("Failed to update activity")?;
        activity_from_model(model).map(Some)
    }

    /// Deletes the activity and the impacts referencing it in one transaction.
    pub async fn delete<C>(conn: &C, project_id: Uuid, id: Uuid) -> Result<bool>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let txn = conn
            .begin()
            .await
            .context("Failed to start database transaction")?;

        if Self::find_model(&txn, project_id, id).await?.is_none() {
            return Ok(false);
        }
        let impacts = ImpactEntity::delete_many()
            .filter(impact::Column::ActivityId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete activity impacts")?;
        ActivityEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete activity")?;

        txn.commit()
            .await
            .context("Failed to commit database transaction")?;
        info!(project_id=%project_id, activity_id=%id, impacts = impacts.rows_affected, "activity deleted");
        Ok(true)
    }
}
