use crate::database::conversions::{component_from_model, new_component_active_model};
use crate::database::entities::{ComponentEntity, ImpactEntity};
use crate::database::entities::{environmental_component, impact};
use crate::matrix::{EnvironmentalComponent, NewComponent};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

pub struct ComponentDao;

impl ComponentDao {
    /// Environmental components of a project ordered by name.
    pub async fn list_for_project<C>(
        conn: &C,
        project_id: Uuid,
    ) -> Result<Vec<EnvironmentalComponent>>
    where
        C: ConnectionTrait,
    {
        ComponentEntity::find()
            .filter(environmental_component::Column::ProjectId.eq(project_id))
            .order_by_asc(environmental_component::Column::Name)
            .order_by_asc(environmental_component::Column::CreatedAt)
            .all(conn)
            .await
            .context("Failed to list environmental components")?
            .into_iter()
            .map(component_from_model)
            .collect()
    }

    pub async fn find_in_project<C>(
        conn: &C,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<EnvironmentalComponent>>
    where
        C: ConnectionTrait,
    {
        let model = Self::find_model(conn, project_id, id).await?;
        model.map(component_from_model).transpose()
    }

    async fn find_model<C>(
        conn: &C,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<Option<environmental_component::Model>>
    where
        C: ConnectionTrait,
    {
        ComponentEntity::find_by_id(id)
            .filter(environmental_component::Column::ProjectId.eq(project_id))
            .one(conn)
            .await
            .context("Failed to load environmental component")
    }

    pub async fn create<C>(
        conn: &C,
        project_id: Uuid,
        input: &NewComponent,
    ) -> Result<EnvironmentalComponent>
    where
        C: ConnectionTrait,
    {
        let model = new_component_active_model(project_id, input)
            .insert(conn)
            .await
            .context("Failed to insert environmental component")?;
        info!(project_id=%project_id, component_id=%model.id, "environmental component created");
        component_from_model(model)
    }

    pub async fn replace<C>(
        conn: &C,
        project_id: Uuid,
        id: Uuid,
        input: &NewComponent,
    ) -> Result<Option<EnvironmentalComponent>>
    where
        C: ConnectionTrait,
    {
        let Some(model) = Self::find_model(conn, project_id, id).await? else {
            return Ok(None);
        };
        let mut active = model.into_active_model();
        active.name = Set(input.name.clone());
        active.description = Set(input.description.clone());
        active.category = Set(input.category.as_str().to_string());
        let model = active
            .update(conn)
            .await
            .context("Failed to update environmental component")?;
        component_from_model(model).map(Some)
    }

    /// Deletes the component and the impacts referencing it in one transaction.
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
            .filter(impact::Column::EnvironmentalComponentId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete component impacts")?;
        ComponentEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete environmental component")?;

        txn.commit()
            .await
            .context("Failed to commit database transaction")?;
        info!(project_id=%project_id, component_id=%id, impacts = impacts.rows_affected, "environmental component deleted");
        Ok(true)
    }
}
