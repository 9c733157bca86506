use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "impact")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub activity_id: Uuid,
    pub environmental_component_id: Uuid,
    pub magnitude: i32,
    pub importance: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub mitigation_measures: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ai_analysis: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::activity::Entity",
        from = "Column::ActivityId",
        to = "super::activity::Column::Id",
        on_delete = "Cascade"
    )]
    Activity,
    #[sea_orm(
        belongs_to = "super::environmental_component::Entity",
        from = "Column::EnvironmentalComponentId",
        to = "super::environmental_component::Column::Id",
        on_delete = "Cascade"
    )]
    EnvironmentalComponent,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl Related<super::environmental_component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnvironmentalComponent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
