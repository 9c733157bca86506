use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activity::Entity")]
    Activity,
    #[sea_orm(has_many = "super::environmental_component::Entity")]
    EnvironmentalComponent,
    #[sea_orm(has_many = "super::impact::Entity")]
    Impact,
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

impl Related<super::impact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Impact.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
