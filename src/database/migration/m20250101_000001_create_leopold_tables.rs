// Initial schema: projects and the three tables they own.
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Project {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Activity {
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    Phase,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EnvironmentalComponent {
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    Category,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Impact {
    Table,
    Id,
    ProjectId,
    ActivityId,
    EnvironmentalComponentId,
    Magnitude,
    Importance,
    Description,
    MitigationMeasures,
    AiAnalysis,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Project::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Project::Name).text().not_null())
                    .col(ColumnDef::new(Project::Description).text())
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Activity::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Activity::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Activity::Name).text().not_null())
                    .col(ColumnDef::new(Activity::Description).text())
                    .col(ColumnDef::new(Activity::Phase).text().not_null())
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_project")
                            .from(Activity::Table, Activity::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EnvironmentalComponent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EnvironmentalComponent::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalComponent::ProjectId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EnvironmentalComponent::Name).text().not_null())
                    .col(ColumnDef::new(EnvironmentalComponent::Description).text())
                    .col(
                        ColumnDef::new(EnvironmentalComponent::Category)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EnvironmentalComponent::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_environmental_component_project")
                            .from(
                                EnvironmentalComponent::Table,
                                EnvironmentalComponent::ProjectId,
                            )
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Impact::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Impact::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Impact::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Impact::ActivityId).uuid().not_null())
                    .col(
                        ColumnDef::new(Impact::EnvironmentalComponentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Impact::Magnitude).integer().not_null())
                    .col(ColumnDef::new(Impact::Importance).integer().not_null())
                    .col(ColumnDef::new(Impact::Description).text())
                    .col(ColumnDef::new(Impact::MitigationMeasures).text())
                    .col(ColumnDef::new(Impact::AiAnalysis).text())
                    .col(
                        ColumnDef::new(Impact::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_impact_project")
                            .from(Impact::Table, Impact::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_impact_activity")
                            .from(Impact::Table, Impact::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_impact_environmental_component")
                            .from(Impact::Table, Impact::EnvironmentalComponentId)
                            .to(EnvironmentalComponent::Table, EnvironmentalComponent::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One impact per matrix cell
        manager
            .create_index(
                Index::create()
                    .name("idx_impact_cell")
                    .table(Impact::Table)
                    .col(Impact::ActivityId)
                    .col(Impact::EnvironmentalComponentId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_impact_project")
                    .table(Impact::Table)
                    .col(Impact::ProjectId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Impact::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EnvironmentalComponent::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await?;

        Ok(())
    }
}
