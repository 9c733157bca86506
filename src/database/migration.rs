//! Schema migrations for the matrix database.
pub mod m20250101_000001_create_leopold_tables;

use crate::database::migration::m20250101_000001_create_leopold_tables::Migration as CreateTablesMigration;
use sea_orm::{DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn sea_orm_migration::MigrationTrait>> {
        vec![Box::new(CreateTablesMigration)]
    }
}

/// Runs all pending migrations.
pub async fn run_migrations(db_conn: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db_conn, None).await
}
