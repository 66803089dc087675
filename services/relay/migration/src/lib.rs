use sea_orm_migration::prelude::*;

mod m20260301_000001_create_relay_events;
mod m20260301_000002_create_relay_files;
mod m20260301_000003_create_constants;
mod m20260301_000004_create_global_variables;
mod m20260301_000005_create_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_relay_events::Migration),
            Box::new(m20260301_000002_create_relay_files::Migration),
            Box::new(m20260301_000003_create_constants::Migration),
            Box::new(m20260301_000004_create_global_variables::Migration),
            Box::new(m20260301_000005_create_records::Migration),
        ]
    }
}
