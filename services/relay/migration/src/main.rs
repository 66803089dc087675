use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(xgds_relay_migration::Migrator).await;
}
