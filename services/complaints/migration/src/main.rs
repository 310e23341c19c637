use sea_orm_migration::prelude::*;

use civic_complaints_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
