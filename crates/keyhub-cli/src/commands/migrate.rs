//! Database migration command.

use keyhub_core::error::AppError;
use keyhub_database::DatabasePool;
use keyhub_database::migration::run_migrations;

use crate::output;

pub async fn execute(db: &DatabasePool) -> Result<(), AppError> {
    println!("Running database migrations...");
    run_migrations(db.pool()).await?;
    output::print_success("All migrations applied.");
    Ok(())
}
