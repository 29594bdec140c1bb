//! Standalone schema-migration command: runs the embedded `sqlx::migrate!`
//! set against `DATABASE_URL` without starting any consumer.
//!
//! Useful for a deploy step that wants to apply the schema ahead of the
//! worker processes coming up, mirroring the teacher's separation of
//! `migrate` from `serve`.

use anyhow::{Context, Result};
use smsguard_storage::PgStore;

pub(crate) async fn run() -> Result<()> {
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable must be set")?;
    println!("Applying migrations to {database_url}...");
    PgStore::new(&database_url).await?;
    println!("Migrations applied.");
    Ok(())
}
