use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/jornada-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables owned by the journey schema, parents before children.
pub const JOURNEY_TABLES: [&str; 5] = [
    "tenants",
    "users",
    "plans",
    "challenges",
    "challenge_comments",
];

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .with_context(|| format!("failed to connect to database at {url}"))
}

/// Pool used by the server and operator commands.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    let pool = connect(&config.database_url, 5).await?;
    debug!(db = config.database_name(), "connection pool ready");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!(migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}

/// Create the configured database through the `postgres` maintenance
/// database if it is missing. Returns `true` when it was created.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let db_name = config.database_name();
    let maint = connect(&config.maintenance_url(), 1).await?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint)
            .await
            .context("failed to query pg_database")?;

    let created = if exists {
        false
    } else {
        // The name is validated by DbConfig::parse; CREATE DATABASE takes no binds.
        maint
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        true
    };
    maint.close().await;

    info!(db = db_name, created, "database present");
    Ok(created)
}

fn table_count_sql() -> String {
    let selects: Vec<String> = JOURNEY_TABLES
        .iter()
        .enumerate()
        .map(|(i, table)| format!("SELECT {i} AS ord, '{table}' AS name, COUNT(*) FROM {table}"))
        .collect();
    format!("{} ORDER BY ord", selects.join(" UNION ALL "))
}

/// Row counts for [`JOURNEY_TABLES`], in that order, in one round trip.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let rows: Vec<(i32, String, i64)> = sqlx::query_as(&table_count_sql())
        .fetch_all(pool)
        .await
        .context("failed to count journey tables")?;
    Ok(rows.into_iter().map(|(_, name, count)| (name, count)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_query_covers_every_table_in_order() {
        let sql = table_count_sql();
        let positions: Vec<usize> = JOURNEY_TABLES
            .iter()
            .map(|t| sql.find(&format!("FROM {t}")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(sql.matches("UNION ALL").count(), JOURNEY_TABLES.len() - 1);
        assert!(sql.ends_with("ORDER BY ord"));
    }
}
