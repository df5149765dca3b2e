use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;
use crate::error::AppResult;

pub async fn create_pool(config: &Config) -> PgPool {
    let url = config.database_url();
    PgPoolOptions::new()
        .min_connections(config.db.pool_min)
        .max_connections(config.db.pool_max)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(&url)
        .await
        .expect("Failed to connect to PostgreSQL")
}

/// Creates the two tables at boot if they do not exist yet.
///
/// The foreign key intentionally has no ON DELETE CASCADE: session deletion
/// removes dependents explicitly inside one transaction.
pub async fn init_schema(pool: &PgPool) -> AppResult<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            time TEXT NOT NULL DEFAULT '06:00',
            turf_name TEXT NOT NULL DEFAULT 'Home Turf',
            turf_cost BIGINT NOT NULL DEFAULT 3200,
            status TEXT NOT NULL DEFAULT 'open',
            per_head_cost BIGINT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS rsvps (
            id SERIAL PRIMARY KEY,
            session_id TEXT NOT NULL REFERENCES sessions(id),
            player_name TEXT NOT NULL,
            phone TEXT,
            rsvp_status TEXT NOT NULL DEFAULT 'in',
            payment_status TEXT NOT NULL DEFAULT 'pending',
            amount_due BIGINT,
            cashfree_order_id TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
