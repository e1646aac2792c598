//! Idle-override persistence: one row per turbine ID that has been manually
//! disabled through the API. Grounded on the teacher's `hub/src/db.rs`
//! (`sqlx`+SQLite connect/migrate shape), but using the plain `sqlx::query`
//! builder instead of the `query!` compile-time macro — this workspace has
//! no `.sqlx` offline cache and no live database to check queries against
//! at build time, so hand-written queries with runtime binds are used
//! instead, the same style the teacher itself falls back to for its
//! `PRAGMA` statements.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};

#[derive(Clone)]
pub struct Db {
    pool: Pool<Sqlite>,
}

impl Db {
    /// `db_url` examples: `"sqlite:windfarm-api.db"`, `"sqlite::memory:"` (tests).
    pub async fn connect(db_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("invalid sqlite connection string: {db_url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to sqlite db: {db_url}"))?;
        Ok(Db { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.context("failed to run migrations")?;
        Ok(())
    }

    /// Whether `turbine_id` is currently manually disabled. Absent rows
    /// default to `false`.
    pub async fn is_disabled(&self, turbine_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT disabled FROM idle_overrides WHERE turbine_id = ?")
            .bind(turbine_id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to read idle override")?;
        Ok(row.map(|r| r.get::<i64, _>("disabled") != 0).unwrap_or(false))
    }

    pub async fn set_disabled(&self, turbine_id: &str, disabled: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO idle_overrides (turbine_id, disabled) VALUES (?, ?)
             ON CONFLICT(turbine_id) DO UPDATE SET disabled = excluded.disabled",
        )
        .bind(turbine_id)
        .bind(disabled as i64)
        .execute(&self.pool)
        .await
        .context("failed to write idle override")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Db {
        let db = Db::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn unknown_turbine_defaults_to_not_disabled() {
        let db = memory_db().await;
        assert!(!db.is_disabled("wt-000").await.unwrap());
    }

    #[tokio::test]
    async fn disable_then_enable_round_trips() {
        let db = memory_db().await;
        db.set_disabled("wt-000", true).await.unwrap();
        assert!(db.is_disabled("wt-000").await.unwrap());
        db.set_disabled("wt-000", false).await.unwrap();
        assert!(!db.is_disabled("wt-000").await.unwrap());
    }

    #[tokio::test]
    async fn set_disabled_is_idempotent_on_repeat_calls() {
        let db = memory_db().await;
        db.set_disabled("wt-000", true).await.unwrap();
        db.set_disabled("wt-000", true).await.unwrap();
        assert!(db.is_disabled("wt-000").await.unwrap());
    }
}
