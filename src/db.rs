//! Persistence building blocks shared by every entity: the timestamp base
//! shape, the generic repository contract and the commit-or-rollback unit of
//! work used by the PostgreSQL stores.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("unique constraint {0} violated")]
    UniqueViolation(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return DataError::UniqueViolation(constraint);
            }
        }
        DataError::Database(err)
    }
}

/// Creation and last-modification instants carried by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Timestamps {
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves `updated_at` forward. Always strictly later than the previous
    /// value, by at least the database's microsecond resolution.
    pub fn touch(&mut self) {
        let now = OffsetDateTime::now_utc();
        let floor = self.updated_at + Duration::microseconds(1);
        self.updated_at = now.max(floor);
    }
}

/// A persisted record with identity and timestamps.
pub trait Entity: Send + Sync {
    /// Partial attribute set accepted by [`Repository::update`].
    type Changes: Send;
    /// Public key-value projection.
    type Dict: Serialize;

    fn id(&self) -> Uuid;
    fn timestamps(&self) -> &Timestamps;
    fn timestamps_mut(&mut self) -> &mut Timestamps;

    /// Applies `changes` in memory; returns the names of the fields that changed.
    fn apply(&mut self, changes: Self::Changes) -> Vec<&'static str>;
    fn to_dict(&self) -> Self::Dict;

    fn touch(&mut self) {
        self.timestamps_mut().touch();
    }
}

/// Storage for one entity type. Implementors provide the raw row operations;
/// `save`, `update` and `delete` are the entity-level contract built on top.
#[async_trait]
pub trait Repository<E: Entity + 'static>: Send + Sync {
    /// Insert-or-update by id, returning the row as stored.
    async fn upsert(&self, entity: &E) -> Result<E, DataError>;
    async fn remove(&self, id: Uuid) -> Result<bool, DataError>;
    async fn find(&self, id: Uuid) -> Result<Option<E>, DataError>;

    async fn save(&self, entity: &mut E) -> Result<(), DataError> {
        entity.touch();
        let stored = self.upsert(entity).await?;
        *entity = stored;
        Ok(())
    }

    async fn update(&self, entity: &mut E, changes: E::Changes) -> Result<Vec<&'static str>, DataError> {
        let changed = entity.apply(changes);
        self.save(entity).await?;
        Ok(changed)
    }

    async fn delete(&self, entity: &E) -> Result<bool, DataError> {
        self.remove(entity.id()).await
    }
}

/// Finishes a unit of work: commits when `outcome` is Ok, otherwise rolls the
/// transaction back, logs, and hands the error to the caller.
pub async fn commit_changes<T>(
    tx: Transaction<'_, Postgres>,
    outcome: Result<T, sqlx::Error>,
) -> Result<T, DataError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            error!(error = %err, "unit of work failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "rollback failed");
            }
            Err(err.into())
        }
    }
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

pub async fn run_migrations(db: &PgPool) {
    if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
        warn!(error = %e, "migration failed; continuing");
    }
}
