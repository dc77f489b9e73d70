use crate::models::{Availability, MatchProposal, ProposalStatus};
use crate::services::store::{AvailabilityStore, ProposalStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Attempts at resolving an insert conflict against a concurrently resolved row
const PENDING_INSERT_ATTEMPTS: usize = 3;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),
}

impl From<PostgresError> for StoreError {
    fn from(value: PostgresError) -> Self {
        match value {
            PostgresError::SqlxError(
                e @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)),
            ) => StoreError::Unavailable(e.to_string()),
            PostgresError::InvalidValue(msg) => StoreError::Decode(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// PostgreSQL-backed availability and proposal stores
///
/// The single-window invariant is the `availabilities` primary key with
/// upsert-replace; the single-pending-proposal invariant is a partial unique
/// index on `match_proposals`.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    async fn find_pending(&self, player_id: &str, event_id: &str) -> Result<Option<MatchProposal>, PostgresError> {
        let query = r#"
            SELECT id, player_id, event_id, status, created_at, resolved_at
            FROM match_proposals
            WHERE player_id = $1 AND event_id = $2 AND status = 'pending'
        "#;

        let row = sqlx::query(query)
            .bind(player_id)
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(proposal_from_row).transpose()
    }
}

fn availability_from_row(row: &PgRow) -> Result<Availability, PostgresError> {
    let skill: Option<i16> = row.try_get("skill_level")?;
    let skill_level = skill
        .map(|s| u8::try_from(s).map_err(|_| PostgresError::InvalidValue(format!("skill level {}", s))))
        .transpose()?;

    Ok(Availability {
        player_id: row.try_get("player_id")?,
        sport: row.try_get("sport")?,
        from: row.try_get("available_from")?,
        until: row.try_get("available_until")?,
        district: row.try_get("district")?,
        skill_level,
        created_at: row.try_get("created_at")?,
    })
}

fn proposal_from_row(row: &PgRow) -> Result<MatchProposal, PostgresError> {
    let status: String = row.try_get("status")?;

    Ok(MatchProposal {
        id: row.try_get("id")?,
        player_id: row.try_get("player_id")?,
        event_id: row.try_get("event_id")?,
        status: status.parse::<ProposalStatus>().map_err(PostgresError::InvalidValue)?,
        created_at: row.try_get("created_at")?,
        resolved_at: row.try_get("resolved_at")?,
    })
}

#[async_trait]
impl AvailabilityStore for PostgresClient {
    async fn upsert(&self, availability: Availability) -> Result<Availability, StoreError> {
        let query = r#"
            INSERT INTO availabilities
                (player_id, sport, available_from, available_until, district, skill_level, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (player_id)
            DO UPDATE SET
                sport = EXCLUDED.sport,
                available_from = EXCLUDED.available_from,
                available_until = EXCLUDED.available_until,
                district = EXCLUDED.district,
                skill_level = EXCLUDED.skill_level,
                created_at = EXCLUDED.created_at
        "#;

        sqlx::query(query)
            .bind(&availability.player_id)
            .bind(&availability.sport)
            .bind(availability.from)
            .bind(availability.until)
            .bind(&availability.district)
            .bind(availability.skill_level.map(i16::from))
            .bind(availability.created_at)
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        tracing::debug!("Stored availability for player {}", availability.player_id);

        Ok(availability)
    }

    async fn delete(&self, player_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM availabilities WHERE player_id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, player_id: &str) -> Result<Option<Availability>, StoreError> {
        let query = r#"
            SELECT player_id, sport, available_from, available_until, district, skill_level, created_at
            FROM availabilities
            WHERE player_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(row.as_ref().map(availability_from_row).transpose()?)
    }

    async fn list_active(&self, sport: &str, now: DateTime<Utc>) -> Result<Vec<Availability>, StoreError> {
        let query = r#"
            SELECT player_id, sport, available_from, available_until, district, skill_level, created_at
            FROM availabilities
            WHERE LOWER(TRIM(sport)) = LOWER(TRIM($1)) AND available_until >= $2
            ORDER BY player_id
        "#;

        let rows = sqlx::query(query)
            .bind(sport)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let windows = rows
            .iter()
            .map(availability_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("{} active {} windows", windows.len(), sport);

        Ok(windows)
    }
}

#[async_trait]
impl ProposalStore for PostgresClient {
    async fn insert_pending(
        &self,
        player_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(MatchProposal, bool), StoreError> {
        let query = r#"
            INSERT INTO match_proposals (id, player_id, event_id, status, created_at)
            VALUES ($1, $2, $3, 'pending', $4)
            ON CONFLICT (player_id, event_id) WHERE status = 'pending'
            DO NOTHING
            RETURNING id, player_id, event_id, status, created_at, resolved_at
        "#;

        for _ in 0..PENDING_INSERT_ATTEMPTS {
            let inserted = sqlx::query(query)
                .bind(Uuid::new_v4())
                .bind(player_id)
                .bind(event_id)
                .bind(now)
                .fetch_optional(&self.pool)
                .await
                .map_err(PostgresError::from)?;

            if let Some(row) = inserted {
                return Ok((proposal_from_row(&row)?, true));
            }

            // Conflict: return the row that won, unless it was resolved in between
            if let Some(existing) = self.find_pending(player_id, event_id).await? {
                return Ok((existing, false));
            }
        }

        Err(StoreError::Backend(format!(
            "pending proposal for {} / {} kept changing during insert",
            player_id, event_id
        )))
    }

    async fn get(&self, id: Uuid) -> Result<Option<MatchProposal>, StoreError> {
        let query = r#"
            SELECT id, player_id, event_id, status, created_at, resolved_at
            FROM match_proposals
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(row.as_ref().map(proposal_from_row).transpose()?)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: ProposalStatus,
        to: ProposalStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<MatchProposal>, StoreError> {
        let query = r#"
            UPDATE match_proposals
            SET status = $3, resolved_at = $4
            WHERE id = $1 AND status = $2
            RETURNING id, player_id, event_id, status, created_at, resolved_at
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(row.as_ref().map(proposal_from_row).transpose()?)
    }

    async fn list_for_player(&self, player_id: &str) -> Result<Vec<MatchProposal>, StoreError> {
        let query = r#"
            SELECT id, player_id, event_id, status, created_at, resolved_at
            FROM match_proposals
            WHERE player_id = $1
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(player_id)
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        Ok(rows
            .iter()
            .map(proposal_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        let err: StoreError = PostgresError::SqlxError(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err: StoreError = PostgresError::SqlxError(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, StoreError::Backend(_)));

        let err: StoreError = PostgresError::InvalidValue("status".to_string()).into();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_pending_insert_is_unique() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let client = PostgresClient::new(&url, 2, 1).await.expect("Failed to connect");
        let player = format!("player-{}", Uuid::new_v4());

        let (first, created) = client.insert_pending(&player, "evt", Utc::now()).await.unwrap();
        assert!(created);
        let (second, created) = client.insert_pending(&player, "evt", Utc::now()).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
    }
}
