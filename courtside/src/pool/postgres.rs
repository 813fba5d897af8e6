//! PostgreSQL implementations of the directory traits.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::directory::{EventDirectory, GuestDirectory};
use super::models::{EventContext, GuestPlayer, Registrant, RegistrationStatus, EventStatus};
use crate::error::{MatchmakingError, MatchmakingResult};

/// Reads events, registrants and guests from the platform tables
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventDirectory for PgDirectory {
    async fn find_event(&self, event_id: i64) -> MatchmakingResult<Option<EventContext>> {
        let row = sqlx::query("SELECT id, host_id, max_courts, status FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| {
            let max_courts: i32 = r.get("max_courts");
            let status: String = r.get("status");
            Ok(EventContext {
                id: r.get("id"),
                host_id: r.get("host_id"),
                max_courts: u32::try_from(max_courts).map_err(|_| {
                    MatchmakingError::Directory(format!(
                        "event {event_id} has invalid court count {max_courts}"
                    ))
                })?,
                status: status.parse::<EventStatus>()?,
            })
        })
        .transpose()
    }

    async fn registrants(&self, event_id: i64) -> MatchmakingResult<Vec<Registrant>> {
        let rows = sqlx::query(
            "SELECT user_id, display_name, skill_rating, matches_played, status, registered_at
             FROM event_participants WHERE event_id = $1 ORDER BY user_id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let status: String = r.get("status");
                let matches_played: i32 = r.get("matches_played");
                Ok(Registrant {
                    user_id: r.get("user_id"),
                    name: r.get("display_name"),
                    skill_rating: r.get("skill_rating"),
                    matches_played: matches_played.max(0) as u32,
                    status: status.parse::<RegistrationStatus>()?,
                    registered_at: r.get::<chrono::NaiveDateTime, _>("registered_at").and_utc(),
                })
            })
            .collect()
    }

    async fn mark_event_ongoing(&self, event_id: i64) -> MatchmakingResult<()> {
        let result = sqlx::query("UPDATE events SET status = 'ongoing' WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MatchmakingError::EventNotFound(event_id));
        }
        Ok(())
    }
}

#[async_trait]
impl GuestDirectory for PgDirectory {
    async fn guests_for_event(&self, event_id: i64) -> MatchmakingResult<Vec<GuestPlayer>> {
        let rows = sqlx::query(
            "SELECT id, event_id, name, estimated_mmr, matches_played, created_at, deleted_at, expires_at
             FROM guest_players WHERE event_id = $1 ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let matches_played: i32 = r.get("matches_played");
                GuestPlayer {
                    id: r.get("id"),
                    event_id: r.get("event_id"),
                    name: r.get("name"),
                    estimated_mmr: r.get("estimated_mmr"),
                    matches_played: matches_played.max(0) as u32,
                    created_at: r.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
                    deleted_at: r
                        .get::<Option<chrono::NaiveDateTime>, _>("deleted_at")
                        .map(|dt| dt.and_utc()),
                    expires_at: r
                        .get::<Option<chrono::NaiveDateTime>, _>("expires_at")
                        .map(|dt| dt.and_utc()),
                }
            })
            .collect())
    }
}
