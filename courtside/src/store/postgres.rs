//! PostgreSQL match store.
//!
//! Each transaction takes `pg_advisory_xact_lock(event_id)` before reading,
//! so ledger operations for one event run strictly one after another. The
//! partial unique index on `(event_id, court_number)` for active matches is
//! a second line against double-assigned courts.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;

use super::{Committed, MatchStore};
use crate::db::timeouts::{DEFAULT_QUERY_TIMEOUT, DEFAULT_TRANSACTION_TIMEOUT, with_timeout};
use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::ledger::EventLedger;
use crate::matches::models::{EventId, Match, MatchId, MatchMode, MatchStatus, NewMatch};
use crate::overrides::models::{NewOverrideAudit, OverrideAudit};
use crate::pool::models::PlayerRef;

/// Match store backed by PostgreSQL
#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
    transaction_timeout: Duration,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            transaction_timeout: DEFAULT_TRANSACTION_TIMEOUT,
        }
    }

    /// Deadline for a whole event transaction, lock wait included
    pub fn with_transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn player_from_row(row: &PgRow) -> MatchmakingResult<PlayerRef> {
    tagged_player(row.get("user_id"), row.get("guest_id"))
}

fn match_from_row(row: &PgRow) -> MatchmakingResult<Match> {
    let mode: String = row.get("mode");
    let status: String = row.get("status");
    let court_number: Option<i32> = row.get("court_number");
    let duration: i32 = row.get("estimated_duration_minutes");

    Ok(Match {
        id: row.get("id"),
        event_id: row.get("event_id"),
        mode: mode.parse::<MatchMode>()?,
        slot1: Vec::new(),
        slot2: Vec::new(),
        court_number: court_number.map(|c| c as u32),
        status: status.parse::<MatchStatus>()?,
        estimated_duration_minutes: duration as u32,
        created_at: row.get::<NaiveDateTime, _>("created_at").and_utc(),
        started_at: row
            .get::<Option<NaiveDateTime>, _>("started_at")
            .map(|dt| dt.and_utc()),
        ended_at: row
            .get::<Option<NaiveDateTime>, _>("ended_at")
            .map(|dt| dt.and_utc()),
    })
}

async fn load_matches(conn: &mut PgConnection, event_id: EventId) -> MatchmakingResult<Vec<Match>> {
    let rows = sqlx::query(
        "SELECT id, event_id, mode, court_number, status, estimated_duration_minutes,
                created_at, started_at, ended_at
         FROM matches WHERE event_id = $1 ORDER BY id",
    )
    .bind(event_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut matches = rows
        .iter()
        .map(match_from_row)
        .collect::<MatchmakingResult<Vec<_>>>()?;

    let player_rows = sqlx::query(
        "SELECT mp.match_id, mp.slot, mp.user_id, mp.guest_id
         FROM match_players mp
         JOIN matches m ON m.id = mp.match_id
         WHERE m.event_id = $1
         ORDER BY mp.match_id, mp.slot, mp.position",
    )
    .bind(event_id)
    .fetch_all(&mut *conn)
    .await?;

    let index: HashMap<MatchId, usize> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id, i))
        .collect();

    for row in &player_rows {
        let match_id: i64 = row.get("match_id");
        let slot: i16 = row.get("slot");
        let player = player_from_row(row)?;
        if let Some(&i) = index.get(&match_id) {
            match slot {
                1 => matches[i].slot1.push(player),
                _ => matches[i].slot2.push(player),
            }
        }
    }

    Ok(matches)
}

async fn write_players(
    conn: &mut PgConnection,
    match_id: MatchId,
    slot1: &[PlayerRef],
    slot2: &[PlayerRef],
) -> MatchmakingResult<()> {
    for (slot, players) in [(1i16, slot1), (2i16, slot2)] {
        for (position, player) in players.iter().enumerate() {
            sqlx::query(
                "INSERT INTO match_players (match_id, slot, position, user_id, guest_id)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(match_id)
            .bind(slot)
            .bind(position as i16)
            .bind(player.user_id())
            .bind(player.guest_id())
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn insert_match(conn: &mut PgConnection, draft: NewMatch) -> MatchmakingResult<Match> {
    let row = sqlx::query(
        "INSERT INTO matches (event_id, mode, court_number, status, estimated_duration_minutes, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(draft.event_id)
    .bind(draft.mode.to_string())
    .bind(draft.court_number.map(|c| c as i32))
    .bind(draft.status.as_str())
    .bind(draft.estimated_duration_minutes as i32)
    .bind(draft.created_at.naive_utc())
    .fetch_one(&mut *conn)
    .await?;

    let m = draft.into_match(row.get("id"));
    write_players(conn, m.id, &m.slot1, &m.slot2).await?;
    Ok(m)
}

async fn update_match(conn: &mut PgConnection, m: &Match) -> MatchmakingResult<()> {
    sqlx::query(
        "UPDATE matches
         SET court_number = $3, status = $4, started_at = $5, ended_at = $6
         WHERE id = $1 AND event_id = $2",
    )
    .bind(m.id)
    .bind(m.event_id)
    .bind(m.court_number.map(|c| c as i32))
    .bind(m.status.as_str())
    .bind(m.started_at.map(|dt| dt.naive_utc()))
    .bind(m.ended_at.map(|dt| dt.naive_utc()))
    .execute(&mut *conn)
    .await?;

    // Player swaps rewrite the whole roster of the match
    sqlx::query("DELETE FROM match_players WHERE match_id = $1")
        .bind(m.id)
        .execute(&mut *conn)
        .await?;
    write_players(conn, m.id, &m.slot1, &m.slot2).await
}

async fn insert_audit(conn: &mut PgConnection, entry: &NewOverrideAudit) -> MatchmakingResult<()> {
    sqlx::query(
        "INSERT INTO match_overrides
            (event_id, match_id, removed_user_id, removed_guest_id,
             added_user_id, added_guest_id, admin_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(entry.event_id)
    .bind(entry.match_id)
    .bind(entry.removed_player.user_id())
    .bind(entry.removed_player.guest_id())
    .bind(entry.added_player.user_id())
    .bind(entry.added_player.guest_id())
    .bind(entry.admin_id)
    .bind(entry.created_at.naive_utc())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn tagged_player(user_id: Option<i64>, guest_id: Option<i64>) -> MatchmakingResult<PlayerRef> {
    match (user_id, guest_id) {
        (Some(id), None) => Ok(PlayerRef::User(id)),
        (None, Some(id)) => Ok(PlayerRef::Guest(id)),
        _ => Err(MatchmakingError::Directory(
            "player reference must name exactly one of user or guest".to_string(),
        )),
    }
}

impl PgMatchStore {
    async fn load(&self, event_id: EventId) -> MatchmakingResult<Vec<Match>> {
        let mut conn = self.pool.acquire().await?;
        load_matches(&mut *conn, event_id).await
    }

    async fn run_transaction<T, F>(
        &self,
        event_id: EventId,
        max_courts: u32,
        op: F,
    ) -> MatchmakingResult<Committed<T>>
    where
        F: FnOnce(&mut EventLedger) -> MatchmakingResult<T>,
    {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        let matches = load_matches(&mut *tx, event_id).await?;
        let mut ledger = EventLedger::new(event_id, max_courts, matches);

        // Dropping `tx` on error rolls back and releases the lock
        let value = op(&mut ledger)?;
        let changes = ledger.into_changes();

        for m in &changes.updated {
            update_match(&mut *tx, m).await?;
        }

        let mut inserted = Vec::with_capacity(changes.inserted.len());
        for draft in changes.inserted {
            inserted.push(insert_match(&mut *tx, draft).await?);
        }

        for entry in &changes.audit {
            insert_audit(&mut *tx, entry).await?;
        }

        tx.commit().await?;
        Ok(Committed { value, inserted })
    }

    async fn load_audit(&self, event_id: EventId) -> MatchmakingResult<Vec<OverrideAudit>> {
        let rows = sqlx::query(
            "SELECT id, event_id, match_id, removed_user_id, removed_guest_id,
                    added_user_id, added_guest_id, admin_id, created_at
             FROM match_overrides WHERE event_id = $1 ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(OverrideAudit {
                    id: r.get("id"),
                    event_id: r.get("event_id"),
                    match_id: r.get("match_id"),
                    removed_player: tagged_player(r.get("removed_user_id"), r.get("removed_guest_id"))?,
                    added_player: tagged_player(r.get("added_user_id"), r.get("added_guest_id"))?,
                    admin_id: r.get("admin_id"),
                    created_at: r.get::<NaiveDateTime, _>("created_at").and_utc(),
                })
            })
            .collect()
    }

    async fn ping(&self) -> MatchmakingResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn snapshot(&self, event_id: EventId) -> MatchmakingResult<Vec<Match>> {
        with_timeout(DEFAULT_QUERY_TIMEOUT, self.load(event_id)).await
    }

    async fn transact<T, F>(
        &self,
        event_id: EventId,
        max_courts: u32,
        op: F,
    ) -> MatchmakingResult<Committed<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut EventLedger) -> MatchmakingResult<T> + Send + 'static,
    {
        with_timeout(
            self.transaction_timeout,
            self.run_transaction(event_id, max_courts, op),
        )
        .await
    }

    async fn audit_log(&self, event_id: EventId) -> MatchmakingResult<Vec<OverrideAudit>> {
        with_timeout(DEFAULT_QUERY_TIMEOUT, self.load_audit(event_id)).await
    }

    async fn health_check(&self) -> MatchmakingResult<()> {
        with_timeout(DEFAULT_QUERY_TIMEOUT, self.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_player_requires_exactly_one_side() {
        assert_eq!(tagged_player(Some(3), None).unwrap(), PlayerRef::User(3));
        assert_eq!(tagged_player(None, Some(4)).unwrap(), PlayerRef::Guest(4));
        assert!(tagged_player(Some(3), Some(4)).is_err());
        assert!(tagged_player(None, None).is_err());
    }
}
