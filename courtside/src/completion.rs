//! Match completion notifications for external consumers.
//!
//! Credit-score bonuses and rating prompts live outside the engine; they
//! receive a [`MatchCompleted`] through a [`CompletionSink`]. The engine
//! emits at most one notification per match: only the request whose
//! transaction moved the match from Ongoing to Completed delivers it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::models::{EventId, Match, MatchId};
use crate::pool::models::PlayerRef;

/// Completion notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCompleted {
    pub event_id: EventId,
    pub match_id: MatchId,
    pub slot1: Vec<PlayerRef>,
    pub slot2: Vec<PlayerRef>,
    pub court_number: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
}

impl MatchCompleted {
    pub fn from_match(m: &Match, ended_at: DateTime<Utc>) -> Self {
        Self {
            event_id: m.event_id,
            match_id: m.id,
            slot1: m.slot1.clone(),
            slot2: m.slot2.clone(),
            court_number: m.court_number,
            started_at: m.started_at,
            ended_at,
        }
    }

    /// Played minutes, if the start was recorded
    pub fn played_minutes(&self) -> Option<i64> {
        self.started_at
            .map(|started| (self.ended_at - started).num_minutes())
    }
}

/// Receiver of completion notifications
#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn deliver(&self, completed: MatchCompleted) -> MatchmakingResult<()>;
}

/// Sink that only writes to the log
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl CompletionSink for LogSink {
    async fn deliver(&self, completed: MatchCompleted) -> MatchmakingResult<()> {
        log::info!(
            target: "audit",
            "Match {} in event {} completed on court {:?}",
            completed.match_id,
            completed.event_id,
            completed.court_number
        );
        Ok(())
    }
}

/// Sink forwarding notifications into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<MatchCompleted>,
}

impl ChannelSink {
    /// Create a sink and the receiving end consumers read from
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MatchCompleted>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CompletionSink for ChannelSink {
    async fn deliver(&self, completed: MatchCompleted) -> MatchmakingResult<()> {
        self.tx
            .send(completed)
            .map_err(|e| MatchmakingError::Directory(format!("completion channel closed: {e}")))
    }
}
