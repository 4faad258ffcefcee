use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{TicketStatus, UserId};

/// One audit entry recording a status the ticket entered. Immutable once
/// appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub status: TicketStatus,
    pub timestamp: DateTime<Utc>,
    pub actor_id: UserId,
    pub actor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Append-only audit log of every status change on a ticket.
///
/// A timeline is constructed non-empty and only ever grows through
/// [`Timeline::record`], so `len() >= 1` holds for every persisted ticket and
/// past entries can never be rewritten or reordered. Entry timestamps are
/// strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    entries: Vec<TimelineEvent>,
}

impl Timeline {
    /// Start a timeline with the opening entry of a freshly created ticket.
    pub fn opened(actor_id: UserId, actor_name: String, note: Option<String>) -> Self {
        Self {
            entries: vec![TimelineEvent {
                status: TicketStatus::Open,
                timestamp: Utc::now(),
                actor_id,
                actor_name,
                note,
            }],
        }
    }

    /// Append a new entry and return a copy of it.
    pub fn record(
        &mut self,
        status: TicketStatus,
        actor_id: UserId,
        actor_name: String,
        note: Option<String>,
    ) -> TimelineEvent {
        let event = TimelineEvent {
            status,
            timestamp: self.next_timestamp(),
            actor_id,
            actor_name,
            note,
        };
        self.entries.push(event.clone());
        event
    }

    // Strict ordering even when the clock is coarser than two consecutive
    // mutations: never earlier than one millisecond past the last entry.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.entries.last() {
            Some(last) if now <= last.timestamp => last.timestamp + Duration::milliseconds(1),
            _ => now,
        }
    }

    /// The most recent entry. Timelines are never empty.
    pub fn last(&self) -> &TimelineEvent {
        self.entries.last().expect("timeline is never empty")
    }

    pub fn entries(&self) -> &[TimelineEvent] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
