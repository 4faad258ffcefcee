use serde::{Deserialize, Serialize};

use super::domain::{BuildingId, Role, Ticket, TicketId, UserId};

/// A ticket as held by the store, tagged with the version used for
/// compare-and-swap writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTicket {
    pub ticket: Ticket,
    pub version: u64,
}

/// Persistence boundary for tickets. Implementations must apply `update` and
/// `remove` atomically against `expected_version` so that at most one of two
/// racing mutations commits; a lost race is reported as
/// [`StoreError::Conflict`] with zero partial effect.
pub trait TicketStore: Send + Sync {
    fn insert(&self, ticket: Ticket) -> Result<StoredTicket, StoreError>;
    fn fetch(&self, id: &TicketId) -> Result<Option<StoredTicket>, StoreError>;
    fn update(&self, ticket: Ticket, expected_version: u64) -> Result<StoredTicket, StoreError>;
    fn remove(&self, id: &TicketId, expected_version: u64) -> Result<(), StoreError>;
}

/// Error enumeration for store failures. Conflicted writes surface to the
/// caller and are never silently retried, to avoid duplicate timeline
/// entries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ticket was modified concurrently")]
    Conflict,
    #[error("ticket not found in store")]
    NotFound,
    #[error("ticket store unavailable: {0}")]
    Unavailable(String),
}

/// Directory record for an identity: role and building affiliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub name: String,
    pub role: Role,
    pub building_id: BuildingId,
    #[serde(default)]
    pub super_admin: bool,
}

/// Role and building lookup by identity. External collaborator; only the
/// contract is specified here.
pub trait UserDirectory: Send + Sync {
    fn user(&self, id: &UserId) -> Result<Option<DirectoryUser>, StoreError>;
}

/// Ownership lookup for the tenancy boundary.
pub trait BuildingDirectory: Send + Sync {
    fn building_exists(&self, id: &BuildingId) -> Result<bool, StoreError>;
}

/// What happened to a ticket, published downstream after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketNotice {
    pub ticket_id: TicketId,
    pub building_id: BuildingId,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Opened,
    StatusChanged,
    Assigned,
    CommentAdded,
    Deleted,
}

/// Outbound notification hook (e-mail, push, webhook adapters). Invoked only
/// after the store write committed; delivery itself is out of scope.
pub trait TicketNotifier: Send + Sync {
    fn publish(&self, notice: TicketNotice) -> Result<(), NotifyError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
