use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timeline::Timeline;

/// Identifier wrapper for maintenance tickets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

/// Identifier wrapper for the building that owns a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub String);

/// Identifier wrapper for residents, technicians, and admins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for discussion comments on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub String);

/// Trade category a maintenance request falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Plumbing,
    Electrical,
    Hvac,
    Cleaning,
    Other,
}

impl TicketCategory {
    pub const fn label(self) -> &'static str {
        match self {
            TicketCategory::Plumbing => "plumbing",
            TicketCategory::Electrical => "electrical",
            TicketCategory::Hvac => "hvac",
            TicketCategory::Cleaning => "cleaning",
            TicketCategory::Other => "other",
        }
    }
}

/// Urgency reported by the resident at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub const fn label(self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

/// Lifecycle states a ticket moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Assigned,
    Accepted,
    InProgress,
    Completed,
}

impl TicketStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Assigned => "assigned",
            TicketStatus::Accepted => "accepted",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Completed => "completed",
        }
    }

    /// The unique next status in the fixed lifecycle path, or `None` from the
    /// terminal state. The path has no branches, skips, or self-loops.
    pub const fn successor(self) -> Option<TicketStatus> {
        match self {
            TicketStatus::Open => Some(TicketStatus::Assigned),
            TicketStatus::Assigned => Some(TicketStatus::Accepted),
            TicketStatus::Accepted => Some(TicketStatus::InProgress),
            TicketStatus::InProgress => Some(TicketStatus::Completed),
            TicketStatus::Completed => None,
        }
    }
}

/// Closed role set checked exhaustively by the authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Technician,
    Resident,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Technician => "technician",
            Role::Resident => "resident",
        }
    }
}

/// The authenticated identity performing an operation.
///
/// `super_admin` widens building-scope checks for admins to every building;
/// it grants nothing to technicians or residents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub building_id: BuildingId,
    #[serde(default)]
    pub super_admin: bool,
}

impl Actor {
    /// Whether this actor holds admin authority over the given building.
    pub fn administers(&self, building: &BuildingId) -> bool {
        self.role == Role::Admin && (self.super_admin || self.building_id == *building)
    }
}

/// A discussion entry on a ticket. Immutable except for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A maintenance request progressing through the fixed lifecycle.
///
/// Invariant: `assigned_to` is set exactly when `status != Open`, and the
/// timeline's last entry always carries the current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub building_id: BuildingId,
    pub created_by: UserId,
    pub created_by_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_name: Option<String>,
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    pub images: Vec<String>,
    pub comments: Vec<Comment>,
    pub timeline: Timeline,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.status == TicketStatus::Open
    }

    /// Whether the given user is the technician currently bound to this ticket.
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.assigned_to.as_ref() == Some(user)
    }
}
