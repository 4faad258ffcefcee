use serde::{Deserialize, Serialize};

use super::domain::{Actor, Comment, Role, Ticket, TicketStatus};

/// Closed set of reasons a status transition can be denied, so callers can
/// render distinguishable errors instead of a single generic 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    #[error("only the assigned technician may perform this transition")]
    NotAssignedTechnician,
    #[error("actor role does not permit this transition")]
    InsufficientRole,
    #[error("no transition leads to the requested status")]
    InvalidTransition,
}

/// May this actor move this ticket to the target status?
///
/// Rules, exhaustively over [`Role`]:
/// - into `assigned`: an admin scoped to the ticket's building;
/// - into `accepted`, `in_progress`, `completed`: the assigned technician;
/// - into `open`: nobody (nothing transitions back to open).
pub fn can_transition(
    actor: &Actor,
    ticket: &Ticket,
    target: TicketStatus,
) -> Result<(), DenialReason> {
    match target {
        TicketStatus::Open => Err(DenialReason::InvalidTransition),
        TicketStatus::Assigned => match actor.role {
            Role::Admin if actor.administers(&ticket.building_id) => Ok(()),
            Role::Admin | Role::Technician | Role::Resident => {
                Err(DenialReason::InsufficientRole)
            }
        },
        TicketStatus::Accepted | TicketStatus::InProgress | TicketStatus::Completed => {
            match actor.role {
                Role::Technician if ticket.is_assigned_to(&actor.id) => Ok(()),
                Role::Technician => Err(DenialReason::NotAssignedTechnician),
                Role::Admin | Role::Resident => Err(DenialReason::InsufficientRole),
            }
        }
    }
}

/// A ticket is deletable by a building-scoped admin at any time, or by its
/// creator while still open.
pub fn can_delete(actor: &Actor, ticket: &Ticket) -> bool {
    match actor.role {
        Role::Admin => actor.administers(&ticket.building_id),
        Role::Technician | Role::Resident => {
            actor.id == ticket.created_by && ticket.is_open()
        }
    }
}

/// Read gate: the creator, the assigned technician, or an admin of the
/// owning building.
pub fn can_view(actor: &Actor, ticket: &Ticket) -> bool {
    actor.administers(&ticket.building_id)
        || actor.id == ticket.created_by
        || ticket.is_assigned_to(&actor.id)
}

/// Comments may be removed by their author or by a building admin.
pub fn can_moderate_comment(actor: &Actor, ticket: &Ticket, comment: &Comment) -> bool {
    comment.author_id == actor.id || actor.administers(&ticket.building_id)
}

/// Gate for the explicit admin completion override. Separate from
/// [`can_transition`]: the ordinary path rejects skips for everyone.
pub fn can_override_complete(actor: &Actor, ticket: &Ticket) -> bool {
    actor.administers(&ticket.building_id)
}
