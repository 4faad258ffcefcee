use super::domain::{Actor, Ticket, TicketStatus};
use super::policy::{self, DenialReason};
use super::timeline::TimelineEvent;

/// Why a requested status change was rejected before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move ticket from '{from}' to '{to}'")]
    IllegalStep {
        from: &'static str,
        to: &'static str,
    },
    #[error("transition denied: {0}")]
    Denied(#[from] DenialReason),
}

/// Result of a successful transition: the mutated ticket and the audit entry
/// that was appended for it. The caller persists both in one atomic write.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub ticket: Ticket,
    pub event: TimelineEvent,
}

/// Validate and apply a status change.
///
/// The target must be the unique legal successor of the current status (which
/// also rejects re-entering the same status), the actor must pass the
/// authorization policy, and the matching lifecycle timestamp is stamped only
/// if it was never set before. Pure: no store or notifier access.
pub fn apply_transition(
    mut ticket: Ticket,
    target: TicketStatus,
    actor: &Actor,
    note: Option<String>,
) -> Result<TransitionOutcome, TransitionError> {
    if ticket.status.successor() != Some(target) {
        return Err(TransitionError::IllegalStep {
            from: ticket.status.label(),
            to: target.label(),
        });
    }

    policy::can_transition(actor, &ticket, target)?;

    let event = ticket
        .timeline
        .record(target, actor.id.clone(), actor.name.clone(), note);

    ticket.status = target;
    ticket.updated_at = event.timestamp;

    let stamp = match target {
        TicketStatus::Assigned => Some(&mut ticket.assigned_at),
        TicketStatus::Accepted => Some(&mut ticket.accepted_at),
        TicketStatus::InProgress => None,
        TicketStatus::Completed => Some(&mut ticket.completed_at),
        TicketStatus::Open => None,
    };
    if let Some(field) = stamp {
        if field.is_none() {
            *field = Some(event.timestamp);
        }
    }

    Ok(TransitionOutcome { ticket, event })
}
