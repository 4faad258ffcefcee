use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{
    Actor, BuildingId, Comment, CommentId, Role, Ticket, TicketCategory, TicketId,
    TicketPriority, TicketStatus, UserId,
};
use super::policy;
use super::store::{
    BuildingDirectory, NoticeKind, StoreError, StoredTicket, TicketNotice, TicketNotifier,
    TicketStore, UserDirectory,
};
use super::timeline::Timeline;
use super::transition::{apply_transition, TransitionError};

/// Service composing the store, directory, and notifier behind the ticket
/// lifecycle operations. Stateless and request-scoped: every mutation is a
/// read, a pure transform, and a single compare-and-swap write.
pub struct TicketService<S, D, N> {
    store: Arc<S>,
    directory: Arc<D>,
    notifier: Arc<N>,
}

static TICKET_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static COMMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_ticket_id() -> TicketId {
    let id = TICKET_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TicketId(format!("tkt-{id:06}"))
}

fn next_comment_id() -> CommentId {
    let id = COMMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CommentId(format!("cmt-{id:06}"))
}

/// Intake payload for a new maintenance request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketRequest {
    pub building_id: BuildingId,
    pub created_by: UserId,
    pub created_by_name: String,
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub location: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Payload binding a technician to an open ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentRequest {
    pub ticket_id: TicketId,
    pub technician_id: UserId,
    pub technician_name: String,
    pub assigned_by: UserId,
    pub assigned_by_name: String,
}

/// Read-gate response: the ticket plus what the requesting actor may do to it.
#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    pub ticket: Ticket,
    pub can_delete: bool,
}

impl<S, D, N> TicketService<S, D, N>
where
    S: TicketStore + 'static,
    D: UserDirectory + BuildingDirectory + 'static,
    N: TicketNotifier + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, notifier: Arc<N>) -> Self {
        Self {
            store,
            directory,
            notifier,
        }
    }

    /// Open a new ticket on behalf of a resident of the building.
    pub fn create(&self, request: CreateTicketRequest) -> Result<StoredTicket, TicketError> {
        let CreateTicketRequest {
            building_id,
            created_by,
            created_by_name,
            title,
            description,
            category,
            priority,
            location,
            contact_phone,
            images,
        } = request;

        require_field(&title, "title")?;
        require_field(&description, "description")?;
        require_field(&location, "location")?;

        if !self.directory.building_exists(&building_id)? {
            return Err(TicketError::Validation(format!(
                "unknown building '{}'",
                building_id.0
            )));
        }
        match self.directory.user(&created_by)? {
            Some(entry) if entry.building_id == building_id => {}
            Some(_) => {
                return Err(TicketError::Validation(
                    "creator does not belong to this building".to_string(),
                ))
            }
            None => {
                return Err(TicketError::Validation(format!(
                    "unknown user '{}'",
                    created_by.0
                )))
            }
        }

        let timeline = Timeline::opened(created_by.clone(), created_by_name.clone(), None);
        let opened_at = timeline.last().timestamp;

        let ticket = Ticket {
            id: next_ticket_id(),
            building_id,
            created_by,
            created_by_name,
            assigned_to: None,
            assigned_to_name: None,
            title,
            description,
            category,
            priority,
            status: TicketStatus::Open,
            location,
            contact_phone,
            images,
            comments: Vec::new(),
            timeline,
            created_at: opened_at,
            updated_at: opened_at,
            assigned_at: None,
            accepted_at: None,
            completed_at: None,
        };

        let stored = self.store.insert(ticket)?;
        self.notify(
            &stored.ticket,
            NoticeKind::Opened,
            format!("ticket '{}' opened", stored.ticket.title),
        );
        Ok(stored)
    }

    /// Read a ticket through the visibility gate. Unauthorized reads fail
    /// with a distinct denial rather than masquerading as not-found.
    pub fn get(&self, ticket_id: &TicketId, actor: &Actor) -> Result<TicketView, TicketError> {
        let stored = self.fetch(ticket_id)?;
        if !policy::can_view(actor, &stored.ticket) {
            return Err(TicketError::ReadDenied);
        }
        let can_delete = policy::can_delete(actor, &stored.ticket);
        Ok(TicketView {
            ticket: stored.ticket,
            can_delete,
        })
    }

    /// Move a ticket to the next status in the lifecycle path. Status,
    /// lifecycle timestamp, and the new timeline entry commit as one write.
    pub fn transition(
        &self,
        ticket_id: &TicketId,
        target: TicketStatus,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<StoredTicket, TicketError> {
        // `assigned` binds a technician, so it is only reachable through
        // `assign`; committing it here would leave `assigned_to` empty.
        if target == TicketStatus::Assigned {
            return Err(TicketError::Validation(
                "tickets enter 'assigned' through the assign operation".to_string(),
            ));
        }

        let stored = self.fetch(ticket_id)?;
        let outcome = apply_transition(stored.ticket, target, actor, note)?;
        let committed = self.store.update(outcome.ticket, stored.version)?;
        self.notify(
            &committed.ticket,
            NoticeKind::StatusChanged,
            format!("ticket moved to '{}'", target.label()),
        );
        Ok(committed)
    }

    /// Bind a technician to an open ticket. Assignment and the transition
    /// into `assigned` are one indivisible write, never two.
    pub fn assign(&self, request: AssignmentRequest) -> Result<StoredTicket, TicketError> {
        let AssignmentRequest {
            ticket_id,
            technician_id,
            technician_name,
            assigned_by,
            assigned_by_name,
        } = request;

        let stored = self.fetch(&ticket_id)?;
        let mut ticket = stored.ticket;

        let admin = match self.directory.user(&assigned_by)? {
            Some(entry)
                if entry.role == Role::Admin
                    && (entry.super_admin || entry.building_id == ticket.building_id) =>
            {
                Actor {
                    id: assigned_by,
                    name: assigned_by_name,
                    role: entry.role,
                    building_id: entry.building_id,
                    super_admin: entry.super_admin,
                }
            }
            _ => return Err(TicketError::NotAdmin),
        };

        match self.directory.user(&technician_id)? {
            Some(entry)
                if entry.role == Role::Technician
                    && entry.building_id == ticket.building_id => {}
            _ => return Err(TicketError::NotATechnician),
        }

        if !ticket.is_open() {
            return Err(TicketError::AlreadyAssigned);
        }

        ticket.assigned_to = Some(technician_id);
        ticket.assigned_to_name = Some(technician_name.clone());

        let outcome = apply_transition(
            ticket,
            TicketStatus::Assigned,
            &admin,
            Some(format!("assigned to {technician_name}")),
        )?;
        let committed = self.store.update(outcome.ticket, stored.version)?;
        self.notify(
            &committed.ticket,
            NoticeKind::Assigned,
            format!("ticket assigned to {technician_name}"),
        );
        Ok(committed)
    }

    /// Explicit admin override closing a ticket from any status after a
    /// technician was bound. Never reachable through the ordinary
    /// transition path.
    pub fn force_complete(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<StoredTicket, TicketError> {
        let stored = self.fetch(ticket_id)?;
        let mut ticket = stored.ticket;

        if !policy::can_override_complete(actor, &ticket) {
            return Err(TicketError::NotAdmin);
        }
        if ticket.status == TicketStatus::Completed {
            return Err(TransitionError::IllegalStep {
                from: TicketStatus::Completed.label(),
                to: TicketStatus::Completed.label(),
            }
            .into());
        }
        // Every persisted non-open ticket carries a technician; closing an
        // unassigned ticket would commit `completed` with nobody bound.
        if ticket.assigned_to.is_none() {
            return Err(TransitionError::IllegalStep {
                from: ticket.status.label(),
                to: TicketStatus::Completed.label(),
            }
            .into());
        }

        let note = note.or_else(|| Some("closed by building admin".to_string()));
        let event = ticket.timeline.record(
            TicketStatus::Completed,
            actor.id.clone(),
            actor.name.clone(),
            note,
        );
        ticket.status = TicketStatus::Completed;
        ticket.updated_at = event.timestamp;
        if ticket.completed_at.is_none() {
            ticket.completed_at = Some(event.timestamp);
        }

        let committed = self.store.update(ticket, stored.version)?;
        self.notify(
            &committed.ticket,
            NoticeKind::StatusChanged,
            "ticket closed by admin override".to_string(),
        );
        Ok(committed)
    }

    /// Permanently remove a ticket and its dependent comments and timeline.
    pub fn delete(&self, ticket_id: &TicketId, actor: &Actor) -> Result<(), TicketError> {
        let stored = self.fetch(ticket_id)?;
        if !policy::can_delete(actor, &stored.ticket) {
            return Err(TicketError::DeleteDenied);
        }
        self.store.remove(ticket_id, stored.version)?;
        self.notify(
            &stored.ticket,
            NoticeKind::Deleted,
            format!("ticket '{}' deleted", stored.ticket.title),
        );
        Ok(())
    }

    /// List a ticket's comments, gated by read access.
    pub fn comments(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
    ) -> Result<Vec<Comment>, TicketError> {
        let stored = self.fetch(ticket_id)?;
        if !policy::can_view(actor, &stored.ticket) {
            return Err(TicketError::ReadDenied);
        }
        Ok(stored.ticket.comments)
    }

    /// Append a discussion entry. Any actor passing the read gate may
    /// comment; comments are strictly append-ordered.
    pub fn add_comment(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
        content: String,
    ) -> Result<Comment, TicketError> {
        require_field(&content, "content")?;

        let stored = self.fetch(ticket_id)?;
        let mut ticket = stored.ticket;
        if !policy::can_view(actor, &ticket) {
            return Err(TicketError::ReadDenied);
        }

        let comment = Comment {
            id: next_comment_id(),
            ticket_id: ticket.id.clone(),
            author_id: actor.id.clone(),
            author_name: actor.name.clone(),
            author_role: actor.role,
            content,
            created_at: Utc::now(),
        };
        ticket.comments.push(comment.clone());
        ticket.updated_at = comment.created_at;

        let committed = self.store.update(ticket, stored.version)?;
        self.notify(
            &committed.ticket,
            NoticeKind::CommentAdded,
            format!("{} commented", comment.author_name),
        );
        Ok(comment)
    }

    /// Remove a comment; allowed only for its author or a building admin.
    pub fn delete_comment(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
        comment_id: &CommentId,
    ) -> Result<(), TicketError> {
        let stored = self.fetch(ticket_id)?;
        let mut ticket = stored.ticket;

        let comment = ticket
            .comments
            .iter()
            .find(|comment| comment.id == *comment_id)
            .cloned()
            .ok_or(TicketError::CommentNotFound)?;
        if !policy::can_moderate_comment(actor, &ticket, &comment) {
            return Err(TicketError::CommentDenied);
        }

        ticket.comments.retain(|comment| comment.id != *comment_id);
        ticket.updated_at = Utc::now();
        self.store.update(ticket, stored.version)?;
        Ok(())
    }

    fn fetch(&self, ticket_id: &TicketId) -> Result<StoredTicket, TicketError> {
        self.store
            .fetch(ticket_id)?
            .ok_or(TicketError::TicketNotFound)
    }

    // The write already committed; a failed notification must not undo or
    // fail the mutation.
    fn notify(&self, ticket: &Ticket, kind: NoticeKind, message: String) {
        let notice = TicketNotice {
            ticket_id: ticket.id.clone(),
            building_id: ticket.building_id.clone(),
            kind,
            message,
        };
        if let Err(err) = self.notifier.publish(notice) {
            warn!(ticket = %ticket.id.0, error = %err, "ticket notification dropped");
        }
    }
}

fn require_field(value: &str, field: &'static str) -> Result<(), TicketError> {
    if value.trim().is_empty() {
        Err(TicketError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Error raised by the ticket service. Every variant carries a stable
/// machine-readable kind (see [`TicketError::kind`]) plus a readable message.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("requester is not an admin of this building")]
    NotAdmin,
    #[error("assignee is not a technician of this building")]
    NotATechnician,
    #[error("ticket is already assigned")]
    AlreadyAssigned,
    #[error("actor may not view this ticket")]
    ReadDenied,
    #[error("only the creator of an open ticket or a building admin may delete it")]
    DeleteDenied,
    #[error("only the comment author or a building admin may remove it")]
    CommentDenied,
    #[error("ticket not found")]
    TicketNotFound,
    #[error("comment not found")]
    CommentNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TicketError {
    /// Stable taxonomy label for API envelopes and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TicketError::Validation(_) => "validation",
            TicketError::Transition(TransitionError::IllegalStep { .. }) => "invalid_transition",
            TicketError::Transition(TransitionError::Denied(_))
            | TicketError::NotAdmin
            | TicketError::NotATechnician
            | TicketError::ReadDenied
            | TicketError::DeleteDenied
            | TicketError::CommentDenied => "unauthorized",
            TicketError::AlreadyAssigned => "already_assigned",
            TicketError::TicketNotFound | TicketError::CommentNotFound => "not_found",
            TicketError::Store(StoreError::Conflict) => "conflict",
            TicketError::Store(StoreError::NotFound) => "not_found",
            TicketError::Store(StoreError::Unavailable(_)) => "store",
        }
    }
}
