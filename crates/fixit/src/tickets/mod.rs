//! Maintenance ticket lifecycle, authorization, and audit timeline.
//!
//! Tickets move along the fixed path `open → assigned → accepted →
//! in_progress → completed`. The policy module decides who may move them,
//! the transition module applies a single legal step and emits an audit
//! event, and the service composes both with the store, directory, and
//! notifier seams so every mutation commits as one compare-and-swap write.

pub mod domain;
pub mod policy;
pub mod router;
pub mod service;
pub mod store;
pub mod timeline;
pub mod transition;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, BuildingId, Comment, CommentId, Role, Ticket, TicketCategory, TicketId,
    TicketPriority, TicketStatus, UserId,
};
pub use policy::DenialReason;
pub use router::ticket_router;
pub use service::{
    AssignmentRequest, CreateTicketRequest, TicketError, TicketService, TicketView,
};
pub use store::{
    BuildingDirectory, DirectoryUser, NoticeKind, NotifyError, StoreError, StoredTicket,
    TicketNotice, TicketNotifier, TicketStore, UserDirectory,
};
pub use timeline::{Timeline, TimelineEvent};
pub use transition::{apply_transition, TransitionError, TransitionOutcome};
