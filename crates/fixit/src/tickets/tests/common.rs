use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::tickets::domain::{
    Actor, BuildingId, Role, Ticket, TicketCategory, TicketId, TicketPriority, TicketStatus,
    UserId,
};
use crate::tickets::service::{AssignmentRequest, CreateTicketRequest, TicketService};
use crate::tickets::store::{
    BuildingDirectory, DirectoryUser, NotifyError, StoreError, StoredTicket, TicketNotice,
    TicketNotifier, UserDirectory,
};
// Re-exported so suites built on these fakes can call store methods directly.
pub(super) use crate::tickets::store::TicketStore;
use crate::tickets::timeline::Timeline;

pub(super) type TestService = TicketService<MemoryStore, MemoryDirectory, MemoryNotifier>;

/// In-memory versioned ticket store with compare-and-swap semantics.
#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<HashMap<TicketId, StoredTicket>>,
}

impl TicketStore for MemoryStore {
    fn insert(&self, ticket: Ticket) -> Result<StoredTicket, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&ticket.id) {
            return Err(StoreError::Conflict);
        }
        let stored = StoredTicket { ticket, version: 1 };
        guard.insert(stored.ticket.id.clone(), stored.clone());
        Ok(stored)
    }

    fn fetch(&self, id: &TicketId) -> Result<Option<StoredTicket>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, ticket: Ticket, expected_version: u64) -> Result<StoredTicket, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let current = guard.get(&ticket.id).ok_or(StoreError::NotFound)?;
        if current.version != expected_version {
            return Err(StoreError::Conflict);
        }
        let stored = StoredTicket {
            ticket,
            version: expected_version + 1,
        };
        guard.insert(stored.ticket.id.clone(), stored.clone());
        Ok(stored)
    }

    fn remove(&self, id: &TicketId, expected_version: u64) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let current = guard.get(id).ok_or(StoreError::NotFound)?;
        if current.version != expected_version {
            return Err(StoreError::Conflict);
        }
        guard.remove(id);
        Ok(())
    }
}

/// Store that refuses every operation, for outage behavior tests.
pub(super) struct UnavailableStore;

impl TicketStore for UnavailableStore {
    fn insert(&self, _ticket: Ticket) -> Result<StoredTicket, StoreError> {
        Err(StoreError::Unavailable("maintenance window".to_string()))
    }

    fn fetch(&self, _id: &TicketId) -> Result<Option<StoredTicket>, StoreError> {
        Err(StoreError::Unavailable("maintenance window".to_string()))
    }

    fn update(&self, _ticket: Ticket, _expected_version: u64) -> Result<StoredTicket, StoreError> {
        Err(StoreError::Unavailable("maintenance window".to_string()))
    }

    fn remove(&self, _id: &TicketId, _expected_version: u64) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("maintenance window".to_string()))
    }
}

/// Wraps a [`MemoryStore`] but fails every write after the read succeeded, so
/// tests can assert that a failed write leaves the stored ticket untouched.
pub(super) struct RejectWritesStore {
    pub(super) inner: Arc<MemoryStore>,
}

impl TicketStore for RejectWritesStore {
    fn insert(&self, ticket: Ticket) -> Result<StoredTicket, StoreError> {
        self.inner.insert(ticket)
    }

    fn fetch(&self, id: &TicketId) -> Result<Option<StoredTicket>, StoreError> {
        self.inner.fetch(id)
    }

    fn update(&self, _ticket: Ticket, _expected_version: u64) -> Result<StoredTicket, StoreError> {
        Err(StoreError::Conflict)
    }

    fn remove(&self, _id: &TicketId, _expected_version: u64) -> Result<(), StoreError> {
        Err(StoreError::Conflict)
    }
}

/// Fixed role/building directory seeded with the test population.
#[derive(Default)]
pub(super) struct MemoryDirectory {
    users: HashMap<UserId, DirectoryUser>,
    buildings: HashSet<BuildingId>,
}

impl MemoryDirectory {
    pub(super) fn with_building(mut self, id: &str) -> Self {
        self.buildings.insert(BuildingId(id.to_string()));
        self
    }

    pub(super) fn with_user(
        mut self,
        id: &str,
        name: &str,
        role: Role,
        building: &str,
        super_admin: bool,
    ) -> Self {
        self.users.insert(
            UserId(id.to_string()),
            DirectoryUser {
                name: name.to_string(),
                role,
                building_id: BuildingId(building.to_string()),
                super_admin,
            },
        );
        self
    }
}

impl UserDirectory for MemoryDirectory {
    fn user(&self, id: &UserId) -> Result<Option<DirectoryUser>, StoreError> {
        Ok(self.users.get(id).cloned())
    }
}

impl BuildingDirectory for MemoryDirectory {
    fn building_exists(&self, id: &BuildingId) -> Result<bool, StoreError> {
        Ok(self.buildings.contains(id))
    }
}

/// Notifier that records published notices for assertions.
#[derive(Default)]
pub(super) struct MemoryNotifier {
    notices: Mutex<Vec<TicketNotice>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<TicketNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl TicketNotifier for MemoryNotifier {
    fn publish(&self, notice: TicketNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Notifier whose transport always fails; commits must survive it.
pub(super) struct FailingNotifier;

impl TicketNotifier for FailingNotifier {
    fn publish(&self, _notice: TicketNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp down".to_string()))
    }
}

pub(super) fn seeded_directory() -> MemoryDirectory {
    MemoryDirectory::default()
        .with_building("b1")
        .with_building("b2")
        .with_user("adm1", "Dana Admin", Role::Admin, "b1", false)
        .with_user("adm2", "Omar Admin", Role::Admin, "b2", false)
        .with_user("root1", "Sasha Root", Role::Admin, "hq", true)
        .with_user("tech1", "Tavi Wrench", Role::Technician, "b1", false)
        .with_user("tech2", "Noor Spanner", Role::Technician, "b1", false)
        .with_user("tech9", "Remy Remote", Role::Technician, "b2", false)
        .with_user("res1", "Ira Resident", Role::Resident, "b1", false)
        .with_user("res2", "Vic Resident", Role::Resident, "b1", false)
}

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(seeded_directory());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = Arc::new(TicketService::new(
        store.clone(),
        directory,
        notifier.clone(),
    ));
    (service, store, notifier)
}

pub(super) fn actor(id: &str, name: &str, role: Role, building: &str) -> Actor {
    Actor {
        id: UserId(id.to_string()),
        name: name.to_string(),
        role,
        building_id: BuildingId(building.to_string()),
        super_admin: false,
    }
}

pub(super) fn admin() -> Actor {
    actor("adm1", "Dana Admin", Role::Admin, "b1")
}

pub(super) fn other_building_admin() -> Actor {
    actor("adm2", "Omar Admin", Role::Admin, "b2")
}

pub(super) fn super_admin() -> Actor {
    let mut root = actor("root1", "Sasha Root", Role::Admin, "hq");
    root.super_admin = true;
    root
}

pub(super) fn technician(id: &str) -> Actor {
    actor(id, "Tavi Wrench", Role::Technician, "b1")
}

pub(super) fn resident(id: &str) -> Actor {
    actor(id, "Ira Resident", Role::Resident, "b1")
}

pub(super) fn create_request() -> CreateTicketRequest {
    CreateTicketRequest {
        building_id: BuildingId("b1".to_string()),
        created_by: UserId("res1".to_string()),
        created_by_name: "Ira Resident".to_string(),
        title: "Leaking kitchen faucet".to_string(),
        description: "Steady drip under the sink since yesterday".to_string(),
        category: TicketCategory::Plumbing,
        priority: TicketPriority::High,
        location: "Unit 4B".to_string(),
        contact_phone: Some("555-0142".to_string()),
        images: vec!["uploads/faucet.jpg".to_string()],
    }
}

pub(super) fn open_ticket(service: &TestService) -> StoredTicket {
    service.create(create_request()).expect("ticket opens")
}

pub(super) fn assignment(ticket_id: &TicketId) -> AssignmentRequest {
    AssignmentRequest {
        ticket_id: ticket_id.clone(),
        technician_id: UserId("tech1".to_string()),
        technician_name: "Tavi Wrench".to_string(),
        assigned_by: UserId("adm1".to_string()),
        assigned_by_name: "Dana Admin".to_string(),
    }
}

pub(super) fn assigned_ticket(service: &TestService) -> StoredTicket {
    let stored = open_ticket(service);
    service
        .assign(assignment(&stored.ticket.id))
        .expect("ticket assigns")
}

/// Build a consistent ticket fixture directly, without going through the
/// service, for pure policy and transition tests.
pub(super) fn ticket_fixture(status: TicketStatus, assigned_to: Option<&str>) -> Ticket {
    let creator = UserId("res1".to_string());
    let mut timeline = Timeline::opened(creator.clone(), "Ira Resident".to_string(), None);

    let mut walked = TicketStatus::Open;
    while walked != status {
        let next = walked.successor().expect("fixture status is reachable");
        let (actor_id, actor_name) = if next == TicketStatus::Assigned {
            ("adm1", "Dana Admin")
        } else {
            (assigned_to.unwrap_or("tech1"), "Tavi Wrench")
        };
        timeline.record(
            next,
            UserId(actor_id.to_string()),
            actor_name.to_string(),
            None,
        );
        walked = next;
    }

    let opened_at = timeline.entries()[0].timestamp;
    let updated_at = timeline.last().timestamp;

    Ticket {
        id: TicketId("tkt-fixture".to_string()),
        building_id: BuildingId("b1".to_string()),
        created_by: creator,
        created_by_name: "Ira Resident".to_string(),
        assigned_to: assigned_to.map(|id| UserId(id.to_string())),
        assigned_to_name: assigned_to.map(|_| "Tavi Wrench".to_string()),
        title: "Leaking kitchen faucet".to_string(),
        description: "Steady drip under the sink since yesterday".to_string(),
        category: TicketCategory::Plumbing,
        priority: TicketPriority::High,
        status,
        location: "Unit 4B".to_string(),
        contact_phone: None,
        images: Vec::new(),
        comments: Vec::new(),
        timeline,
        created_at: opened_at,
        updated_at,
        assigned_at: (status != TicketStatus::Open).then_some(updated_at),
        accepted_at: matches!(
            status,
            TicketStatus::Accepted | TicketStatus::InProgress | TicketStatus::Completed
        )
        .then_some(updated_at),
        completed_at: (status == TicketStatus::Completed).then_some(updated_at),
    }
}

pub(super) fn timeline_statuses(ticket: &Ticket) -> Vec<&'static str> {
    ticket
        .timeline
        .entries()
        .iter()
        .map(|event| event.status.label())
        .collect()
}
