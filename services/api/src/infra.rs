use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use fixit::tickets::{
    BuildingDirectory, BuildingId, DirectoryUser, NotifyError, Role, StoreError, StoredTicket,
    Ticket, TicketId, TicketNotice, TicketNotifier, TicketStore, UserDirectory, UserId,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Versioned in-memory ticket store. Updates and removals are
/// compare-and-swap against the stored version, so racing mutations on the
/// same ticket resolve to exactly one winner.
#[derive(Default)]
pub(crate) struct InMemoryTicketStore {
    records: Mutex<HashMap<TicketId, StoredTicket>>,
}

impl TicketStore for InMemoryTicketStore {
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

/// Fixed user/building directory. The real deployment fronts the account
/// service; this adapter carries a seed population so the engine can be run
/// and demoed standalone.
#[derive(Default)]
pub(crate) struct InMemoryDirectory {
    users: HashMap<UserId, DirectoryUser>,
    buildings: HashSet<BuildingId>,
}

impl InMemoryDirectory {
    pub(crate) fn with_building(mut self, id: &str) -> Self {
        self.buildings.insert(BuildingId(id.to_string()));
        self
    }

    pub(crate) fn with_user(
        mut self,
        id: &str,
        name: &str,
        role: Role,
        building: &str,
    ) -> Self {
        self.users.insert(
            UserId(id.to_string()),
            DirectoryUser {
                name: name.to_string(),
                role,
                building_id: BuildingId(building.to_string()),
                super_admin: false,
            },
        );
        self
    }
}

impl UserDirectory for InMemoryDirectory {
    fn user(&self, id: &UserId) -> Result<Option<DirectoryUser>, StoreError> {
        Ok(self.users.get(id).cloned())
    }
}

impl BuildingDirectory for InMemoryDirectory {
    fn building_exists(&self, id: &BuildingId) -> Result<bool, StoreError> {
        Ok(self.buildings.contains(id))
    }
}

pub(crate) fn seed_directory() -> InMemoryDirectory {
    InMemoryDirectory::default()
        .with_building("maple-court")
        .with_user("adm-maple", "Dana Admin", Role::Admin, "maple-court")
        .with_user("tech-ona", "Ona Torres", Role::Technician, "maple-court")
        .with_user("tech-lev", "Lev Adler", Role::Technician, "maple-court")
        .with_user("res-ira", "Ira Novak", Role::Resident, "maple-court")
}

/// Notifier that logs committed ticket events. Actual delivery (e-mail,
/// push) is owned by a downstream service.
#[derive(Default)]
pub(crate) struct LoggingNotifier;

impl TicketNotifier for LoggingNotifier {
    fn publish(&self, notice: TicketNotice) -> Result<(), NotifyError> {
        info!(
            ticket = %notice.ticket_id.0,
            building = %notice.building_id.0,
            kind = ?notice.kind,
            "{}",
            notice.message
        );
        Ok(())
    }
}
