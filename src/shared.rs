use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    domain::{
        ActionKind, ActionRecord, DeskReport, Priority, RequestType, Ticket, TicketQueueManager,
    },
    error::Result,
};

/// Consistent copy of the manager state, taken under a single read lock
#[derive(Debug, Clone, Serialize)]
pub struct DeskSnapshot {
    pub urgent_queue: Vec<Ticket>,
    pub normal_queue: Vec<Ticket>,
    pub history: Vec<Ticket>,
    pub journal: Vec<ActionRecord>,
    pub cycle_counter: u8,
}

impl DeskSnapshot {
    pub fn capture(desk: &TicketQueueManager) -> Self {
        Self {
            urgent_queue: desk.urgent_queue().cloned().collect(),
            normal_queue: desk.normal_queue().cloned().collect(),
            history: desk.history().cloned().collect(),
            journal: desk.journal().as_slice().to_vec(),
            cycle_counter: desk.cycle_counter(),
        }
    }
}

/// Cloneable handle that lets several tasks drive one counter.
///
/// The whole manager sits behind one lock: mutations hold the write lock
/// for the full operation and reads see either all of it or none of it.
#[derive(Debug, Clone)]
pub struct SharedDesk {
    inner: Arc<RwLock<TicketQueueManager>>,
}

impl SharedDesk {
    pub fn new(desk: TicketQueueManager) -> Self {
        Self {
            inner: Arc::new(RwLock::new(desk)),
        }
    }

    pub async fn add_client(
        &self,
        name: &str,
        request_type: RequestType,
        priority: Priority,
    ) -> Result<Ticket> {
        let mut desk = self.inner.write().await;
        desk.add_client(name, request_type, priority).cloned()
    }

    pub async fn serve_next(&self) -> Option<Ticket> {
        let mut desk = self.inner.write().await;
        desk.serve_next().cloned()
    }

    pub async fn remove_by_id(&self, id: &str) -> bool {
        let mut desk = self.inner.write().await;
        desk.remove_by_id(id)
    }

    pub async fn undo_last(&self) {
        let mut desk = self.inner.write().await;
        desk.undo_last();
    }

    /// Undoes the last action unless it was already restored.
    ///
    /// Returns the kind of the undone action, checked and applied under the same lock.
    pub async fn undo_if_possible(&self) -> Option<ActionKind> {
        let mut desk = self.inner.write().await;
        if !desk.can_undo() {
            debug!("Nothing left to undo");
            return None;
        }
        let kind = desk.last_action().map(ActionRecord::kind);
        desk.undo_last();
        kind
    }

    pub async fn snapshot(&self) -> DeskSnapshot {
        let desk = self.inner.read().await;
        DeskSnapshot::capture(&desk)
    }

    pub async fn report(&self) -> DeskReport {
        let desk = self.inner.read().await;
        DeskReport::from_manager(&desk)
    }

    /// Runs a read-only closure against the manager
    pub async fn read<R>(&self, f: impl FnOnce(&TicketQueueManager) -> R) -> R {
        let desk = self.inner.read().await;
        f(&desk)
    }
}
