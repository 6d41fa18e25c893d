use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ticket::{Ticket, TicketId};

/// Kind of mutation recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Add,
    Remove,
    Serve,
    Restore,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "ADD"),
            Self::Remove => write!(f, "REMOVE"),
            Self::Serve => write!(f, "SERVE"),
            Self::Restore => write!(f, "RESTORE"),
        }
    }
}

/// One immutable journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    kind: ActionKind,
    ticket_id: TicketId,
    timestamp: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(kind: ActionKind, ticket_id: TicketId) -> Self {
        Self {
            kind,
            ticket_id,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn ticket_id(&self) -> &TicketId {
        &self.ticket_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Renders the entry the way the journal view lists it,
    /// e.g. `[2024-05-01 09:30:00] SERVE -> Ana (U1)`
    pub fn describe(&self, ticket: &Ticket) -> String {
        format!(
            "[{}] {} -> {} ({})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.kind,
            ticket.name,
            self.ticket_id
        )
    }
}

/// Append-only sequence of [`ActionRecord`]s
///
/// Entries are never removed; undo appends a `Restore` record instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    records: Vec<ActionRecord>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, kind: ActionKind, ticket_id: TicketId) {
        self.records.push(ActionRecord::new(kind, ticket_id));
    }

    /// Most recent entry without removing it
    pub fn last(&self) -> Option<&ActionRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entries in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = &ActionRecord> + '_ {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[ActionRecord] {
        &self.records
    }
}
