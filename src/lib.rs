//! # Service Desk Core
//!
//! Ticket-queue logic for a walk-in service counter.
//!
//! Clients are admitted with a request type and a priority, wait in one of
//! two FIFO queues and are served two urgent to one normal. Every mutation
//! is recorded in an append-only journal whose latest entry can be undone,
//! and the same state backs search and statistics for whatever presentation
//! layer sits on top.

pub mod domain;
pub mod error;
pub mod shared;

// Re-export commonly used types
pub use domain::{
    action::{ActionKind, ActionRecord, Journal},
    config::DeskConfig,
    manager::{TicketLocation, TicketQueueManager},
    report::DeskReport,
    search::SearchCriteria,
    ticket::{Priority, RequestType, Ticket, TicketId},
};
pub use error::{DeskError, Result};
pub use shared::{DeskSnapshot, SharedDesk};
