pub mod action;
pub mod config;
pub mod manager;
pub mod report;
pub mod search;
pub mod ticket;

pub use action::{ActionKind, ActionRecord, Journal};
pub use config::DeskConfig;
pub use manager::{TicketLocation, TicketQueueManager};
pub use report::DeskReport;
pub use search::SearchCriteria;
pub use ticket::{Priority, RequestType, Ticket, TicketId};
