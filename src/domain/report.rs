use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::manager::TicketQueueManager;
use crate::domain::ticket::{Priority, RequestType, Ticket};
use crate::error::Result;

/// Aggregated counters for the statistics view
///
/// `by_type` and `by_priority` cover waiting and served tickets together;
/// every variant is present, with zero when unused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeskReport {
    pub total_waiting: usize,
    pub total_served: usize,
    pub average_service_minutes: f64,
    pub by_type: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub waiting_by_priority: BTreeMap<String, usize>,
}

impl DeskReport {
    pub fn from_manager(desk: &TicketQueueManager) -> Self {
        let waiting: Vec<&Ticket> = desk.urgent_queue().chain(desk.normal_queue()).collect();
        let everyone: Vec<&Ticket> = desk.all_tickets().collect();

        Self {
            total_waiting: desk.total_waiting(),
            total_served: desk.total_served(),
            average_service_minutes: desk.average_service_time(),
            by_type: count_by_type(&everyone),
            by_priority: count_by_priority(&everyone),
            waiting_by_priority: count_by_priority(&waiting),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Tickets per request type, keyed by the type's display name
pub fn count_by_type(tickets: &[&Ticket]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = RequestType::ALL
        .iter()
        .map(|t| (t.to_string(), 0))
        .collect();
    for ticket in tickets {
        *counts.entry(ticket.request_type.to_string()).or_default() += 1;
    }
    counts
}

/// Tickets per priority, keyed by the priority's display name
pub fn count_by_priority(tickets: &[&Ticket]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = Priority::ALL
        .iter()
        .map(|p| (p.to_string(), 0))
        .collect();
    for ticket in tickets {
        *counts.entry(ticket.priority.to_string()).or_default() += 1;
    }
    counts
}
