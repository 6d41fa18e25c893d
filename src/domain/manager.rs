use std::collections::{HashMap, VecDeque};

use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::action::{ActionKind, ActionRecord, Journal};
use crate::domain::config::DeskConfig;
use crate::domain::search::SearchCriteria;
use crate::domain::ticket::{Priority, RequestType, Ticket, TicketId};
use crate::error::{DeskError, Result};

/// Where a ticket currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketLocation {
    WaitingUrgent,
    WaitingNormal,
    Served,
    /// Removed, or admission undone; still referenced by the journal
    Untracked,
}

/// Owns the two waiting queues, the served history and the action journal.
///
/// Every ticket is stored once; queues, history and journal refer to it by id.
/// Tickets are served urgent-first in bursts of `urgent_burst` (2 by default)
/// followed by one normal ticket whenever both queues have clients waiting.
#[derive(Debug)]
pub struct TicketQueueManager {
    config: DeskConfig,
    tickets: HashMap<TicketId, Ticket>,
    urgent_queue: VecDeque<TicketId>,
    normal_queue: VecDeque<TicketId>,
    history: Vec<TicketId>,
    journal: Journal,
    urgent_counter: u32,
    normal_counter: u32,
    cycle_counter: u8,
    rng: Mcg128Xsl64,
}

impl TicketQueueManager {
    /// Creates an empty manager after validating the configuration
    pub fn new(config: DeskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: DeskConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            config,
            tickets: HashMap::new(),
            urgent_queue: VecDeque::new(),
            normal_queue: VecDeque::new(),
            history: Vec::new(),
            journal: Journal::new(),
            urgent_counter: 0,
            normal_counter: 0,
            cycle_counter: 0,
            rng,
        }
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Admits a client at the tail of the queue for `priority`
    pub fn add_client(
        &mut self,
        name: &str,
        request_type: RequestType,
        priority: Priority,
    ) -> Result<&Ticket> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DeskError::InvalidInput(
                "client name must not be empty".to_string(),
            ));
        }

        let slot = match priority {
            Priority::Urgent => &mut self.urgent_counter,
            Priority::Normal => &mut self.normal_counter,
        };
        let counter = slot
            .checked_add(1)
            .ok_or(DeskError::CounterExhausted(priority))?;
        *slot = counter;
        let id = TicketId::new(self.config.prefix_for(priority), counter);
        let ticket = Ticket::new(id.clone(), name.to_string(), request_type, priority);

        self.tickets.insert(id.clone(), ticket);
        self.queue_mut(priority).push_back(id.clone());
        self.journal.append(ActionKind::Add, id.clone());

        debug!(
            ticket_id = %id,
            %priority,
            %request_type,
            waiting = self.total_waiting(),
            "Client admitted"
        );
        Ok(&self.tickets[&id])
    }

    /// Serves the next client according to the urgent/normal interleave.
    ///
    /// Returns `None` when nobody is waiting.
    pub fn serve_next(&mut self) -> Option<&Ticket> {
        let id = if !self.urgent_queue.is_empty() && self.cycle_counter < self.config.urgent_burst
        {
            self.cycle_counter += 1;
            self.urgent_queue.pop_front()?
        } else if let Some(id) = self.normal_queue.pop_front() {
            self.cycle_counter = 0;
            id
        } else {
            // Normal queue drained: keep serving urgent without touching the cycle
            self.urgent_queue.pop_front()?
        };

        let minutes = self
            .rng
            .gen_range(self.config.min_service_minutes..self.config.max_service_minutes);
        let ticket = self.tickets.get_mut(&id)?;
        if !ticket.record_service(minutes) {
            debug!(ticket_id = %id, "Keeping previously recorded service time");
        }

        self.history.push(id.clone());
        self.journal.append(ActionKind::Serve, id.clone());

        debug!(
            ticket_id = %id,
            cycle = self.cycle_counter,
            waiting = self.total_waiting(),
            "Client served"
        );
        self.tickets.get(&id)
    }

    /// Removes a waiting ticket by id (case-insensitive). Served tickets are
    /// never removed. Returns whether a ticket was found.
    pub fn remove_by_id(&mut self, raw_id: &str) -> bool {
        let removed = match self.urgent_queue.iter().position(|id| id.matches(raw_id)) {
            Some(pos) => self.urgent_queue.remove(pos),
            None => self
                .normal_queue
                .iter()
                .position(|id| id.matches(raw_id))
                .and_then(|pos| self.normal_queue.remove(pos)),
        };

        match removed {
            Some(id) => {
                debug!(ticket_id = %id, "Client removed from queue");
                self.journal.append(ActionKind::Remove, id);
                true
            }
            None => {
                debug!(ticket_id = raw_id, "No waiting client with that id");
                false
            }
        }
    }

    /// Reverts the effect of the most recent journal entry and appends a
    /// `Restore` record for the same ticket.
    ///
    /// The journal is only peeked, never popped: once the top entry is a
    /// `Restore`, further calls append more `Restore` records and change
    /// nothing else. Use [`can_undo`](Self::can_undo) to guard against that.
    pub fn undo_last(&mut self) {
        let Some(last) = self.journal.last() else {
            warn!("Undo requested with an empty journal");
            return;
        };
        let kind = last.kind();
        let id = last.ticket_id().clone();
        let Some(priority) = self.tickets.get(&id).map(|t| t.priority) else {
            return;
        };

        match kind {
            ActionKind::Add => {
                let queue = self.queue_mut(priority);
                if let Some(pos) = queue.iter().position(|queued| queued == &id) {
                    queue.remove(pos);
                }
            }
            ActionKind::Remove => {
                self.queue_mut(priority).push_front(id.clone());
            }
            ActionKind::Serve => {
                if let Some(pos) = self.history.iter().position(|served| served == &id) {
                    self.history.remove(pos);
                }
                self.queue_mut(priority).push_front(id.clone());
            }
            ActionKind::Restore => {
                warn!(ticket_id = %id, "Last action was already restored");
            }
        }

        debug!(ticket_id = %id, undone = %kind, "Action undone");
        self.journal.append(ActionKind::Restore, id);
    }

    fn queue_mut(&mut self, priority: Priority) -> &mut VecDeque<TicketId> {
        match priority {
            Priority::Urgent => &mut self.urgent_queue,
            Priority::Normal => &mut self.normal_queue,
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    fn resolve<'a>(
        &'a self,
        ids: impl Iterator<Item = &'a TicketId> + 'a,
    ) -> impl Iterator<Item = &'a Ticket> + 'a {
        ids.filter_map(move |id| self.tickets.get(id))
    }

    /// Waiting urgent tickets, head first
    pub fn urgent_queue(&self) -> impl Iterator<Item = &Ticket> + '_ {
        self.resolve(self.urgent_queue.iter())
    }

    /// Waiting normal tickets, head first
    pub fn normal_queue(&self) -> impl Iterator<Item = &Ticket> + '_ {
        self.resolve(self.normal_queue.iter())
    }

    /// Served tickets in the order they were served
    pub fn history(&self) -> impl Iterator<Item = &Ticket> + '_ {
        self.resolve(self.history.iter())
    }

    /// Urgent queue, normal queue, then history
    pub fn all_tickets(&self) -> impl Iterator<Item = &Ticket> + '_ {
        self.urgent_queue()
            .chain(self.normal_queue())
            .chain(self.history())
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn last_action(&self) -> Option<&ActionRecord> {
        self.journal.last()
    }

    /// Whether [`undo_last`](Self::undo_last) would revert anything
    pub fn can_undo(&self) -> bool {
        self.journal
            .last()
            .is_some_and(|record| record.kind() != ActionKind::Restore)
    }

    /// Looks a ticket up wherever it lives, including untracked ones
    pub fn ticket(&self, id: &TicketId) -> Option<&Ticket> {
        self.tickets.get(id)
    }

    pub fn locate(&self, id: &TicketId) -> TicketLocation {
        if self.urgent_queue.contains(id) {
            TicketLocation::WaitingUrgent
        } else if self.normal_queue.contains(id) {
            TicketLocation::WaitingNormal
        } else if self.history.contains(id) {
            TicketLocation::Served
        } else {
            TicketLocation::Untracked
        }
    }

    /// All tracked tickets matching `criteria`, in urgent, normal, history order
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<&Ticket> {
        self.all_tickets()
            .filter(|ticket| criteria.matches(ticket))
            .collect()
    }

    pub fn search_by_id(&self, raw_id: &str) -> Vec<&Ticket> {
        self.search(&SearchCriteria::Id(raw_id.to_string()))
    }

    pub fn search_by_priority(&self, priority: Priority) -> Vec<&Ticket> {
        self.search(&SearchCriteria::Priority(priority))
    }

    pub fn search_by_type(&self, request_type: RequestType) -> Vec<&Ticket> {
        self.search(&SearchCriteria::RequestType(request_type))
    }

    pub fn total_waiting(&self) -> usize {
        self.urgent_queue.len() + self.normal_queue.len()
    }

    pub fn total_served(&self) -> usize {
        self.history.len()
    }

    /// Mean service time over served tickets, 0 when nobody was served
    pub fn average_service_time(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let total: f64 = self.history().map(Ticket::service_minutes).sum();
        total / self.history.len() as f64
    }

    /// Served tickets of the given request type
    pub fn count_by_type(&self, request_type: RequestType) -> usize {
        self.history()
            .filter(|t| t.request_type == request_type)
            .count()
    }

    /// Served tickets of the given priority
    pub fn count_by_priority(&self, priority: Priority) -> usize {
        self.history().filter(|t| t.priority == priority).count()
    }

    /// Number of urgent ids issued so far
    pub fn urgent_counter(&self) -> u32 {
        self.urgent_counter
    }

    /// Number of normal ids issued so far
    pub fn normal_counter(&self) -> u32 {
        self.normal_counter
    }

    /// Progress through the current urgent burst
    pub fn cycle_counter(&self) -> u8 {
        self.cycle_counter
    }
}

impl Default for TicketQueueManager {
    fn default() -> Self {
        Self::with_valid_config(DeskConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> TicketQueueManager {
        TicketQueueManager::new(DeskConfig::default().with_seed(42)).unwrap()
    }

    fn add(desk: &mut TicketQueueManager, name: &str, priority: Priority) -> TicketId {
        desk.add_client(name, RequestType::Support, priority)
            .unwrap()
            .id
            .clone()
    }

    fn served_name(desk: &mut TicketQueueManager) -> Option<String> {
        desk.serve_next().map(|t| t.name.clone())
    }

    #[test]
    fn test_ids_follow_priority_counters() {
        let mut desk = seeded();

        assert_eq!(add(&mut desk, "Ana", Priority::Urgent).as_str(), "U1");
        assert_eq!(add(&mut desk, "Cal", Priority::Normal).as_str(), "N1");
        assert_eq!(add(&mut desk, "Ben", Priority::Urgent).as_str(), "U2");

        assert_eq!(desk.urgent_counter(), 2);
        assert_eq!(desk.normal_counter(), 1);
    }

    #[test]
    fn test_add_client_rejects_blank_name() {
        let mut desk = seeded();

        let result = desk.add_client("   ", RequestType::Support, Priority::Normal);
        assert!(matches!(result, Err(DeskError::InvalidInput(_))));

        assert_eq!(desk.total_waiting(), 0);
        assert!(desk.journal().is_empty());
        assert_eq!(desk.normal_counter(), 0);
    }

    #[test]
    fn test_add_client_trims_name_and_journals() {
        let mut desk = seeded();
        let ticket = desk
            .add_client("  Ana ", RequestType::Complaint, Priority::Urgent)
            .unwrap();
        assert_eq!(ticket.name, "Ana");
        assert_eq!(ticket.service_minutes(), 0.0);

        let last = desk.last_action().unwrap();
        assert_eq!(last.kind(), ActionKind::Add);
        assert_eq!(last.ticket_id().as_str(), "U1");
    }

    #[test]
    fn test_serve_two_urgent_then_one_normal() {
        let mut desk = seeded();
        for name in ["U-a", "U-b", "U-c", "U-d"] {
            add(&mut desk, name, Priority::Urgent);
        }
        for name in ["N-a", "N-b"] {
            add(&mut desk, name, Priority::Normal);
        }

        let order: Vec<String> = std::iter::from_fn(|| served_name(&mut desk)).collect();
        assert_eq!(order, vec!["U-a", "U-b", "N-a", "U-c", "U-d", "N-b"]);
    }

    #[test]
    fn test_urgent_served_when_normal_empty() {
        let mut desk = seeded();
        for name in ["A", "B", "C"] {
            add(&mut desk, name, Priority::Urgent);
        }

        assert_eq!(served_name(&mut desk).as_deref(), Some("A"));
        assert_eq!(served_name(&mut desk).as_deref(), Some("B"));
        assert_eq!(desk.cycle_counter(), 2);

        // Budget spent but no normal client: urgent continues, cycle untouched
        assert_eq!(served_name(&mut desk).as_deref(), Some("C"));
        assert_eq!(desk.cycle_counter(), 2);

        add(&mut desk, "D", Priority::Urgent);
        add(&mut desk, "E", Priority::Normal);
        assert_eq!(served_name(&mut desk).as_deref(), Some("E"));
        assert_eq!(desk.cycle_counter(), 0);
        assert_eq!(served_name(&mut desk).as_deref(), Some("D"));
    }

    #[test]
    fn test_normal_drained_without_urgent() {
        let mut desk = seeded();
        add(&mut desk, "A", Priority::Normal);
        add(&mut desk, "B", Priority::Normal);

        assert_eq!(served_name(&mut desk).as_deref(), Some("A"));
        assert_eq!(served_name(&mut desk).as_deref(), Some("B"));
        assert!(desk.serve_next().is_none());
    }

    #[test]
    fn test_service_time_within_bounds() {
        let mut desk = seeded();
        for i in 0..50 {
            add(&mut desk, &format!("client {}", i), Priority::Normal);
        }
        while desk.serve_next().is_some() {}

        assert_eq!(desk.total_served(), 50);
        for ticket in desk.history() {
            assert!(ticket.service_minutes() >= 5.0);
            assert!(ticket.service_minutes() < 20.0);
        }
        let avg = desk.average_service_time();
        assert!((5.0..20.0).contains(&avg));
    }

    #[test]
    fn test_same_seed_same_service_times() {
        let run = || {
            let mut desk = seeded();
            add(&mut desk, "A", Priority::Urgent);
            add(&mut desk, "B", Priority::Normal);
            desk.serve_next();
            desk.serve_next();
            desk.history()
                .map(Ticket::service_minutes)
                .collect::<Vec<f64>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_remove_by_id_from_middle_of_queue() {
        let mut desk = seeded();
        add(&mut desk, "A", Priority::Normal);
        let b = add(&mut desk, "B", Priority::Normal);
        add(&mut desk, "C", Priority::Normal);

        assert!(desk.remove_by_id("n2"));
        assert_eq!(desk.locate(&b), TicketLocation::Untracked);

        let names: Vec<&str> = desk.normal_queue().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(desk.last_action().unwrap().kind(), ActionKind::Remove);
    }

    #[test]
    fn test_remove_unknown_or_served_id() {
        let mut desk = seeded();
        add(&mut desk, "A", Priority::Urgent);
        desk.serve_next();
        let journal_len = desk.journal().len();

        assert!(!desk.remove_by_id("U1"));
        assert!(!desk.remove_by_id("U99"));
        assert_eq!(desk.total_served(), 1);
        assert_eq!(desk.journal().len(), journal_len);
    }

    #[test]
    fn test_undo_add() {
        let mut desk = seeded();
        let id = add(&mut desk, "A", Priority::Normal);

        desk.undo_last();

        assert_eq!(desk.total_waiting(), 0);
        assert_eq!(desk.locate(&id), TicketLocation::Untracked);
        assert_eq!(desk.journal().len(), 2);
        assert_eq!(desk.last_action().unwrap().kind(), ActionKind::Restore);
        // Journal still points at the untracked ticket
        assert_eq!(desk.ticket(&id).unwrap().name, "A");
    }

    #[test]
    fn test_undo_remove_reinserts_at_head() {
        let mut desk = seeded();
        add(&mut desk, "A", Priority::Urgent);
        add(&mut desk, "B", Priority::Urgent);
        assert!(desk.remove_by_id("U2"));

        desk.undo_last();

        let names: Vec<&str> = desk.urgent_queue().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_undo_serve_returns_ticket_to_head() {
        let mut desk = seeded();
        add(&mut desk, "A", Priority::Normal);
        add(&mut desk, "B", Priority::Normal);
        desk.serve_next();
        let minutes = desk.history().next().unwrap().service_minutes();

        desk.undo_last();

        assert_eq!(desk.total_served(), 0);
        let head = desk.normal_queue().next().unwrap();
        assert_eq!(head.name, "A");
        // Duration stays as first recorded
        assert_eq!(head.service_minutes(), minutes);

        desk.serve_next();
        assert_eq!(desk.history().next().unwrap().service_minutes(), minutes);
    }

    #[test]
    fn test_undone_serve_is_waiting_again() {
        let mut desk = seeded();
        let id = add(&mut desk, "Eve", Priority::Urgent);
        desk.serve_next();
        assert_eq!(desk.locate(&id), TicketLocation::Served);

        desk.undo_last();

        assert_eq!(desk.locate(&id), TicketLocation::WaitingUrgent);
        assert!(desk.search_by_id("u1").iter().all(|t| t.id == id));
        assert!(desk.history().next().is_none());
        // The recorded duration survives, but it no longer means "served"
        assert!(desk.ticket(&id).unwrap().has_service_time());
    }

    #[test]
    fn test_lowercase_prefix_ids_resolve() {
        let config = DeskConfig {
            urgent_prefix: "u".to_string(),
            ..DeskConfig::default().with_seed(11)
        };
        let mut desk = TicketQueueManager::new(config).unwrap();
        let issued = add(&mut desk, "Ana", Priority::Urgent);
        assert_eq!(issued.as_str(), "U1");

        let parsed: TicketId = "u1".parse().unwrap();
        assert_eq!(desk.locate(&parsed), TicketLocation::WaitingUrgent);
        assert_eq!(desk.ticket(&parsed).unwrap().name, "Ana");
    }

    #[test]
    fn test_exhausted_counter_is_an_error() {
        let mut desk = seeded();
        desk.urgent_counter = u32::MAX;

        let result = desk.add_client("Late", RequestType::Support, Priority::Urgent);
        assert!(matches!(
            result,
            Err(DeskError::CounterExhausted(Priority::Urgent))
        ));
        assert_eq!(desk.urgent_counter(), u32::MAX);
        assert_eq!(desk.total_waiting(), 0);
        assert!(desk.journal().is_empty());

        // The other priority keeps issuing ids
        assert_eq!(add(&mut desk, "Cal", Priority::Normal).as_str(), "N1");
    }

    #[test]
    fn test_repeated_undo_only_appends_restore() {
        let mut desk = seeded();
        add(&mut desk, "A", Priority::Urgent);
        add(&mut desk, "B", Priority::Urgent);

        desk.undo_last();
        assert!(!desk.can_undo());
        let waiting = desk.total_waiting();

        desk.undo_last();
        desk.undo_last();

        assert_eq!(desk.total_waiting(), waiting);
        assert_eq!(desk.journal().len(), 5);
        assert!(desk
            .journal()
            .iter()
            .skip(2)
            .all(|r| r.kind() == ActionKind::Restore));
    }

    #[test]
    fn test_undo_on_empty_journal_is_noop() {
        let mut desk = seeded();
        assert!(!desk.can_undo());

        desk.undo_last();

        assert!(desk.journal().is_empty());
        assert_eq!(desk.total_waiting(), 0);
        assert_eq!(desk.total_served(), 0);
    }

    #[test]
    fn test_search_order_and_criteria() {
        let mut desk = seeded();
        desk.add_client("A", RequestType::Support, Priority::Normal)
            .unwrap();
        desk.add_client("B", RequestType::Complaint, Priority::Urgent)
            .unwrap();
        desk.add_client("C", RequestType::Support, Priority::Urgent)
            .unwrap();
        desk.serve_next();

        let support: Vec<&str> = desk
            .search_by_type(RequestType::Support)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        // Urgent queue (C), normal queue (A); B is in history
        assert_eq!(support, vec!["C", "A"]);

        let urgent: Vec<&str> = desk
            .search_by_priority(Priority::Urgent)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(urgent, vec!["C", "B"]);

        assert_eq!(desk.search_by_id("u1").len(), 1);
        assert!(desk.search_by_id("U9").is_empty());
    }

    #[test]
    fn test_counts_cover_history_only() {
        let mut desk = seeded();
        desk.add_client("A", RequestType::Maintenance, Priority::Urgent)
            .unwrap();
        desk.add_client("B", RequestType::Maintenance, Priority::Normal)
            .unwrap();
        desk.serve_next();

        assert_eq!(desk.count_by_type(RequestType::Maintenance), 1);
        assert_eq!(desk.count_by_priority(Priority::Urgent), 1);
        assert_eq!(desk.count_by_priority(Priority::Normal), 0);
    }

    #[test]
    fn test_custom_burst_and_prefixes() {
        let config = DeskConfig {
            urgent_prefix: "P".to_string(),
            normal_prefix: "R".to_string(),
            urgent_burst: 1,
            ..DeskConfig::default().with_seed(1)
        };
        let mut desk = TicketQueueManager::new(config).unwrap();
        assert_eq!(add(&mut desk, "A", Priority::Urgent).as_str(), "P1");
        assert_eq!(add(&mut desk, "B", Priority::Urgent).as_str(), "P2");
        assert_eq!(add(&mut desk, "C", Priority::Normal).as_str(), "R1");

        let order: Vec<String> = std::iter::from_fn(|| served_name(&mut desk)).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = DeskConfig {
            urgent_burst: 0,
            ..DeskConfig::default()
        };
        assert!(matches!(
            TicketQueueManager::new(config),
            Err(DeskError::ConfigError(_))
        ));
    }
}
