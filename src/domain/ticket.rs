use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::DeskError;

/// Identifier of a ticket: a priority prefix followed by a counter (e.g. U1, N12)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(String);

impl TicketId {
    /// Creates a new TicketId from a prefix and a counter.
    /// The prefix is stored upper-case, the same form `FromStr` produces.
    pub fn new(prefix: &str, counter: u32) -> Self {
        Self(format!("{}{}", prefix.to_uppercase(), counter))
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against raw user input
    pub fn matches(&self, raw: &str) -> bool {
        self.0.eq_ignore_ascii_case(raw.trim())
    }
}

impl FromStr for TicketId {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        let digits_at = normalized
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| DeskError::InvalidTicketId(s.to_string()))?;
        let (prefix, number) = normalized.split_at(digits_at);

        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DeskError::InvalidTicketId(s.to_string()));
        }
        if number.parse::<u32>().is_err() {
            return Err(DeskError::InvalidTicketId(s.to_string()));
        }

        Ok(Self(normalized))
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority a client is admitted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Normal,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 2] = [Priority::Normal, Priority::Urgent];
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Urgent => write!(f, "URGENT"),
        }
    }
}

impl FromStr for Priority {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "urgent" => Ok(Self::Urgent),
            _ => Err(DeskError::InvalidPriority(s.to_string())),
        }
    }
}

/// Kind of service a client asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestType {
    Support,
    Maintenance,
    Complaint,
}

impl RequestType {
    pub const ALL: [RequestType; 3] = [
        RequestType::Support,
        RequestType::Maintenance,
        RequestType::Complaint,
    ];
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Support => write!(f, "SUPPORT"),
            Self::Maintenance => write!(f, "MAINTENANCE"),
            Self::Complaint => write!(f, "COMPLAINT"),
        }
    }
}

impl FromStr for RequestType {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "support" => Ok(Self::Support),
            "maintenance" => Ok(Self::Maintenance),
            "complaint" => Ok(Self::Complaint),
            _ => Err(DeskError::InvalidRequestType(s.to_string())),
        }
    }
}

/// One client's request at the counter
///
/// Tickets are owned by the [`TicketQueueManager`](crate::TicketQueueManager);
/// queues, history and journal entries refer to them by [`TicketId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub name: String,
    pub request_type: RequestType,
    pub priority: Priority,
    service_minutes: f64,
    pub arrival_time: DateTime<Utc>,
}

impl Ticket {
    /// Creates a waiting ticket arriving now
    pub fn new(id: TicketId, name: String, request_type: RequestType, priority: Priority) -> Self {
        Self {
            id,
            name,
            request_type,
            priority,
            service_minutes: 0.0,
            arrival_time: Utc::now(),
        }
    }

    /// Simulated service duration in minutes, 0 until served
    pub fn service_minutes(&self) -> f64 {
        self.service_minutes
    }

    /// Whether a service duration has been recorded
    pub fn has_service_time(&self) -> bool {
        self.service_minutes > 0.0
    }

    /// Records the service duration. Only the first call has an effect.
    pub(crate) fn record_service(&mut self, minutes: f64) -> bool {
        if self.has_service_time() {
            return false;
        }
        self.service_minutes = minutes;
        true
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}/{}]",
            self.id, self.name, self.request_type, self.priority
        )
    }
}
