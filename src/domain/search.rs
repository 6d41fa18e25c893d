use std::str::FromStr;

use crate::domain::ticket::{Priority, RequestType, Ticket};
use crate::error::DeskError;

/// Criterion for looking up tickets across queues and history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Case-insensitive ticket id
    Id(String),
    Priority(Priority),
    RequestType(RequestType),
}

impl SearchCriteria {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            Self::Id(raw) => ticket.id.matches(raw),
            Self::Priority(priority) => ticket.priority == *priority,
            Self::RequestType(request_type) => ticket.request_type == *request_type,
        }
    }
}

/// Parses `field:value` queries such as `id:u3`, `priority:urgent` or `type:complaint`
impl FromStr for SearchCriteria {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, value) = s
            .split_once(':')
            .ok_or_else(|| DeskError::InvalidInput(format!("expected field:value, got '{}'", s)))?;

        match field.trim().to_lowercase().as_str() {
            "id" => Ok(Self::Id(value.trim().to_string())),
            "priority" => Ok(Self::Priority(value.parse()?)),
            "type" => Ok(Self::RequestType(value.parse()?)),
            _ => Err(DeskError::InvalidInput(format!(
                "Invalid search field '{}'. Valid fields: id, priority, type",
                field
            ))),
        }
    }
}
