use std::collections::HashMap;
use std::time::Duration;

use super::TicketStore;
use crate::error::StoreError;

/// In-process ticket store for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tickets: HashMap<String, String>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(mut self, id: &str, status: &str) -> Self {
        self.tickets.insert(id.to_string(), status.to_string());
        self
    }

    /// Every lookup fails as if the store were unreachable.
    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Every lookup sleeps before answering.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl TicketStore for MemoryStore {
    async fn lookup(&self, ticket_id: &str) -> Result<Option<String>, StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.failure {
            return Err(StoreError::Status {
                status: 503,
                body: reason.clone(),
            });
        }
        Ok(self.tickets.get(ticket_id).cloned())
    }
}
