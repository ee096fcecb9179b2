//! Ticket status lookup against the external document store.
//!
//! [`TicketStore`] is the seam the call flow and the status endpoint depend
//! on. [`TicketBackend`] is what `main` builds from configuration: either a
//! working Firestore client or a degraded backend that reports every lookup
//! as unavailable.

pub mod credentials;
pub mod firestore;
#[cfg(test)]
pub mod memory;

use std::future::Future;

use crate::config::StoreConfig;
use crate::error::StoreError;

pub use firestore::FirestoreStore;

/// Read-only access to ticket documents.
pub trait TicketStore: Send + Sync {
    /// Status of `ticket_id`, or `None` when no such ticket exists.
    fn lookup(
        &self,
        ticket_id: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
}

/// The store handle shared by all request handlers.
pub enum TicketBackend {
    Firestore(FirestoreStore),
    /// Bootstrap failed; every lookup fails with the recorded reason.
    Unavailable(String),
}

impl TicketBackend {
    /// Build the backend from configuration, degrading instead of failing.
    pub fn connect(config: &StoreConfig) -> Self {
        match FirestoreStore::from_config(config) {
            Ok(store) => {
                tracing::info!(project = store.project_id(), "ticket store initialized");
                TicketBackend::Firestore(store)
            }
            Err(e) => {
                tracing::error!(error = %e, "ticket store initialization failed; lookups will be unavailable");
                TicketBackend::Unavailable(e.to_string())
            }
        }
    }
}

impl TicketStore for TicketBackend {
    async fn lookup(&self, ticket_id: &str) -> Result<Option<String>, StoreError> {
        match self {
            TicketBackend::Firestore(store) => store.lookup(ticket_id).await,
            TicketBackend::Unavailable(reason) => Err(StoreError::Unconfigured(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_backend_reports_error() {
        let backend = TicketBackend::Unavailable("no key file".into());
        let err = backend.lookup("123456").await.unwrap_err();
        assert!(matches!(err, StoreError::Unconfigured(ref r) if r == "no key file"));
    }

    #[test]
    fn connect_without_credentials_degrades() {
        let config = StoreConfig {
            credentials_paths: vec!["/nonexistent/firebase-key.json".into()],
            ..StoreConfig::default()
        };
        assert!(matches!(
            TicketBackend::connect(&config),
            TicketBackend::Unavailable(_)
        ));
    }

    #[test]
    fn connect_to_emulator_needs_no_credentials() {
        let config = StoreConfig {
            project_id: Some("demo-ivr".into()),
            emulator_host: Some("localhost:8080".into()),
            credentials_paths: Vec::new(),
            ..StoreConfig::default()
        };
        assert!(matches!(
            TicketBackend::connect(&config),
            TicketBackend::Firestore(_)
        ));
    }
}
