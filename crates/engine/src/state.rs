//! Shared application state handed to every handler

use std::sync::Arc;
use std::time::Duration;

use plaza_domain::DomainError;

use crate::connections::RoomConnectionManager;
use crate::persistence::PersistenceGateway;

/// Everything a handler needs, cheap to clone behind `Arc`
pub struct AppState {
    /// Live connections and room fan-out
    pub connections: Arc<RoomConnectionManager>,

    /// Durable-state gateway
    pub gateway: Arc<dyn PersistenceGateway>,

    /// Upper bound on any single gateway call
    pub persistence_timeout: Duration,
}

impl AppState {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, persistence_timeout: Duration) -> Self {
        Self {
            connections: Arc::new(RoomConnectionManager::new()),
            gateway,
            persistence_timeout,
        }
    }

    /// Run a gateway call under the configured timeout.
    ///
    /// A hung backing store must never wedge a connection's receive loop, so
    /// an overrun becomes an ordinary persistence error for the caller.
    pub async fn persist<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, DomainError>>,
    ) -> Result<T, DomainError> {
        match tokio::time::timeout(self.persistence_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::persistence("backing store call timed out")),
        }
    }
}
