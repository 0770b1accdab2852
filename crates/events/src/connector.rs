use crate::transport::{Transport, TransportError};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

/// Serialises connection attempts so concurrent publishers and subscribers
/// share a single connect.
pub struct Connector<Tr: Transport> {
    transport: Arc<Tr>,
    connect_timeout: Duration,
    gate: Mutex<()>,
}

impl<Tr: Transport> Connector<Tr> {
    pub fn new(transport: Arc<Tr>, connect_timeout: Duration) -> Self {
        Self {
            transport,
            connect_timeout,
            gate: Mutex::new(()),
        }
    }

    pub const fn transport(&self) -> &Arc<Tr> {
        &self.transport
    }

    /// Connects unless already connected, bounded by the connect timeout.
    pub async fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.transport.is_connected() {
            return Ok(());
        }

        let _guard = self.gate.lock().await;

        // Another caller may have connected while we waited.
        if self.transport.is_connected() {
            return Ok(());
        }

        debug!("connecting transport (timeout {:?})", self.connect_timeout);

        match tokio::time::timeout(self.connect_timeout, self.transport.connect()).await {
            Ok(Ok(())) => {
                info!("transport connected");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}
