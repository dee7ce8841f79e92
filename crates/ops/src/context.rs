//! Operations context for dependency injection

use crate::settings::transfer_config;
use drs_config::Config;
use drs_download::TransferConfig;
use drs_errors::{Error, OpsError};
use drs_events::{EventEmitter, EventSender};
use drs_net::Transport;
use drs_types::AuthHeaders;
use std::sync::Arc;

/// Operations context providing access to all client components
pub struct OpsCtx {
    /// Metadata and byte transport for the target server
    pub transport: Arc<dyn Transport>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Pool, retry and checksum settings for downloads
    pub transfer: TransferConfig,
    /// Headers sent with every request
    pub headers: AuthHeaders,
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for the operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    transport: Option<Arc<dyn Transport>>,
    tx: Option<EventSender>,
    transfer: Option<TransferConfig>,
    headers: Option<AuthHeaders>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn with_transfer_config(mut self, transfer: TransferConfig) -> Self {
        self.transfer = Some(transfer);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: AuthHeaders) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Take transfer settings and auth headers from a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configured checksum algorithm is not supported.
    pub fn with_config(self, config: &Config) -> Result<Self, Error> {
        Ok(self
            .with_transfer_config(transfer_config(config)?)
            .with_headers(config.auth_headers()))
    }

    /// Build the context
    ///
    /// Transfer settings and headers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport or the event sender was not provided.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let transport = self
            .transport
            .ok_or_else(|| OpsError::MissingComponent {
                component: "transport".to_string(),
            })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        Ok(OpsCtx {
            transport,
            tx,
            transfer: self.transfer.unwrap_or_default(),
            headers: self.headers.unwrap_or_default(),
        })
    }
}
