// Client module - Log client for a single service instance logs endpoint

use crate::error::Result;
use crate::logs::{format_record, ChronologicalSorter, DisplayZone, Sorter};
use crate::stream;
use crate::transport::{Transport, WebSocketTransport};
use std::io::Write;
use tracing::debug;

/// Settings consumed once to build a [`LogClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// URL of the logs endpoint the transport talks to
    pub endpoint_url: String,
    /// Accept server certificates without chain or hostname validation.
    /// Not recommended.
    pub insecure_skip_verify: bool,
    /// Zone timestamps are rendered in
    pub display_zone: DisplayZone,
}

impl ClientConfig {
    pub fn new(endpoint_url: impl Into<String>, insecure_skip_verify: bool) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            insecure_skip_verify,
            display_zone: DisplayZone::local(),
        }
    }
}

/// Build the authorization header value for `token`
pub fn bearer_header(token: &str) -> String {
    format!("bearer {}", token)
}

/// Retrieves and formats logs through a transport.
///
/// Holds no state between calls.
pub struct LogClient {
    endpoint: String,
    transport: Box<dyn Transport>,
    sorter: Box<dyn Sorter>,
    zone: DisplayZone,
}

impl LogClient {
    /// Build a client wired to the default transport and sorter.
    ///
    /// No network I/O happens here; only TLS setup can fail.
    pub fn build(config: ClientConfig) -> Result<Self> {
        let transport =
            WebSocketTransport::new(config.endpoint_url.clone(), config.insecure_skip_verify)?;
        Ok(Self::with_parts(
            config.endpoint_url,
            Box::new(transport),
            Box::new(ChronologicalSorter),
            config.display_zone,
        ))
    }

    /// Assemble a client from explicit parts
    pub fn with_parts(
        endpoint: impl Into<String>,
        transport: Box<dyn Transport>,
        sorter: Box<dyn Sorter>,
        zone: DisplayZone,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            sorter,
            zone,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn display_zone(&self) -> DisplayZone {
        self.zone
    }

    /// Fetch the recent batch for `target_id`, oldest first, as display lines
    pub async fn recent_logs(&self, target_id: &str, auth_token: &str) -> Result<Vec<String>> {
        let records = self
            .transport
            .fetch_recent(target_id, &bearer_header(auth_token))
            .await?;
        debug!(count = records.len(), "Received recent logs");

        let lines = self
            .sorter
            .sort_recent(records)
            .iter()
            .map(|record| format_record(record, self.zone))
            .collect();

        Ok(lines)
    }

    /// Stream live logs for `target_id` into `sink` until the stream ends.
    ///
    /// Returns the first non-suppressed stream error, or `Ok(())` once the
    /// stream closes cleanly and every received line has been written.
    pub async fn tailing_logs<W>(&self, target_id: &str, auth_token: &str, sink: W) -> Result<()>
    where
        W: Write + Send + 'static,
    {
        let channels = self
            .transport
            .open_tail(target_id, &bearer_header(auth_token));
        stream::tail(channels, self.zone, sink).await
    }
}
