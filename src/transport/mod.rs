// Transport module - Access to the remote logs endpoint

mod websocket;
pub mod wire;

pub use websocket::WebSocketTransport;

use crate::error::{Result, SilError};
use crate::logs::LogRecord;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Buffer size of each live tail channel
pub const TAIL_CHANNEL_CAPACITY: usize = 100;

/// Receiving ends of a live tail.
///
/// Both channels close once the underlying connection ends, whatever the
/// reason.
#[derive(Debug)]
pub struct TailChannels {
    pub messages: mpsc::Receiver<LogRecord>,
    pub errors: mpsc::Receiver<SilError>,
}

/// Sending ends of a live tail, held by whatever drives the connection
#[derive(Debug, Clone)]
pub struct TailSenders {
    pub messages: mpsc::Sender<LogRecord>,
    pub errors: mpsc::Sender<SilError>,
}

impl TailChannels {
    /// Create a connected set of tail channels
    pub fn pair() -> (TailSenders, TailChannels) {
        let (msg_tx, msg_rx) = mpsc::channel(TAIL_CHANNEL_CAPACITY);
        let (err_tx, err_rx) = mpsc::channel(TAIL_CHANNEL_CAPACITY);
        (
            TailSenders {
                messages: msg_tx,
                errors: err_tx,
            },
            TailChannels {
                messages: msg_rx,
                errors: err_rx,
            },
        )
    }
}

/// Retrieval of log records for a target from the logs endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the batch of records currently buffered for `target_id`, in no
    /// particular order
    async fn fetch_recent(&self, target_id: &str, auth_header: &str) -> Result<Vec<LogRecord>>;

    /// Open a live tail for `target_id`.
    ///
    /// Never fails up front: connection and protocol failures are delivered
    /// on the error channel.
    fn open_tail(&self, target_id: &str, auth_header: &str) -> TailChannels;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch_recent(&self, target_id: &str, auth_header: &str) -> Result<Vec<LogRecord>> {
        (**self).fetch_recent(target_id, auth_header).await
    }

    fn open_tail(&self, target_id: &str, auth_header: &str) -> TailChannels {
        (**self).open_tail(target_id, auth_header)
    }
}
