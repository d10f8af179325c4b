// Default transport: recent logs over HTTP(S), live logs over WebSocket

use crate::endpoint::Endpoint;
use crate::error::{Result, SilError, ABNORMAL_CLOSURE_MARKER};
use crate::logs::LogRecord;
use crate::transport::{wire, TailChannels, TailSenders, Transport};
use async_trait::async_trait;
use futures::StreamExt;
use std::io::ErrorKind;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError};
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, AUTHORIZATION};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{debug, info};
use url::Url;

/// Transport talking to a service instance logs endpoint.
///
/// Recent logs: `GET <http|https>://<host>/logs/<target>/recentlogs`.
/// Live logs: WebSocket at `<endpoint>/logs/<target>/stream`.
#[derive(Debug)]
pub struct WebSocketTransport {
    endpoint: String,
    http: reqwest::Client,
    tls: native_tls::TlsConnector,
}

impl WebSocketTransport {
    /// Create a transport for `endpoint`. Performs no network I/O.
    ///
    /// With `insecure_skip_verify` set, server certificates are accepted
    /// without chain or hostname validation.
    pub fn new(endpoint: impl Into<String>, insecure_skip_verify: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(insecure_skip_verify)
            .danger_accept_invalid_hostnames(insecure_skip_verify)
            .build()
            .map_err(|e| SilError::Tls(format!("Failed to create HTTP client: {}", e)))?;

        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(insecure_skip_verify)
            .danger_accept_invalid_hostnames(insecure_skip_verify)
            .build()
            .map_err(|e| SilError::Tls(format!("Failed to create TLS connector: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
            tls,
        })
    }

    /// URL of the recent logs batch for `target_id`
    pub fn recent_url(&self, target_id: &str) -> Result<String> {
        let endpoint = Endpoint::parse(&self.endpoint)?;
        let scheme = match endpoint.scheme.as_str() {
            "ws" | "http" => "http",
            _ => "https",
        };
        let base = Url::parse(&format!("{}://{}/", scheme, endpoint.host))
            .map_err(|e| SilError::EndpointFormat(format!("'{}': {}", self.endpoint, e)))?;
        with_target_path(base, target_id, "recentlogs")
    }

    /// URL of the live stream for `target_id`
    pub fn stream_url(&self, target_id: &str) -> Result<String> {
        let base = Url::parse(&self.endpoint)
            .map_err(|e| SilError::EndpointFormat(format!("'{}': {}", self.endpoint, e)))?;
        with_target_path(base, target_id, "stream")
    }
}

/// Append `logs/<target_id>/<leaf>` to the path of `base`. The target is
/// percent-encoded as a single segment.
fn with_target_path(mut base: Url, target_id: &str, leaf: &str) -> Result<String> {
    base
        .path_segments_mut()
        .map_err(|_| SilError::EndpointFormat("endpoint cannot be a base URL".to_string()))?
        .pop_if_empty()
        .extend(["logs", target_id, leaf]);
    base.set_query(None);
    base.set_fragment(None);
    Ok(base.into())
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn fetch_recent(&self, target_id: &str, auth_header: &str) -> Result<Vec<LogRecord>> {
        let url = self.recent_url(target_id)?;
        debug!(%url, "Fetching recent logs");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(|e| SilError::Transport(format!("Recent logs request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SilError::Transport(format!(
                "Recent logs request failed with status {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SilError::Transport(format!("Failed to read recent logs: {}", e)))?;

        wire::decode_batch(&body)
    }

    fn open_tail(&self, target_id: &str, auth_header: &str) -> TailChannels {
        let (senders, channels) = TailChannels::pair();
        let url = self.stream_url(target_id);
        let auth_header = auth_header.to_string();
        let connector = Connector::NativeTls(self.tls.clone());

        tokio::spawn(async move {
            let result = match url {
                Ok(url) => stream_records(&url, &auth_header, connector, &senders).await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                // Receiver may already be gone
                let _ = senders.errors.send(err).await;
            }
            debug!("Log stream ended");
            // Dropping the senders closes both channels
        });

        channels
    }
}

/// Pump frames from the stream connection into the tail channels until the
/// connection ends
async fn stream_records(
    url: &str,
    auth_header: &str,
    connector: Connector,
    senders: &TailSenders,
) -> Result<()> {
    let mut request = url
        .into_client_request()
        .map_err(|e| SilError::Transport(format!("websocket: {}", e)))?;
    let header = HeaderValue::from_str(auth_header)
        .map_err(|e| SilError::Transport(format!("Invalid authorization header: {}", e)))?;
    request.headers_mut().insert(AUTHORIZATION, header);

    let (mut socket, _) = connect_async_tls_with_config(request, None, false, Some(connector))
        .await
        .map_err(stream_error)?;
    info!(%url, "Connected to log stream");

    while let Some(frame) = socket.next().await {
        let payload = match frame.map_err(stream_error)? {
            Message::Text(text) => text.into_bytes(),
            Message::Binary(bytes) => bytes,
            Message::Close(frame) => return close_outcome(frame),
            _ => continue,
        };

        let delivered = match wire::decode_record(&payload) {
            Ok(record) => senders.messages.send(record).await.is_ok(),
            Err(err) => senders.errors.send(err).await.is_ok(),
        };
        if !delivered {
            debug!("Tail receiver dropped, closing log stream");
            break;
        }
    }

    Ok(())
}

/// Map a close frame onto the end of the stream. Normal closure is clean.
fn close_outcome(frame: Option<CloseFrame<'_>>) -> Result<()> {
    match frame {
        None => Ok(()),
        Some(frame) if matches!(frame.code, CloseCode::Normal | CloseCode::Away) => Ok(()),
        Some(frame) => Err(SilError::Transport(format!(
            "websocket: close {} ({})",
            u16::from(frame.code),
            frame.reason
        ))),
    }
}

fn stream_error(err: WsError) -> SilError {
    let abnormal = match &err {
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        WsError::Io(io) => matches!(
            io.kind(),
            ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
        ),
        _ => false,
    };

    if abnormal {
        SilError::Transport(format!(
            "websocket: {} (abnormal closure): {}",
            ABNORMAL_CLOSURE_MARKER, err
        ))
    } else {
        SilError::Transport(format!("websocket: {}", err))
    }
}
