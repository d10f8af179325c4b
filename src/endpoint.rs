// Endpoint resolution - Maps a discovered logs endpoint onto the URL used
// for each retrieval mode

use crate::error::{Result, SilError};
use std::fmt;
use url::Url;

/// How logs are retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Fetch the recent batch once and print it
    Dump,
    /// Stream live records until the connection ends
    Tail,
}

/// A parsed logs endpoint URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    /// Host, including the port when one was given
    pub host: String,
    pub path: String,
}

impl Endpoint {
    /// Parse an absolute endpoint URL
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| SilError::EndpointFormat(format!("'{}': {}", raw, e)))?;

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(SilError::EndpointFormat(format!("'{}': missing host", raw)));
            }
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            path: url.path().to_string(),
        })
    }

    /// The WebSocket form of this endpoint: `https` becomes `wss`, any other
    /// scheme becomes `ws`, and the path is dropped
    pub fn for_streaming(&self) -> Endpoint {
        let scheme = if self.scheme == "https" { "wss" } else { "ws" };
        Endpoint {
            scheme: scheme.to_string(),
            host: self.host.clone(),
            path: String::new(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}

/// Resolve the URL handed to the log client for `mode`.
///
/// Dump mode uses the discovered endpoint unchanged. Tail mode converts it to
/// its WebSocket form, and a malformed URL is rejected before any client is
/// built.
pub fn resolve_endpoint(discovered: &str, mode: LogMode) -> Result<String> {
    match mode {
        LogMode::Dump => Ok(discovered.to_string()),
        LogMode::Tail => Ok(Endpoint::parse(discovered)?.for_streaming().to_string()),
    }
}
