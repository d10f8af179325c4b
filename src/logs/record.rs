use serde::{Deserialize, Serialize};
use std::fmt;

/// Stream a log record was written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    Out,
    Err,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Out => write!(f, "OUT"),
            MessageKind::Err => write!(f, "ERR"),
        }
    }
}

/// A single log record received from the logs endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Epoch nanoseconds
    pub timestamp_nanos: i64,
    /// Raw message payload
    pub message: Vec<u8>,
    pub source_type: String,
    pub source_instance: String,
    pub kind: MessageKind,
}

impl LogRecord {
    pub fn new(
        timestamp_nanos: i64,
        message: impl Into<Vec<u8>>,
        source_type: impl Into<String>,
        source_instance: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            timestamp_nanos,
            message: message.into(),
            source_type: source_type.into(),
            source_instance: source_instance.into(),
            kind,
        }
    }

    /// Message text, with invalid UTF-8 sequences replaced
    pub fn message_text(&self) -> String {
        String::from_utf8_lossy(&self.message).into_owned()
    }
}
