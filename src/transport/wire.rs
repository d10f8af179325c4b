// JSON encoding of log records exchanged with the logs endpoint

use crate::error::{Result, SilError};
use crate::logs::{LogRecord, MessageKind};
use serde::{Deserialize, Serialize};

/// A log record as encoded on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRecord {
    /// Epoch nanoseconds
    pub timestamp: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub source_instance: String,
    pub message_type: MessageKind,
}

impl From<WireRecord> for LogRecord {
    fn from(wire: WireRecord) -> Self {
        LogRecord {
            timestamp_nanos: wire.timestamp,
            message: wire.message.into_bytes(),
            source_type: wire.source_type,
            source_instance: wire.source_instance,
            kind: wire.message_type,
        }
    }
}

impl From<&LogRecord> for WireRecord {
    fn from(record: &LogRecord) -> Self {
        WireRecord {
            timestamp: record.timestamp_nanos,
            message: record.message_text(),
            source_type: record.source_type.clone(),
            source_instance: record.source_instance.clone(),
            message_type: record.kind,
        }
    }
}

/// Decode a single record, as carried by one stream frame
pub fn decode_record(payload: &[u8]) -> Result<LogRecord> {
    serde_json::from_slice::<WireRecord>(payload)
        .map(LogRecord::from)
        .map_err(|e| SilError::DeserializationError(e.to_string()))
}

/// Decode a recent-logs response body (a JSON array of records)
pub fn decode_batch(body: &[u8]) -> Result<Vec<LogRecord>> {
    serde_json::from_slice::<Vec<WireRecord>>(body)
        .map(|records| records.into_iter().map(LogRecord::from).collect())
        .map_err(|e| SilError::DeserializationError(e.to_string()))
}

/// Encode a record as JSON
pub fn encode_record(record: &LogRecord) -> Result<String> {
    serde_json::to_string(&WireRecord::from(record))
        .map_err(|e| SilError::DeserializationError(e.to_string()))
}
