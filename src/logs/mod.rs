// Logs module - Log records, display formatting and ordering

mod format;
mod record;
mod sort;

pub use format::{format_record, format_timestamp, DisplayZone, LOG_TIMESTAMP_FORMAT};
pub use record::{LogRecord, MessageKind};
pub use sort::{ChronologicalSorter, Sorter};
