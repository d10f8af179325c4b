use crate::logs::LogRecord;

/// Orders a batch of recent log records before display
pub trait Sorter: Send + Sync {
    fn sort_recent(&self, records: Vec<LogRecord>) -> Vec<LogRecord>;
}

/// Oldest first. Records sharing a timestamp keep the order the endpoint
/// returned them in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronologicalSorter;

impl Sorter for ChronologicalSorter {
    fn sort_recent(&self, mut records: Vec<LogRecord>) -> Vec<LogRecord> {
        // slice::sort_by_key is stable
        records.sort_by_key(|record| record.timestamp_nanos);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::MessageKind;

    fn record(name: &str, ts: i64) -> LogRecord {
        LogRecord::new(ts, name, "ST", "SI", MessageKind::Out)
    }

    fn names(records: &[LogRecord]) -> Vec<String> {
        records.iter().map(|r| r.message_text()).collect()
    }

    #[test]
    fn test_sorts_oldest_first() {
        let sorted = ChronologicalSorter.sort_recent(vec![
            record("recent", 3_000),
            record("older", 2_000),
            record("oldest", 1_000),
        ]);
        assert_eq!(names(&sorted), vec!["oldest", "older", "recent"]);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let sorted = ChronologicalSorter.sort_recent(vec![
            record("first", 5),
            record("second", 5),
            record("early", 1),
            record("third", 5),
        ]);
        assert_eq!(names(&sorted), vec!["early", "first", "second", "third"]);
    }

    #[test]
    fn test_large_batch_is_stable() {
        // Many ties across a handful of timestamps
        let records: Vec<LogRecord> = (0..500)
            .map(|i| record(&i.to_string(), (i * 7 % 5) as i64))
            .collect();
        let sorted = ChronologicalSorter.sort_recent(records);

        for pair in sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.timestamp_nanos <= b.timestamp_nanos);
            if a.timestamp_nanos == b.timestamp_nanos {
                let ia: usize = a.message_text().parse().unwrap();
                let ib: usize = b.message_text().parse().unwrap();
                assert!(ia < ib);
            }
        }
    }

    #[test]
    fn test_empty_batch() {
        assert!(ChronologicalSorter.sort_recent(Vec::new()).is_empty());
    }
}
