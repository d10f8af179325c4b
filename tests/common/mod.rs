// Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use silogs::error::{Result, SilError};
use silogs::logs::{LogRecord, MessageKind};
use silogs::transport::{TailChannels, Transport};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Transport whose responses are scripted by the test
#[derive(Default)]
pub struct FakeTransport {
    pub recent: Mutex<Option<Result<Vec<LogRecord>>>>,
    pub tail: Mutex<Option<TailChannels>>,
    pub recent_calls: Mutex<Vec<(String, String)>>,
    pub tail_calls: Mutex<Vec<(String, String)>>,
}

impl FakeTransport {
    pub fn with_recent(result: Result<Vec<LogRecord>>) -> Arc<Self> {
        let transport = Self::default();
        *transport.recent.lock().unwrap() = Some(result);
        Arc::new(transport)
    }

    pub fn with_tail(channels: TailChannels) -> Arc<Self> {
        let transport = Self::default();
        *transport.tail.lock().unwrap() = Some(channels);
        Arc::new(transport)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch_recent(&self, target_id: &str, auth_header: &str) -> Result<Vec<LogRecord>> {
        self.recent_calls
            .lock()
            .unwrap()
            .push((target_id.to_string(), auth_header.to_string()));
        self.recent
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(SilError::Transport("no recent logs scripted".to_string())))
    }

    fn open_tail(&self, target_id: &str, auth_header: &str) -> TailChannels {
        self.tail_calls
            .lock()
            .unwrap()
            .push((target_id.to_string(), auth_header.to_string()));
        self.tail.lock().unwrap().take().unwrap_or_else(|| {
            let (_senders, channels) = TailChannels::pair();
            channels
        })
    }
}

/// Output sink that can be inspected after being moved into a task
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(|l| l.to_string()).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn record(name: &str, kind: MessageKind, timestamp_nanos: i64) -> LogRecord {
    LogRecord::new(
        timestamp_nanos,
        format!("MESSAGE-{}", name),
        format!("ST-{}", name),
        format!("SI-{}", name),
        kind,
    )
}
