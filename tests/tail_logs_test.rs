// Integration tests for live tailing through the log client

mod common;

use common::{record, FakeTransport, SharedBuffer};
use silogs::client::LogClient;
use silogs::error::SilError;
use silogs::logs::{ChronologicalSorter, DisplayZone, MessageKind};
use silogs::stream;
use silogs::transport::TailChannels;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

const SERVICE_GUID: &str = "870cdf18-7e15-435a-8459-6c38a8452d79";
const AUTH_TOKEN: &str = "some-token";
const TS: i64 = 1_497_254_998_000_000_000;

fn client(transport: Arc<FakeTransport>) -> LogClient {
    LogClient::with_parts(
        "wss://service-instance-logs",
        Box::new(transport),
        Box::new(ChronologicalSorter),
        DisplayZone::utc(),
    )
}

fn abnormal_closure() -> SilError {
    SilError::Transport("websocket: close 1006 (abnormal closure): unexpected EOF".to_string())
}

#[tokio::test]
async fn test_records_written_in_arrival_order_then_clean_close() {
    let (senders, channels) = TailChannels::pair();
    let transport = FakeTransport::with_tail(channels);
    let output = SharedBuffer::default();

    tokio::spawn(async move {
        // Move all of `senders` in, not just the field used below
        let senders = senders;
        let batch = [
            ("1", MessageKind::Out),
            ("2", MessageKind::Err),
            ("3", MessageKind::Out),
        ];
        for (name, kind) in batch {
            senders.messages.send(record(name, kind, TS)).await.unwrap();
        }
        // Dropping the senders closes both channels
    });

    let result = client(transport.clone())
        .tailing_logs(SERVICE_GUID, AUTH_TOKEN, output.clone())
        .await;

    assert!(result.is_ok());
    assert_eq!(
        output.lines(),
        vec![
            "2017-06-12T08:09:58.00+0000 [ST-1/SI-1] OUT MESSAGE-1",
            "2017-06-12T08:09:58.00+0000 [ST-2/SI-2] ERR MESSAGE-2",
            "2017-06-12T08:09:58.00+0000 [ST-3/SI-3] OUT MESSAGE-3",
        ]
    );
    assert_eq!(
        transport.tail_calls.lock().unwrap().as_slice(),
        &[(SERVICE_GUID.to_string(), format!("bearer {}", AUTH_TOKEN))]
    );
}

#[tokio::test]
async fn test_abnormal_closure_suppressed_and_real_error_returned() {
    let (senders, channels) = TailChannels::pair();
    let transport = FakeTransport::with_tail(channels);

    tokio::spawn(async move {
        senders.errors.send(abnormal_closure()).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        senders
            .errors
            .send(SilError::Transport("no dice".to_string()))
            .await
            .unwrap();
        // Keep the channels open a while so the error is what ends the tail
        sleep(Duration::from_millis(200)).await;
    });

    let result = client(transport)
        .tailing_logs(SERVICE_GUID, AUTH_TOKEN, SharedBuffer::default())
        .await;

    match result {
        Err(SilError::Transport(msg)) => assert_eq!(msg, "no dice"),
        other => panic!("Expected the real transport error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_only_abnormal_closures_then_close_is_clean() {
    let (senders, channels) = TailChannels::pair();
    let transport = FakeTransport::with_tail(channels);
    let output = SharedBuffer::default();

    tokio::spawn(async move {
        senders.messages.send(record("A", MessageKind::Out, TS)).await.unwrap();
        senders.errors.send(abnormal_closure()).await.unwrap();
        senders.errors.send(abnormal_closure()).await.unwrap();
    });

    let result = client(transport)
        .tailing_logs(SERVICE_GUID, AUTH_TOKEN, output.clone())
        .await;

    assert!(result.is_ok());
    assert_eq!(output.lines().len(), 1);
}

#[tokio::test]
async fn test_clean_close_flushes_every_record() {
    let (senders, channels) = TailChannels::pair();
    let transport = FakeTransport::with_tail(channels);
    let output = SharedBuffer::default();

    tokio::spawn(async move {
        // Move all of `senders` in, not just the field used below
        let senders = senders;
        for i in 0..250 {
            senders
                .messages
                .send(record(&i.to_string(), MessageKind::Out, TS + i))
                .await
                .unwrap();
        }
    });

    let result = client(transport)
        .tailing_logs(SERVICE_GUID, AUTH_TOKEN, output.clone())
        .await;

    assert!(result.is_ok());
    let lines = output.lines();
    assert_eq!(lines.len(), 250);
    assert!(lines[0].ends_with("MESSAGE-0"));
    assert!(lines[249].ends_with("MESSAGE-249"));
}

#[tokio::test]
async fn test_waits_for_messages_after_error_channel_closes() {
    let (senders, channels) = TailChannels::pair();
    let transport = FakeTransport::with_tail(channels);
    let output = SharedBuffer::default();

    tokio::spawn(async move {
        let silogs::transport::TailSenders { messages, errors } = senders;
        drop(errors);
        sleep(Duration::from_millis(50)).await;
        messages.send(record("late", MessageKind::Out, TS)).await.unwrap();
    });

    let result = client(transport)
        .tailing_logs(SERVICE_GUID, AUTH_TOKEN, output.clone())
        .await;

    assert!(result.is_ok());
    assert_eq!(output.lines().len(), 1);
    assert!(output.contents().contains("MESSAGE-late"));
}

#[tokio::test]
async fn test_terminal_error_returns_without_waiting_for_messages() {
    // The message channel never closes here. Returning at all shows the
    // forwarder is not joined on the error path; lines still in flight at that
    // moment are not guaranteed to be written.
    let (senders, channels) = TailChannels::pair();
    let transport = FakeTransport::with_tail(channels);
    let output = SharedBuffer::default();

    senders
        .errors
        .send(SilError::Transport("that's torn it".to_string()))
        .await
        .unwrap();

    let result = timeout(
        Duration::from_secs(2),
        client(transport).tailing_logs(SERVICE_GUID, AUTH_TOKEN, output.clone()),
    )
    .await
    .expect("tail should return on a terminal error");

    assert!(matches!(result, Err(SilError::Transport(_))));

    // The detached forwarder still writes whatever arrives afterwards
    senders
        .messages
        .send(record("after", MessageKind::Out, TS))
        .await
        .unwrap();
    drop(senders);
    sleep(Duration::from_millis(100)).await;
    assert!(output.contents().contains("MESSAGE-after"));
}

#[tokio::test]
async fn test_tail_directly_on_channels() {
    let (senders, channels) = TailChannels::pair();
    let output = SharedBuffer::default();

    senders.messages.send(record("X", MessageKind::Err, TS)).await.unwrap();
    drop(senders);

    stream::tail(channels, DisplayZone::utc(), output.clone())
        .await
        .unwrap();

    assert_eq!(
        output.contents(),
        "2017-06-12T08:09:58.00+0000 [ST-X/SI-X] ERR MESSAGE-X\n"
    );
}
