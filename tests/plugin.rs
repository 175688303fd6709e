//! Message-channel plugin tests.
//!
//! These run without media fixtures: they exercise marshalling, the
//! synchronous acknowledgement, call-id correlation, and the asynchronous
//! error path using sources that do not exist.

use std::sync::Mutex;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use thumbgrab::{ResponseSink, ThumbgrabError, ThumbnailPlugin};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Forwards every delivery into an mpsc channel the test can drain.
struct RecordingSink {
    sender: Mutex<Sender<(String, i64, Value)>>,
}

impl ResponseSink for RecordingSink {
    fn deliver(&self, method: &str, call_id: i64, payload: Value) {
        let sender = self.sender.lock().expect("sink lock poisoned");
        let _ = sender.send((method.to_string(), call_id, payload));
    }
}

fn plugin_with_sink() -> (ThumbnailPlugin, Receiver<(String, i64, Value)>) {
    let (sender, receiver) = channel();
    let sink = Arc::new(RecordingSink {
        sender: Mutex::new(sender),
    });
    let plugin = ThumbnailPlugin::new(sink).expect("failed to build plugin");
    (plugin, receiver)
}

fn scalar_args(call_id: i64) -> Value {
    json!({
        "callId": call_id,
        "headers": {},
        "format": 0,
        "maxw": 0,
        "maxh": 0,
        "timeMs": -1,
        "quality": 90,
    })
}

fn merged(base: Value, extra: Value) -> Value {
    let mut map = base.as_object().cloned().expect("base must be an object");
    for (key, value) in extra.as_object().expect("extra must be an object") {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}

// ── Acknowledgement and error delivery ───────────────────────────

#[test]
fn file_call_acknowledges_true_then_delivers_error() {
    let (plugin, receiver) = plugin_with_sink();
    let args = merged(scalar_args(42), json!({"video": "/no/such/video.mp4"}));

    let ack = plugin.handle("file", &args).expect("handle failed");
    assert_eq!(ack, json!(true), "Async operations must ack with true");

    let (method, call_id, payload) = receiver
        .recv_timeout(DELIVERY_TIMEOUT)
        .expect("No delivery arrived");
    assert_eq!(method, "result#error");
    assert_eq!(call_id, 42);
    let message = payload.as_str().expect("error payload must be a string");
    assert!(
        message.contains("not found"),
        "Error message should mention the missing source: {message}",
    );
}

#[test]
fn data_call_on_missing_source_delivers_error() {
    let (plugin, receiver) = plugin_with_sink();
    let args = merged(scalar_args(7), json!({"video": "/no/such/video.mp4"}));

    let ack = plugin.handle("data", &args).expect("handle failed");
    assert_eq!(ack, json!(true));

    let (method, call_id, _) = receiver
        .recv_timeout(DELIVERY_TIMEOUT)
        .expect("No delivery arrived");
    assert_eq!(method, "result#error");
    assert_eq!(call_id, 7);
}

// ── Batch semantics ──────────────────────────────────────────────

#[test]
fn batch_of_missing_sources_delivers_empty_list() {
    let (plugin, receiver) = plugin_with_sink();
    let args = merged(
        scalar_args(3),
        json!({"videos": ["/no/such/a.mp4", "/no/such/b.mp4"]}),
    );

    let ack = plugin.handle("files", &args).expect("handle failed");
    assert_eq!(ack, json!(true));

    let (method, call_id, payload) = receiver
        .recv_timeout(DELIVERY_TIMEOUT)
        .expect("No delivery arrived");
    assert_eq!(method, "result#files");
    assert_eq!(call_id, 3);
    assert_eq!(
        payload,
        json!([]),
        "Missing sources are dropped, not errors",
    );
}

#[test]
fn non_list_videos_value_is_an_empty_batch() {
    let (plugin, receiver) = plugin_with_sink();
    let args = merged(scalar_args(4), json!({"videos": 99}));

    plugin.handle("files", &args).expect("handle failed");

    let (method, _, payload) = receiver
        .recv_timeout(DELIVERY_TIMEOUT)
        .expect("No delivery arrived");
    assert_eq!(method, "result#files");
    assert_eq!(payload, json!([]));
}

// ── Synchronous surface ──────────────────────────────────────────

#[test]
fn version_answers_synchronously() {
    let (plugin, receiver) = plugin_with_sink();
    let version = plugin
        .handle("version", &json!({}))
        .expect("version failed");
    assert_eq!(version, json!(env!("CARGO_PKG_VERSION")));

    // Nothing goes through the async channel for version.
    assert!(receiver.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn unknown_method_is_not_implemented() {
    let (plugin, _receiver) = plugin_with_sink();
    let error = plugin.handle("transcode", &json!({})).unwrap_err();
    assert!(
        matches!(error, ThumbgrabError::NotImplemented(_)),
        "Expected NotImplemented, got: {error}",
    );
}

#[test]
fn missing_call_id_fails_synchronously() {
    let (plugin, _receiver) = plugin_with_sink();
    let error = plugin
        .handle("file", &json!({"video": "/a.mp4"}))
        .unwrap_err();
    assert!(matches!(error, ThumbgrabError::MalformedCall { .. }));
    assert!(error.to_string().contains("callId"), "{error}");
}

#[test]
fn missing_scalar_argument_fails_synchronously() {
    let (plugin, _receiver) = plugin_with_sink();
    let mut args = scalar_args(9)
        .as_object()
        .cloned()
        .expect("args must be an object");
    args.remove("format");
    args.insert("video".to_string(), json!("/a.mp4"));

    let error = plugin.handle("file", &Value::Object(args)).unwrap_err();
    assert!(matches!(error, ThumbgrabError::MalformedCall { .. }));
    assert!(error.to_string().contains("format"), "{error}");
}

// ── Correlation across concurrent calls ──────────────────────────

#[test]
fn concurrent_calls_correlate_by_call_id() {
    let (plugin, receiver) = plugin_with_sink();

    for call_id in [101, 202] {
        let args = merged(
            scalar_args(call_id),
            json!({"video": format!("/no/such/{call_id}.mp4")}),
        );
        plugin.handle("data", &args).expect("handle failed");
    }

    let mut seen: Vec<i64> = Vec::new();
    for _ in 0..2 {
        let (method, call_id, _) = receiver
            .recv_timeout(DELIVERY_TIMEOUT)
            .expect("Missing delivery");
        assert_eq!(method, "result#error");
        seen.push(call_id);
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![101, 202], "Each call gets its own delivery");
}
