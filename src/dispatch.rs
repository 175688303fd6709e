//! Job dispatch and result delivery.
//!
//! Extraction work is CPU-heavy and must not block the host's control
//! thread. [`Dispatcher`] submits each job to Tokio's blocking pool — an
//! unbounded, cached worker pool that grows on demand and reuses idle
//! threads — and funnels every outcome through one unbounded mpsc channel
//! consumed by a single delivery task. Work runs in parallel; completions
//! are delivered strictly one at a time.
//!
//! There is no cancellation and no timeout: a submitted job runs to
//! completion or failure. Job errors are converted at this boundary into
//! `result#error` deliveries carrying the error's source chain; they never
//! take down the pool.

use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::error::ThumbgrabError;

/// Delivery method name for batch results.
pub const METHOD_RESULT_FILES: &str = "result#files";
/// Delivery method name for single-file results.
pub const METHOD_RESULT_FILE: &str = "result#file";
/// Delivery method name for in-memory byte results.
pub const METHOD_RESULT_DATA: &str = "result#data";
/// Delivery method name for failures.
pub const METHOD_RESULT_ERROR: &str = "result#error";

/// The host transport boundary.
///
/// Implementations receive every asynchronous completion, serialized on a
/// single delivery task, as `(method, call_id, payload)` — the `call_id` is
/// the caller-supplied correlation key echoed back verbatim.
///
/// Must be [`Send`] and [`Sync`]; delivery happens off the caller's thread.
pub trait ResponseSink: Send + Sync + 'static {
    /// Deliver one completion to the host.
    fn deliver(&self, method: &str, call_id: i64, payload: Value);
}

struct Delivery {
    method: &'static str,
    call_id: i64,
    payload: Value,
}

/// Explicit task queue: submit closures, receive serialized completions.
///
/// Owns a Tokio runtime whose blocking pool provides the workers, plus the
/// single delivery task draining the completion channel into the
/// [`ResponseSink`].
pub struct Dispatcher {
    runtime: Runtime,
    sender: UnboundedSender<Delivery>,
}

impl Dispatcher {
    /// Create a dispatcher delivering completions to `sink`.
    pub fn new(sink: Arc<dyn ResponseSink>) -> Result<Self, ThumbgrabError> {
        let runtime = Builder::new_multi_thread()
            .thread_name("thumbgrab-worker")
            .build()?;

        let (sender, mut receiver) = mpsc::unbounded_channel::<Delivery>();

        // Single consumer: completions reach the sink one at a time, in the
        // order jobs finished, regardless of how many ran concurrently.
        runtime.spawn(async move {
            while let Some(delivery) = receiver.recv().await {
                sink.deliver(delivery.method, delivery.call_id, delivery.payload);
            }
        });

        Ok(Self { runtime, sender })
    }

    /// Submit one job.
    ///
    /// On success the job's payload is delivered under `success_method`; on
    /// failure a [`METHOD_RESULT_ERROR`] delivery carries the formatted
    /// error chain. Both are keyed by `call_id`.
    pub fn submit<F>(&self, call_id: i64, success_method: &'static str, job: F)
    where
        F: FnOnce() -> Result<Value, ThumbgrabError> + Send + 'static,
    {
        let sender = self.sender.clone();
        self.runtime.spawn_blocking(move || {
            let delivery = match job() {
                Ok(payload) => Delivery {
                    method: success_method,
                    call_id,
                    payload,
                },
                Err(error) => {
                    log::debug!("Job {call_id} failed: {error}");
                    Delivery {
                        method: METHOD_RESULT_ERROR,
                        call_id,
                        payload: Value::String(error_chain(&error)),
                    }
                }
            };
            // The receiver only disappears during shutdown.
            let _ = sender.send(delivery);
        });
    }

    /// Shut the dispatcher down without waiting for queued jobs.
    ///
    /// Jobs already running on a worker finish; queued-but-unstarted jobs
    /// are discarded. Dropping the dispatcher instead waits for running
    /// jobs before returning.
    pub fn shutdown(self) {
        drop(self.sender);
        self.runtime.shutdown_background();
    }
}

/// Render an error and its full source chain as a diagnostic string.
///
/// This is what the host sees in a `result#error` payload: the outermost
/// message first, each underlying cause on its own line.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str("\n  caused by: ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
