//! Message-channel plugin surface.
//!
//! [`ThumbnailPlugin`] is the host-facing entry point: it receives method
//! calls as `(name, JSON argument map)` pairs, acknowledges each
//! asynchronous operation synchronously with `true`, and delivers the real
//! result later through the [`ResponseSink`], keyed by the caller-supplied
//! `callId`.
//!
//! Three asynchronous operations are exposed — `files`, `file`, and `data` —
//! plus a synchronous `version` query. Argument marshalling is tolerant
//! where the wire contract is tolerant (a non-list `videos` value becomes an
//! empty batch, non-string header entries are dropped) and strict where it
//! is not (missing scalar arguments fail the call synchronously).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::dispatch::{
    Dispatcher, METHOD_RESULT_DATA, METHOD_RESULT_FILE, METHOD_RESULT_FILES, ResponseSink,
};
use crate::error::ThumbgrabError;
use crate::extractor::ThumbnailExtractor;
use crate::options::{ThumbnailFormat, ThumbnailRequest};

/// The thumbnail plugin: channel marshalling over a shared extractor.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use serde_json::{Value, json};
/// use thumbgrab::{ResponseSink, ThumbnailPlugin};
///
/// struct PrintSink;
/// impl ResponseSink for PrintSink {
///     fn deliver(&self, method: &str, call_id: i64, payload: Value) {
///         println!("{method}({call_id}): {payload}");
///     }
/// }
///
/// let plugin = ThumbnailPlugin::new(Arc::new(PrintSink))?;
/// let ack = plugin.handle(
///     "file",
///     &json!({
///         "callId": 1,
///         "video": "/videos/clip.mp4",
///         "headers": {},
///         "format": 0,
///         "maxw": 320,
///         "maxh": 0,
///         "timeMs": -1,
///         "quality": 90,
///     }),
/// )?;
/// assert_eq!(ack, json!(true));
/// # Ok::<(), thumbgrab::ThumbgrabError>(())
/// ```
pub struct ThumbnailPlugin {
    extractor: Arc<ThumbnailExtractor>,
    dispatcher: Dispatcher,
}

impl ThumbnailPlugin {
    /// Create a plugin with a default extractor.
    pub fn new(sink: Arc<dyn ResponseSink>) -> Result<Self, ThumbgrabError> {
        Self::with_extractor(ThumbnailExtractor::new(), sink)
    }

    /// Create a plugin around a pre-configured extractor (capabilities,
    /// content resolver, cache directory).
    pub fn with_extractor(
        extractor: ThumbnailExtractor,
        sink: Arc<dyn ResponseSink>,
    ) -> Result<Self, ThumbgrabError> {
        let dispatcher = Dispatcher::new(sink)?;
        log::info!(
            "Thumbnail plugin attached (thumbgrab {})",
            env!("CARGO_PKG_VERSION"),
        );
        Ok(Self {
            extractor: Arc::new(extractor),
            dispatcher,
        })
    }

    /// Handle one method call from the host.
    ///
    /// For the asynchronous operations the returned value is the immediate
    /// acknowledgement (`true`); the real result arrives later on the sink.
    /// `version` answers synchronously. Unknown methods and malformed
    /// argument maps fail synchronously.
    pub fn handle(&self, method: &str, args: &Value) -> Result<Value, ThumbgrabError> {
        match method {
            "files" => {
                let call_id = require_i64(method, args, "callId")?;
                self.submit_files(call_id, args)?;
                Ok(json!(true))
            }
            "file" => {
                let call_id = require_i64(method, args, "callId")?;
                self.submit_file(call_id, args)?;
                Ok(json!(true))
            }
            "data" => {
                let call_id = require_i64(method, args, "callId")?;
                self.submit_data(call_id, args)?;
                Ok(json!(true))
            }
            "version" => Ok(json!(env!("CARGO_PKG_VERSION"))),
            other => Err(ThumbgrabError::NotImplemented(other.to_string())),
        }
    }

    /// Shut down the worker pool without waiting for queued jobs.
    ///
    /// The host calls this when detaching the plugin from its channel.
    pub fn shutdown(self) {
        log::debug!("Thumbnail plugin detaching");
        self.dispatcher.shutdown();
    }

    fn submit_files(&self, call_id: i64, args: &Value) -> Result<(), ThumbgrabError> {
        let template = parse_request("files", String::new(), args)?;
        let requests: Vec<ThumbnailRequest> = parse_videos(args)
            .into_iter()
            .map(|video| ThumbnailRequest {
                video,
                ..template.clone()
            })
            .collect();

        let extractor = Arc::clone(&self.extractor);
        self.dispatcher.submit(call_id, METHOD_RESULT_FILES, move || {
            let paths = extractor.files(&requests)?;
            let rendered: Vec<String> = paths
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect();
            Ok(json!(rendered))
        });
        Ok(())
    }

    fn submit_file(&self, call_id: i64, args: &Value) -> Result<(), ThumbgrabError> {
        let video = require_string("file", args, "video")?;
        let request = parse_request("file", video, args)?;

        let extractor = Arc::clone(&self.extractor);
        self.dispatcher.submit(call_id, METHOD_RESULT_FILE, move || {
            let path = extractor.file(&request)?;
            Ok(json!(path.to_string_lossy()))
        });
        Ok(())
    }

    fn submit_data(&self, call_id: i64, args: &Value) -> Result<(), ThumbgrabError> {
        let video = require_string("data", args, "video")?;
        let request = parse_request("data", video, args)?;

        let extractor = Arc::clone(&self.extractor);
        self.dispatcher.submit(call_id, METHOD_RESULT_DATA, move || {
            let bytes = extractor.data(&request)?;
            Ok(json!(bytes))
        });
        Ok(())
    }
}

/// Build a request from the common scalar arguments of a call.
///
/// `video` is supplied by the caller because the batch operation fills it
/// per item from the `videos` list.
fn parse_request(
    method: &str,
    video: String,
    args: &Value,
) -> Result<ThumbnailRequest, ThumbgrabError> {
    let format = ThumbnailFormat::from_index(require_i64(method, args, "format")?);
    let max_width = require_i64(method, args, "maxw")?.max(0) as u32;
    let max_height = require_i64(method, args, "maxh")?.max(0) as u32;
    let time_ms = require_i64(method, args, "timeMs")?;
    let quality = require_i64(method, args, "quality")?.clamp(0, 100) as u8;
    let output_path = args
        .get("path")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ThumbnailRequest {
        video,
        headers: parse_headers(args),
        format,
        max_width,
        max_height,
        time_ms,
        quality,
        output_path,
    })
}

/// The `videos` list; anything that is not a list yields an empty batch,
/// and non-string entries are dropped.
fn parse_videos(args: &Value) -> Vec<String> {
    match args.get("videos") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// The `headers` map; absent or non-object values yield no headers, and
/// entries with non-string values are dropped.
fn parse_headers(args: &Value) -> HashMap<String, String> {
    match args.get("headers") {
        Some(Value::Object(entries)) => entries
            .iter()
            .filter_map(|(key, value)| {
                value.as_str().map(|v| (key.clone(), v.to_string()))
            })
            .collect(),
        _ => HashMap::new(),
    }
}

fn require_i64(method: &str, args: &Value, key: &str) -> Result<i64, ThumbgrabError> {
    args.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| ThumbgrabError::MalformedCall {
            method: method.to_string(),
            reason: format!("missing or non-integer argument `{key}`"),
        })
}

fn require_string(method: &str, args: &Value, key: &str) -> Result<String, ThumbgrabError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ThumbgrabError::MalformedCall {
            method: method.to_string(),
            reason: format!("missing or non-string argument `{key}`"),
        })
}
