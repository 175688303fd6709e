//! # thumbgrab
//!
//! Video thumbnail extraction — decode a single frame from a video, scale
//! it, and encode it to JPEG, PNG, or WebP.
//!
//! `thumbgrab` accepts a video locator (local path, `file://` URI, opaque
//! `content://` handle, or remote URL), picks a decode strategy from the
//! locator and the host's capabilities, and produces an encoded still image
//! in memory or on disk. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; encoding by
//! the [`image`](https://crates.io/crates/image) crate.
//!
//! ## Quick Start
//!
//! ### Thumbnail bytes in memory
//!
//! ```no_run
//! use thumbgrab::{ThumbnailExtractor, ThumbnailFormat, ThumbnailRequest};
//!
//! let extractor = ThumbnailExtractor::new();
//! let request = ThumbnailRequest::new("/videos/clip.mp4")
//!     .with_format(ThumbnailFormat::Jpeg)
//!     .with_max_width(320)
//!     .with_time_ms(2_000);
//! let bytes = extractor.data(&request)?;
//! # Ok::<(), thumbgrab::ThumbgrabError>(())
//! ```
//!
//! ### Thumbnail written to disk
//!
//! ```no_run
//! use thumbgrab::{ThumbnailExtractor, ThumbnailRequest};
//!
//! let extractor = ThumbnailExtractor::new();
//! let request = ThumbnailRequest::new("/videos/clip.mp4").with_max_height(240);
//! let written = extractor.file(&request)?;
//! println!("thumbnail at {}", written.display());
//! # Ok::<(), thumbgrab::ThumbgrabError>(())
//! ```
//!
//! ### Hosting the message-channel plugin
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use serde_json::{Value, json};
//! use thumbgrab::{ResponseSink, ThumbnailPlugin};
//!
//! struct ChannelSink;
//! impl ResponseSink for ChannelSink {
//!     fn deliver(&self, method: &str, call_id: i64, payload: Value) {
//!         // forward to the host transport
//!     }
//! }
//!
//! let plugin = ThumbnailPlugin::new(Arc::new(ChannelSink))?;
//! plugin.handle("data", &json!({
//!     "callId": 7,
//!     "video": "https://example.com/clip.mp4",
//!     "headers": {"Authorization": "Bearer ..."},
//!     "format": 0,
//!     "maxw": 320,
//!     "maxh": 180,
//!     "timeMs": 1_000,
//!     "quality": 80,
//! }))?;
//! # Ok::<(), thumbgrab::ThumbgrabError>(())
//! ```
//!
//! ## Behavior highlights
//!
//! - **Dimension policy** — no bounds: native resolution; one bound: the
//!   other dimension derived from the source aspect ratio; both bounds:
//!   scaled-fit to exactly that size.
//! - **Seek fallback** — every retrieval tries the accurate "closest"
//!   policy first and retries once with the sync-frame policy before
//!   reporting a decode failure.
//! - **Destination rules** — file-mode output lands next to local sources
//!   or in a cache directory for remote ones, with the extension swapped to
//!   match the encoded format; explicit paths are honored verbatim when
//!   they already carry that extension.
//! - **Concurrency** — the plugin runs every extraction on a cached worker
//!   pool and serializes result delivery through a single channel, keyed by
//!   the caller's `callId`.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod capabilities;
pub mod dispatch;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod options;
pub mod plugin;
pub mod retriever;

pub use capabilities::Capabilities;
pub use dispatch::{
    Dispatcher, METHOD_RESULT_DATA, METHOD_RESULT_ERROR, METHOD_RESULT_FILE, METHOD_RESULT_FILES,
    ResponseSink, error_chain,
};
pub use error::ThumbgrabError;
pub use extractor::{ThumbnailExtractor, encode_image, resolve_destination};
pub use locator::{ContentResolver, VideoLocator};
pub use options::{ThumbnailFormat, ThumbnailRequest, scaled_dimensions};
pub use plugin::ThumbnailPlugin;
pub use retriever::{
    DecoderLogLevel, FrameRetriever, SeekPolicy, set_decoder_log_level,
};
