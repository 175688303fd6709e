//! Error types for the `thumbgrab` crate.
//!
//! This module defines [`ThumbgrabError`], the unified error type returned by
//! all fallible operations in the crate. The channel surface renders errors as
//! diagnostic strings, but the library itself exposes a closed kind
//! enumeration so hosts can branch on failure classes instead of parsing
//! message text.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `thumbgrab` operations.
///
/// Every public method that can fail returns `Result<T, ThumbgrabError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ThumbgrabError {
    /// The video source does not exist on the local filesystem.
    ///
    /// In batch extraction this kind is swallowed and the item dropped; in
    /// single-item extraction it is surfaced to the caller.
    #[error("Video source not found: {path}")]
    SourceNotFound {
        /// The local path that was checked.
        path: PathBuf,
    },

    /// The video source could not be opened by the demuxer.
    #[error("Failed to open video source {source_name}: {reason}")]
    SourceOpen {
        /// The locator string as supplied by the caller.
        source_name: String,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source does not contain a video stream.
    #[error("No video stream found in source")]
    NoVideoStream,

    /// No frame could be decoded, even after the sync-frame retry.
    #[error("No frame decoded from {source_name}")]
    NoFrameDecoded {
        /// The locator string as supplied by the caller.
        source_name: String,
    },

    /// A `content://` locator was supplied but no content resolver is
    /// registered, or resolution failed.
    ///
    /// This is the only locator scheme the crate cannot access on its own,
    /// so it doubles as the "unsupported locator" failure class.
    #[error("Cannot resolve content handle {handle}: {reason}")]
    ContentResolution {
        /// The opaque handle, including its `content://` prefix.
        handle: String,
        /// Why resolution was not possible.
        reason: String,
    },

    /// A method call arrived with missing or mistyped arguments.
    #[error("Malformed {method} call: {reason}")]
    MalformedCall {
        /// The channel method name.
        method: String,
        /// Which argument was unusable.
        reason: String,
    },

    /// The channel method name is not part of this plugin's surface.
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading sources or writing thumbnails.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate during encoding or scaling.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),
}

impl From<FfmpegError> for ThumbgrabError {
    fn from(error: FfmpegError) -> Self {
        ThumbgrabError::Ffmpeg(error.to_string())
    }
}

impl ThumbgrabError {
    /// Whether this error is an I/O-class failure for batch purposes.
    ///
    /// Batch extraction drops items that fail this way and keeps going;
    /// every other kind aborts the batch.
    pub fn is_io_kind(&self) -> bool {
        matches!(
            self,
            ThumbgrabError::SourceNotFound { .. } | ThumbgrabError::Io(_)
        )
    }
}
