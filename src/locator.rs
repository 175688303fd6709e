//! Video source locators.
//!
//! A locator is an opaque string naming a video across local, content-managed,
//! and network origins. Parsing happens exactly once, at request-validation
//! time, and yields a closed [`VideoLocator`] variant; each variant maps to
//! its own resource-acquisition path in the retriever, so no prefix matching
//! leaks into the decode code.

use std::path::{Path, PathBuf};

use crate::error::ThumbgrabError;

/// A parsed video source locator.
///
/// Every input string maps to exactly one variant — parsing is total. The
/// variant decides how the retriever acquires the underlying media:
///
/// | Variant | Acquisition |
/// |---|---|
/// | `LocalPath` | open the file directly |
/// | `FileUri` | strip the `file://` prefix, open the remainder |
/// | `ContentHandle` | resolve through a [`ContentResolver`] |
/// | `RemoteUrl` | hand the URL (plus headers) to the demuxer |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoLocator {
    /// An absolute local filesystem path (`/...`).
    LocalPath(PathBuf),
    /// A `file://` URI; the payload is the path with the prefix stripped.
    FileUri(PathBuf),
    /// An opaque `content://` handle owned by the host's content service.
    ///
    /// The raw handle string is **never** used as a filesystem path; access
    /// always routes through a registered [`ContentResolver`].
    ContentHandle(String),
    /// Anything else — treated as a remote URL for the demuxer to fetch.
    RemoteUrl(String),
}

impl VideoLocator {
    /// Parse a locator string.
    ///
    /// # Example
    ///
    /// ```
    /// use thumbgrab::VideoLocator;
    ///
    /// assert!(matches!(VideoLocator::parse("/tmp/a.mp4"), VideoLocator::LocalPath(_)));
    /// assert!(matches!(VideoLocator::parse("file:///tmp/a.mp4"), VideoLocator::FileUri(_)));
    /// assert!(matches!(VideoLocator::parse("content://media/17"), VideoLocator::ContentHandle(_)));
    /// assert!(matches!(VideoLocator::parse("https://example.com/a.mp4"), VideoLocator::RemoteUrl(_)));
    /// ```
    pub fn parse(source: &str) -> Self {
        if source.starts_with('/') {
            VideoLocator::LocalPath(PathBuf::from(source))
        } else if let Some(stripped) = source.strip_prefix("file://") {
            VideoLocator::FileUri(PathBuf::from(stripped))
        } else if source.starts_with("content://") {
            VideoLocator::ContentHandle(source.to_string())
        } else {
            VideoLocator::RemoteUrl(source.to_string())
        }
    }

    /// The local filesystem path, for the variants that have one.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            VideoLocator::LocalPath(path) | VideoLocator::FileUri(path) => Some(path),
            _ => None,
        }
    }

    /// Whether this locator names a local file (directly or via `file://`).
    pub fn is_local(&self) -> bool {
        self.local_path().is_some()
    }
}

/// Resolves opaque `content://` handles to readable filesystem paths.
///
/// The host environment owns content handles; the crate cannot interpret
/// them. Register an implementation via
/// [`ThumbnailExtractor::with_content_resolver`](crate::ThumbnailExtractor::with_content_resolver)
/// to enable `content://` locators. Implementations must be [`Send`] and
/// [`Sync`] because resolution happens on worker threads.
pub trait ContentResolver: Send + Sync {
    /// Map a handle (including its `content://` prefix) to a readable path.
    ///
    /// The returned path is opened for the duration of one extraction and
    /// closed when the retriever is released.
    fn resolve(&self, handle: &str) -> Result<PathBuf, ThumbgrabError>;
}
