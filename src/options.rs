//! Request options for thumbnail extraction.
//!
//! [`ThumbnailRequest`] is a builder that carries everything one extraction
//! needs: the source locator string, optional HTTP headers for remote
//! sources, target bounds, the target timestamp, and the output format and
//! quality. A request is constructed per call and consumed entirely within
//! one extraction; nothing persists between calls.

use std::collections::HashMap;

use crate::locator::VideoLocator;

/// Output image format for encoded thumbnails.
///
/// On the channel surface formats travel as integer indices; any index
/// outside the known range falls back to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailFormat {
    /// JPEG, lossy. Honors the requested quality. This is the default.
    #[default]
    Jpeg,
    /// PNG, lossless. Quality is accepted but ignored by the encoder.
    Png,
    /// WebP, lossless. Quality is accepted but ignored by the encoder.
    Webp,
}

impl ThumbnailFormat {
    /// Map a wire index to a format. Unrecognized indices fall back to JPEG.
    pub fn from_index(index: i64) -> Self {
        match index {
            1 => ThumbnailFormat::Png,
            2 => ThumbnailFormat::Webp,
            _ => ThumbnailFormat::Jpeg,
        }
    }

    /// The wire index for this format.
    pub fn index(self) -> i64 {
        match self {
            ThumbnailFormat::Jpeg => 0,
            ThumbnailFormat::Png => 1,
            ThumbnailFormat::Webp => 2,
        }
    }

    /// The file extension used for thumbnails in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "jpg",
            ThumbnailFormat::Png => "png",
            ThumbnailFormat::Webp => "webp",
        }
    }
}

/// A single thumbnail extraction request.
///
/// Defaults: no headers, JPEG at quality 90, no target bounds (native
/// resolution), unspecified timestamp, no explicit output path.
///
/// # Example
///
/// ```
/// use thumbgrab::{ThumbnailFormat, ThumbnailRequest};
///
/// let request = ThumbnailRequest::new("/videos/clip.mp4")
///     .with_format(ThumbnailFormat::Png)
///     .with_max_width(320)
///     .with_time_ms(1_500);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ThumbnailRequest {
    /// The source locator string (path, `file://` URI, `content://` handle,
    /// or remote URL).
    pub video: String,
    /// HTTP headers sent with remote fetches. Ignored for local sources.
    pub headers: HashMap<String, String>,
    /// Output format.
    pub format: ThumbnailFormat,
    /// Target max width in pixels. `0` means unspecified.
    pub max_width: u32,
    /// Target max height in pixels. `0` means unspecified.
    pub max_height: u32,
    /// Target timestamp in milliseconds. `-1` means unspecified, which the
    /// retriever maps to the nearest available keyframe.
    pub time_ms: i64,
    /// Encoding quality, 0–100. Only meaningful for lossy formats.
    pub quality: u8,
    /// Explicit output path or directory for file-mode extraction.
    pub output_path: Option<String>,
}

impl ThumbnailRequest {
    /// Create a request for the given source with default options.
    pub fn new(video: impl Into<String>) -> Self {
        Self {
            video: video.into(),
            headers: HashMap::new(),
            format: ThumbnailFormat::default(),
            max_width: 0,
            max_height: 0,
            time_ms: -1,
            quality: 90,
            output_path: None,
        }
    }

    /// Set the HTTP headers sent with remote fetches.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: ThumbnailFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the target max width. `0` means unspecified.
    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = width;
        self
    }

    /// Set the target max height. `0` means unspecified.
    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    /// Set the target timestamp in milliseconds. `-1` means unspecified.
    pub fn with_time_ms(mut self, time_ms: i64) -> Self {
        self.time_ms = time_ms;
        self
    }

    /// Set the encoding quality (0–100). Values above 100 are clamped.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(100);
        self
    }

    /// Set an explicit output path or directory for file-mode extraction.
    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Parse the source string into its locator variant.
    pub fn locator(&self) -> VideoLocator {
        VideoLocator::parse(&self.video)
    }

    /// Whether both target dimensions are set, i.e. the scaled-fit branch.
    pub(crate) fn has_exact_bounds(&self) -> bool {
        self.max_width != 0 && self.max_height != 0
    }

    /// Whether any target dimension is set.
    pub(crate) fn has_bounds(&self) -> bool {
        self.max_width != 0 || self.max_height != 0
    }
}

/// Resolve the output dimensions for a decoded frame.
///
/// - Both targets zero: the native size is kept.
/// - Exactly one target set: the other dimension is derived from the native
///   aspect ratio using truncating `f32` division.
/// - Both targets set: they are used verbatim (scaled-fit — the source aspect
///   ratio is ignored).
pub fn scaled_dimensions(
    native_width: u32,
    native_height: u32,
    target_width: u32,
    target_height: u32,
) -> (u32, u32) {
    if target_width == 0 && target_height == 0 {
        return (native_width, native_height);
    }

    let width = if target_width != 0 {
        target_width
    } else {
        ((target_height as f32 / native_height as f32) * native_width as f32) as u32
    };
    let height = if target_height != 0 {
        target_height
    } else {
        ((target_width as f32 / native_width as f32) * native_height as f32) as u32
    };

    (width, height)
}
