//! Thumbnail extraction policy.
//!
//! [`ThumbnailExtractor`] turns a [`ThumbnailRequest`] into encoded image
//! bytes or a written file. It owns the decision table over locator variants
//! and host capabilities, the closest → closest-sync retry, the dimension
//! policy, and output destination resolution. Decoding itself is delegated to
//! [`FrameRetriever`]; encoding to the `image` crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{
    DynamicImage,
    codecs::{jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder},
    imageops::FilterType,
};

use crate::capabilities::Capabilities;
use crate::error::ThumbgrabError;
use crate::locator::{ContentResolver, VideoLocator};
use crate::options::{ThumbnailFormat, ThumbnailRequest, scaled_dimensions};
use crate::retriever::{FrameRetriever, SeekPolicy};

/// Extracts video thumbnails according to a per-request policy.
///
/// The extractor is stateless across requests: every call binds a fresh
/// retriever, consumes one request, and produces one result or one error.
/// It is `Send + Sync` and can be shared across worker threads.
///
/// # Example
///
/// ```no_run
/// use thumbgrab::{ThumbnailExtractor, ThumbnailRequest};
///
/// let extractor = ThumbnailExtractor::new();
/// let request = ThumbnailRequest::new("/videos/clip.mp4").with_max_width(320);
/// let bytes = extractor.data(&request)?;
/// # Ok::<(), thumbgrab::ThumbgrabError>(())
/// ```
#[derive(Clone)]
pub struct ThumbnailExtractor {
    capabilities: Capabilities,
    content_resolver: Option<Arc<dyn ContentResolver>>,
    cache_dir: PathBuf,
}

impl Default for ThumbnailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailExtractor {
    /// Create an extractor with default capabilities and a cache directory
    /// under the system temp dir.
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::default(),
            content_resolver: None,
            cache_dir: std::env::temp_dir().join("thumbgrab"),
        }
    }

    /// Override the host capability flags.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Register a resolver for `content://` locators.
    #[must_use]
    pub fn with_content_resolver(mut self, resolver: Arc<dyn ContentResolver>) -> Self {
        self.content_resolver = Some(resolver);
        self
    }

    /// Override the cache directory used for remote sources with no explicit
    /// output path. Created on demand.
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Extract a thumbnail and return the encoded image bytes.
    ///
    /// # Errors
    ///
    /// [`ThumbgrabError::SourceNotFound`] for a missing local source,
    /// [`ThumbgrabError::NoFrameDecoded`] when no frame survives the retry,
    /// [`ThumbgrabError::ContentResolution`] for unresolvable handles, and
    /// decode/encode errors.
    pub fn data(&self, request: &ThumbnailRequest) -> Result<Vec<u8>, ThumbgrabError> {
        let image = self.decode_thumbnail(request)?;
        encode_image(&image, request.format, request.quality)
    }

    /// Extract a thumbnail and write it to its resolved destination.
    ///
    /// The destination is derived from the request (see
    /// [`resolve_destination`]); an existing file there is overwritten.
    /// Returns the path actually written.
    pub fn file(&self, request: &ThumbnailRequest) -> Result<PathBuf, ThumbgrabError> {
        let bytes = self.data(request)?;

        let is_local = request.locator().is_local();
        if request.output_path.is_none() && !is_local {
            fs::create_dir_all(&self.cache_dir)?;
        }

        let destination = resolve_destination(
            &request.video,
            request.output_path.as_deref(),
            request.format,
            &self.cache_dir,
        );

        fs::write(&destination, &bytes)?;
        log::debug!(
            "Thumbnail written ({} bytes) to {}",
            bytes.len(),
            destination.display()
        );
        Ok(destination)
    }

    /// Extract thumbnails for a batch of requests.
    ///
    /// Each request is processed independently. Missing local sources and
    /// per-item I/O failures drop the item from the result sequence without
    /// aborting the batch; a decode failure propagates as the batch's
    /// failure.
    pub fn files(
        &self,
        requests: &[ThumbnailRequest],
    ) -> Result<Vec<PathBuf>, ThumbgrabError> {
        let mut results = Vec::new();

        for request in requests {
            if let Some(path) = request.locator().local_path() {
                if !path.exists() {
                    log::debug!("Skipping missing source: {}", path.display());
                    continue;
                }
            }

            match self.file(request) {
                Ok(path) => results.push(path),
                Err(error) if error.is_io_kind() => {
                    log::debug!("Dropping {} from batch: {error}", request.video);
                }
                Err(error) => return Err(error),
            }
        }

        Ok(results)
    }

    /// Decode one frame per the request's policy, scaled to its final
    /// dimensions but not yet encoded.
    fn decode_thumbnail(
        &self,
        request: &ThumbnailRequest,
    ) -> Result<DynamicImage, ThumbgrabError> {
        let locator = request.locator();

        // Fast path: local file, no explicit timestamp, one decoder call.
        // Only taken with concrete bounds; zero bounds fall through to the
        // retriever path, which knows the dimension rules.
        if self.capabilities.direct_thumbnail
            && request.time_ms < 0
            && request.has_exact_bounds()
        {
            if let VideoLocator::LocalPath(path) = &locator {
                ensure_exists(path)?;
                log::debug!("Direct thumbnail fast path: {}", path.display());
                return FrameRetriever::direct_thumbnail(
                    path,
                    request.max_width,
                    request.max_height,
                )?
                .ok_or_else(|| ThumbgrabError::NoFrameDecoded {
                    source_name: request.video.clone(),
                });
            }
        }

        let mut retriever = self.bind(&locator, request)?;

        let frame = if request.has_exact_bounds() && self.capabilities.scaled_extraction {
            with_sync_fallback(|policy| {
                retriever.scaled_frame_at(
                    request.time_ms,
                    policy,
                    request.max_width,
                    request.max_height,
                )
            })?
        } else {
            let decoded = with_sync_fallback(|policy| retriever.frame_at(request.time_ms, policy))?;
            match decoded {
                Some(image) if request.has_bounds() => {
                    let (width, height) = scaled_dimensions(
                        image.width(),
                        image.height(),
                        request.max_width,
                        request.max_height,
                    );
                    Some(image.resize_exact(width, height, FilterType::Triangle))
                }
                other => other,
            }
        };

        frame.ok_or_else(|| ThumbgrabError::NoFrameDecoded {
            source_name: request.video.clone(),
        })
    }

    /// Bind a retriever per the locator variant — the resource-acquisition
    /// half of the decision table.
    fn bind(
        &self,
        locator: &VideoLocator,
        request: &ThumbnailRequest,
    ) -> Result<FrameRetriever, ThumbgrabError> {
        match locator {
            VideoLocator::LocalPath(path) | VideoLocator::FileUri(path) => {
                ensure_exists(path)?;
                FrameRetriever::bind_path(path)
            }
            VideoLocator::ContentHandle(handle) => {
                let resolver = self.content_resolver.as_ref().ok_or_else(|| {
                    ThumbgrabError::ContentResolution {
                        handle: handle.clone(),
                        reason: "no content resolver registered".to_string(),
                    }
                })?;
                let resolved = resolver.resolve(handle)?;
                FrameRetriever::bind_path(&resolved)
            }
            VideoLocator::RemoteUrl(url) => FrameRetriever::bind_url(url, &request.headers),
        }
    }
}

/// Attempt a retrieval with [`SeekPolicy::Closest`], retrying once with
/// [`SeekPolicy::ClosestSync`] on an empty result. Failure after both
/// attempts is left to the caller; nothing retries further.
fn with_sync_fallback<F>(mut attempt: F) -> Result<Option<DynamicImage>, ThumbgrabError>
where
    F: FnMut(SeekPolicy) -> Result<Option<DynamicImage>, ThumbgrabError>,
{
    match attempt(SeekPolicy::Closest)? {
        Some(image) => Ok(Some(image)),
        None => attempt(SeekPolicy::ClosestSync),
    }
}

fn ensure_exists(path: &Path) -> Result<(), ThumbgrabError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ThumbgrabError::SourceNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Encode a decoded frame to the requested format.
///
/// Quality applies to JPEG; the PNG and WebP encoders here are lossless and
/// accept the argument without using it, so the call shape stays uniform
/// across formats.
pub fn encode_image(
    image: &DynamicImage,
    format: ThumbnailFormat,
    quality: u8,
) -> Result<Vec<u8>, ThumbgrabError> {
    let mut bytes = Vec::new();

    match format {
        ThumbnailFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
            image.write_with_encoder(encoder)?;
        }
        ThumbnailFormat::Png => {
            let encoder = PngEncoder::new(&mut bytes);
            image.write_with_encoder(encoder)?;
        }
        ThumbnailFormat::Webp => {
            let encoder = WebPEncoder::new_lossless(&mut bytes);
            image.write_with_encoder(encoder)?;
        }
    }

    Ok(bytes)
}

/// Resolve where a file-mode thumbnail lands.
///
/// The default name is the source locator with its extension swapped for the
/// format's. With no explicit path, local sources default alongside the
/// source file and remote sources into `cache_dir`. An explicit path already
/// ending in the computed extension is used verbatim; any other explicit
/// path is treated as a directory prefix and the swapped filename is
/// appended.
pub fn resolve_destination(
    video: &str,
    explicit: Option<&str>,
    format: ThumbnailFormat,
    cache_dir: &Path,
) -> PathBuf {
    let extension = format.extension();
    let source = video.strip_prefix("file://").unwrap_or(video);
    let swapped = match source.rfind('.') {
        Some(index) => format!("{}{extension}", &source[..=index]),
        None => format!("{source}.{extension}"),
    };

    let is_local = video.starts_with('/') || video.starts_with("file://");
    let save_path = match explicit {
        Some(path) => Some(path.to_string()),
        None if !is_local => Some(cache_dir.to_string_lossy().into_owned()),
        None => None,
    };

    match save_path {
        None => PathBuf::from(swapped),
        Some(path) if path.ends_with(&format!(".{extension}")) => PathBuf::from(path),
        Some(path) => {
            let filename = match swapped.rfind('/') {
                Some(index) => &swapped[index + 1..],
                None => swapped.as_str(),
            };
            if path.ends_with('/') || path.ends_with(std::path::MAIN_SEPARATOR) {
                PathBuf::from(format!("{path}{filename}"))
            } else {
                PathBuf::from(format!("{path}{}{filename}", std::path::MAIN_SEPARATOR))
            }
        }
    }
}
