//! Locator parsing and content-handle routing tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thumbgrab::{
    ContentResolver, ThumbgrabError, ThumbnailExtractor, ThumbnailRequest, VideoLocator,
};

#[test]
fn absolute_path_parses_as_local() {
    let locator = VideoLocator::parse("/videos/clip.mp4");
    assert_eq!(
        locator,
        VideoLocator::LocalPath(PathBuf::from("/videos/clip.mp4")),
    );
    assert!(locator.is_local());
}

#[test]
fn file_uri_strips_prefix() {
    let locator = VideoLocator::parse("file:///videos/clip.mp4");
    assert_eq!(
        locator,
        VideoLocator::FileUri(PathBuf::from("/videos/clip.mp4")),
    );
    assert_eq!(locator.local_path(), Some(Path::new("/videos/clip.mp4")));
}

#[test]
fn content_handle_keeps_full_string() {
    let locator = VideoLocator::parse("content://media/external/video/17");
    assert_eq!(
        locator,
        VideoLocator::ContentHandle("content://media/external/video/17".to_string()),
    );
    assert!(!locator.is_local());
    assert_eq!(locator.local_path(), None);
}

#[test]
fn anything_else_is_a_remote_url() {
    assert!(matches!(
        VideoLocator::parse("https://example.com/clip.mp4"),
        VideoLocator::RemoteUrl(_),
    ));
    assert!(matches!(
        VideoLocator::parse("rtsp://camera.local/stream"),
        VideoLocator::RemoteUrl(_),
    ));
    // Relative path-looking strings have no recognised prefix either.
    assert!(matches!(
        VideoLocator::parse("clip.mp4"),
        VideoLocator::RemoteUrl(_),
    ));
}

#[test]
fn content_handle_without_resolver_fails() {
    let extractor = ThumbnailExtractor::new();
    let request = ThumbnailRequest::new("content://media/external/video/17");

    let error = extractor.data(&request).unwrap_err();
    assert!(
        matches!(error, ThumbgrabError::ContentResolution { .. }),
        "Expected ContentResolution error, got: {error}",
    );
    assert!(
        error.to_string().contains("no content resolver"),
        "Error should mention the missing resolver: {error}",
    );
}

/// Records whether resolution was consulted, then fails.
struct TrackingResolver {
    invoked: AtomicBool,
}

impl ContentResolver for TrackingResolver {
    fn resolve(&self, handle: &str) -> Result<PathBuf, ThumbgrabError> {
        self.invoked.store(true, Ordering::SeqCst);
        Err(ThumbgrabError::ContentResolution {
            handle: handle.to_string(),
            reason: "handle is not known to this host".to_string(),
        })
    }
}

#[test]
fn content_handle_routes_through_resolver_not_filesystem() {
    let resolver = Arc::new(TrackingResolver {
        invoked: AtomicBool::new(false),
    });
    let extractor = ThumbnailExtractor::new().with_content_resolver(resolver.clone());

    let request = ThumbnailRequest::new("content://media/external/video/17");
    let error = extractor.data(&request).unwrap_err();

    assert!(
        resolver.invoked.load(Ordering::SeqCst),
        "Content resolution must be consulted for content:// locators",
    );
    assert!(matches!(error, ThumbgrabError::ContentResolution { .. }));
}
