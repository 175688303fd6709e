//! End-to-end extraction tests.
//!
//! Tests require the fixture from `tests/fixtures/generate_fixtures.sh`
//! (a 320×240 test pattern, 2 seconds at 25 fps) and are skipped when it is
//! absent.

use std::path::Path;

use thumbgrab::{
    Capabilities, ThumbnailExtractor, ThumbnailFormat, ThumbnailRequest,
};

fn fixture() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

const FIXTURE_WIDTH: u32 = 320;
const FIXTURE_HEIGHT: u32 = 240;

#[test]
fn no_bounds_keeps_native_resolution() {
    if !Path::new(fixture()).exists() {
        return;
    }

    let extractor = ThumbnailExtractor::new();
    let request = ThumbnailRequest::new(fixture()).with_format(ThumbnailFormat::Png);
    let bytes = extractor.data(&request).expect("extraction failed");

    let image = image::load_from_memory(&bytes).expect("decode failed");
    assert_eq!(
        (image.width(), image.height()),
        (FIXTURE_WIDTH, FIXTURE_HEIGHT),
    );
}

#[test]
fn height_only_derives_width() {
    if !Path::new(fixture()).exists() {
        return;
    }

    let extractor = ThumbnailExtractor::new();
    let request = ThumbnailRequest::new(fixture())
        .with_format(ThumbnailFormat::Png)
        .with_max_height(120);
    let bytes = extractor.data(&request).expect("extraction failed");

    let image = image::load_from_memory(&bytes).expect("decode failed");
    // 120 * 320 / 240 = 160.
    assert_eq!((image.width(), image.height()), (160, 120));
}

#[test]
fn both_bounds_scale_to_fit_exactly() {
    if !Path::new(fixture()).exists() {
        return;
    }

    let extractor = ThumbnailExtractor::new();
    let request = ThumbnailRequest::new(fixture())
        .with_format(ThumbnailFormat::Png)
        .with_max_width(100)
        .with_max_height(50);
    let bytes = extractor.data(&request).expect("extraction failed");

    let image = image::load_from_memory(&bytes).expect("decode failed");
    assert_eq!(
        (image.width(), image.height()),
        (100, 50),
        "Scaled-fit must ignore the source aspect ratio",
    );
}

#[test]
fn minimal_capabilities_reach_the_same_dimensions() {
    if !Path::new(fixture()).exists() {
        return;
    }

    // All optional strategies off: unscaled decode plus bitmap resize.
    let extractor = ThumbnailExtractor::new().with_capabilities(Capabilities::minimal());
    let request = ThumbnailRequest::new(fixture())
        .with_format(ThumbnailFormat::Png)
        .with_max_width(100)
        .with_max_height(50);
    let bytes = extractor.data(&request).expect("extraction failed");

    let image = image::load_from_memory(&bytes).expect("decode failed");
    assert_eq!((image.width(), image.height()), (100, 50));
}

#[test]
fn explicit_timestamp_decodes_a_frame() {
    if !Path::new(fixture()).exists() {
        return;
    }

    let extractor = ThumbnailExtractor::new();
    let request = ThumbnailRequest::new(fixture()).with_time_ms(1_000);
    let bytes = extractor.data(&request).expect("extraction failed");
    assert!(!bytes.is_empty());
}

#[test]
fn timestamp_beyond_duration_returns_the_closest_frame() {
    if !Path::new(fixture()).exists() {
        return;
    }

    // The fixture is 2 seconds long; a 60-second target lands on the last
    // decodable frame rather than failing.
    let extractor = ThumbnailExtractor::new();
    let request = ThumbnailRequest::new(fixture()).with_time_ms(60_000);
    let bytes = extractor.data(&request).expect("extraction failed");
    assert!(!bytes.is_empty());
}

#[test]
fn file_mode_writes_into_a_directory() {
    if !Path::new(fixture()).exists() {
        return;
    }

    let out_dir = tempfile::tempdir().expect("tempdir failed");
    let extractor = ThumbnailExtractor::new();
    let request = ThumbnailRequest::new(fixture())
        .with_output_path(format!("{}/", out_dir.path().display()));

    let written = extractor.file(&request).expect("extraction failed");
    assert!(written.exists(), "Thumbnail file must exist");
    assert_eq!(
        written.extension().and_then(|ext| ext.to_str()),
        Some("jpg"),
    );
    assert!(written.starts_with(out_dir.path()));
}

#[test]
fn file_mode_honors_an_exact_output_path() {
    if !Path::new(fixture()).exists() {
        return;
    }

    let out_dir = tempfile::tempdir().expect("tempdir failed");
    let target = out_dir.path().join("thumb.jpg");
    let extractor = ThumbnailExtractor::new();
    let request = ThumbnailRequest::new(fixture())
        .with_output_path(target.to_string_lossy().into_owned());

    let written = extractor.file(&request).expect("extraction failed");
    assert_eq!(written, target);
    assert!(target.exists());
}

#[test]
fn batch_skips_the_missing_source() {
    if !Path::new(fixture()).exists() {
        return;
    }

    let out_dir = tempfile::tempdir().expect("tempdir failed");
    let out = format!("{}/", out_dir.path().display());
    let extractor = ThumbnailExtractor::new();

    let requests = vec![
        ThumbnailRequest::new(fixture()).with_output_path(out.clone()),
        ThumbnailRequest::new("/no/such/video.mp4").with_output_path(out),
    ];

    let written = extractor.files(&requests).expect("batch failed");
    assert_eq!(written.len(), 1, "Only the existing source yields a result");
    assert!(written[0].exists());
}

#[test]
fn concurrent_extractions_do_not_interfere() {
    if !Path::new(fixture()).exists() {
        return;
    }

    let extractor = ThumbnailExtractor::new();
    let handles: Vec<_> = [(100u32, 50u32), (64, 64)]
        .into_iter()
        .map(|(width, height)| {
            let extractor = extractor.clone();
            std::thread::spawn(move || {
                let request = ThumbnailRequest::new(fixture())
                    .with_format(ThumbnailFormat::Png)
                    .with_max_width(width)
                    .with_max_height(height);
                let bytes = extractor.data(&request).expect("extraction failed");
                let image = image::load_from_memory(&bytes).expect("decode failed");
                assert_eq!((image.width(), image.height()), (width, height));
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }
}
