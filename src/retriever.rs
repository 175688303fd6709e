//! Frame retrieval.
//!
//! [`FrameRetriever`] binds to one video source — a local file, a resolved
//! content handle, or a remote URL — seeks to a target timestamp, and returns
//! a single decoded frame as an [`image::DynamicImage`]. The demuxer and
//! decoder contexts live only as long as the retriever value, so every path
//! out of an extraction (success or failure) releases the underlying parser
//! state.
//!
//! Retrieval follows the "closest" family of seek semantics: the container is
//! seeked to the nearest preceding keyframe, then either the first decodable
//! sync frame is returned ([`SeekPolicy::ClosestSync`]) or decoding continues
//! forward to the frame nearest the target ([`SeekPolicy::Closest`]).

use std::collections::HashMap;
use std::path::Path;

use ffmpeg_next::{
    Dictionary, Rational,
    codec::context::Context as CodecContext,
    format::{self, Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::error::ThumbgrabError;

/// How a target timestamp maps to a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPolicy {
    /// Decode forward from the preceding keyframe to the frame whose
    /// presentation time is nearest the target. Accurate but may decode many
    /// intermediate frames.
    Closest,
    /// Return the first decodable sync frame at or before the target.
    /// Cheaper and more reliable, since it always lands on a reference
    /// frame.
    ClosestSync,
}

/// A frame retriever bound to a single video source.
///
/// Acquired at the start of one extraction and dropped at the end; dropping
/// releases the demuxer unconditionally, including on error paths.
pub struct FrameRetriever {
    input: Input,
    stream_index: usize,
    time_base: Rational,
    source_name: String,
}

impl FrameRetriever {
    /// Bind to a local file.
    pub fn bind_path(path: &Path) -> Result<Self, ThumbgrabError> {
        let source_name = path.display().to_string();
        log::debug!("Binding retriever to file: {source_name}");

        ffmpeg_next::init().map_err(|error| ThumbgrabError::SourceOpen {
            source_name: source_name.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = format::input(&path).map_err(|error| ThumbgrabError::SourceOpen {
            source_name: source_name.clone(),
            reason: error.to_string(),
        })?;

        Self::from_input(input, source_name)
    }

    /// Bind to a remote URL, passing `headers` with the fetch.
    ///
    /// Headers are handed to the demuxer as a CRLF-joined `Key: Value` block,
    /// which FFmpeg's HTTP protocol applies to every request it makes for
    /// this source.
    pub fn bind_url(
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Self, ThumbgrabError> {
        log::debug!("Binding retriever to URL: {url} ({} headers)", headers.len());

        ffmpeg_next::init().map_err(|error| ThumbgrabError::SourceOpen {
            source_name: url.to_string(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let open_result = if headers.is_empty() {
            format::input(&url)
        } else {
            let header_block: String = headers
                .iter()
                .map(|(key, value)| format!("{key}: {value}\r\n"))
                .collect();
            let mut options = Dictionary::new();
            options.set("headers", &header_block);
            format::input_with_dictionary(&url, options)
        };

        let input = open_result.map_err(|error| ThumbgrabError::SourceOpen {
            source_name: url.to_string(),
            reason: error.to_string(),
        })?;

        Self::from_input(input, url.to_string())
    }

    fn from_input(input: Input, source_name: String) -> Result<Self, ThumbgrabError> {
        let (stream_index, time_base) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or(ThumbgrabError::NoVideoStream)?;
            (stream.index(), stream.time_base())
        };

        Ok(Self {
            input,
            stream_index,
            time_base,
            source_name,
        })
    }

    /// The locator string this retriever is bound to.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Decode an unscaled frame at `time_ms` milliseconds.
    ///
    /// A negative target is the "unspecified timestamp" sentinel and maps to
    /// the nearest available keyframe — the first sync frame of the stream.
    /// This is part of the retriever's contract, not a caller-side special
    /// case.
    ///
    /// Returns `Ok(None)` when the stream produced no frame at all; callers
    /// retry once with [`SeekPolicy::ClosestSync`] before giving up.
    pub fn frame_at(
        &mut self,
        time_ms: i64,
        policy: SeekPolicy,
    ) -> Result<Option<DynamicImage>, ThumbgrabError> {
        self.decode_one(time_ms, policy, None)
    }

    /// Decode a frame at `time_ms` milliseconds, scaled to exactly
    /// `(width, height)` inside the decoder's scaler (bilinear).
    ///
    /// This is the pre-scaled extraction path used when the host capability
    /// for scaled extraction is enabled and both target bounds are known.
    pub fn scaled_frame_at(
        &mut self,
        time_ms: i64,
        policy: SeekPolicy,
        width: u32,
        height: u32,
    ) -> Result<Option<DynamicImage>, ThumbgrabError> {
        self.decode_one(time_ms, policy, Some((width, height)))
    }

    /// One-call thumbnail fast path for a local file.
    ///
    /// Grabs the first sync frame and scales it to exactly
    /// `(width, height)`, with no manual timestamp handling. Used for local
    /// sources with no explicit timestamp when the host advertises the
    /// direct-thumbnail capability.
    pub fn direct_thumbnail(
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<Option<DynamicImage>, ThumbgrabError> {
        let mut retriever = Self::bind_path(path)?;
        retriever.scaled_frame_at(-1, SeekPolicy::ClosestSync, width, height)
    }

    fn decode_one(
        &mut self,
        time_ms: i64,
        policy: SeekPolicy,
        bounds: Option<(u32, u32)>,
    ) -> Result<Option<DynamicImage>, ThumbgrabError> {
        let target_us = time_ms.saturating_mul(1_000);
        let time_base = self.time_base;

        // Fresh decoder from the stream parameters for this retrieval.
        let parameters = {
            let stream = self
                .input
                .stream(self.stream_index)
                .ok_or(ThumbgrabError::NoVideoStream)?;
            stream.parameters()
        };
        let decoder_context = CodecContext::from_parameters(parameters)?;
        let mut decoder = decoder_context.decoder().video()?;

        let (dst_width, dst_height) = bounds.unwrap_or((decoder.width(), decoder.height()));
        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            dst_width,
            dst_height,
            ScalingFlags::BILINEAR,
        )?;

        // Container-level seek lands on the keyframe at or before the
        // target. Negative targets (the unspecified sentinel) seek to the
        // stream start instead.
        let seek_target = target_us.max(0);
        self.input.seek(seek_target, ..seek_target)?;

        // Sync policy and unspecified timestamps both take the first frame
        // the decoder produces after the seek, which is the sync frame.
        let want_first = matches!(policy, SeekPolicy::ClosestSync) || target_us < 0;

        let mut decoded = VideoFrame::empty();
        let mut previous: Option<VideoFrame> = None;

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            decoder.send_packet(&packet)?;

            while decoder.receive_frame(&mut decoded).is_ok() {
                if want_first {
                    return Ok(Some(run_scaler(&mut scaler, &decoded, dst_width, dst_height)?));
                }

                let pts_us = pts_to_microseconds(decoded.pts().unwrap_or(0), time_base);
                if pts_us >= target_us {
                    let chosen = nearer_frame(&previous, &decoded, target_us, time_base);
                    return Ok(Some(run_scaler(&mut scaler, chosen, dst_width, dst_height)?));
                }
                previous = Some(decoded.clone());
            }
        }

        // Drain the decoder; the target may sit in the final frames.
        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            if want_first {
                return Ok(Some(run_scaler(&mut scaler, &decoded, dst_width, dst_height)?));
            }

            let pts_us = pts_to_microseconds(decoded.pts().unwrap_or(0), time_base);
            if pts_us >= target_us {
                let chosen = nearer_frame(&previous, &decoded, target_us, time_base);
                return Ok(Some(run_scaler(&mut scaler, chosen, dst_width, dst_height)?));
            }
            previous = Some(decoded.clone());
        }

        // Target beyond the end of the stream: the last decoded frame is the
        // closest one.
        match previous {
            Some(frame) => Ok(Some(run_scaler(&mut scaler, &frame, dst_width, dst_height)?)),
            None => Ok(None),
        }
    }
}

/// Pick whichever of `previous` / `current` sits nearer the target.
///
/// `current` is the first frame at or past the target, so `previous` (when
/// present) is the last frame before it; ties go to the earlier frame.
fn nearer_frame<'f>(
    previous: &'f Option<VideoFrame>,
    current: &'f VideoFrame,
    target_us: i64,
    time_base: Rational,
) -> &'f VideoFrame {
    match previous {
        Some(prev) => {
            let prev_us = pts_to_microseconds(prev.pts().unwrap_or(0), time_base);
            let curr_us = pts_to_microseconds(current.pts().unwrap_or(0), time_base);
            if target_us - prev_us <= curr_us - target_us {
                prev
            } else {
                current
            }
        }
        None => current,
    }
}

fn run_scaler(
    scaler: &mut ScalingContext,
    frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ThumbgrabError> {
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgb_frame)?;
    frame_to_image(&rgb_frame, width, height)
}

/// Copy an RGB24 frame into a tightly-packed [`RgbImage`].
///
/// FFmpeg may pad each row; rows are re-packed when the stride exceeds the
/// pixel width.
fn frame_to_image(
    frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ThumbgrabError> {
    let stride = frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = frame.data(0);

    let buffer = if stride == row_bytes {
        data[..row_bytes * height as usize].to_vec()
    } else {
        let mut packed = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            packed.extend_from_slice(&data[start..start + row_bytes]);
        }
        packed
    };

    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        ThumbgrabError::Ffmpeg("decoded frame buffer has unexpected size".to_string())
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}

fn pts_to_microseconds(pts: i64, time_base: Rational) -> i64 {
    (pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64 * 1_000_000.0)
        as i64
}

/// FFmpeg internal log verbosity.
///
/// FFmpeg prints warnings to stderr on its own, separately from the Rust
/// [`log`] crate. This trimmed level set is enough to silence or tune that
/// output without importing `ffmpeg-next` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderLogLevel {
    /// Print nothing at all.
    Quiet,
    /// Recoverable errors only.
    Error,
    /// Warnings and errors (FFmpeg's default).
    Warning,
    /// Informational messages and above.
    Info,
    /// Debugging output.
    Debug,
}

/// Set FFmpeg's internal log verbosity.
///
/// Controls FFmpeg's own stderr output only; Rust-side diagnostics go
/// through the `log` crate as usual.
pub fn set_decoder_log_level(level: DecoderLogLevel) {
    use ffmpeg_next::util::log::Level;

    let ffmpeg_level = match level {
        DecoderLogLevel::Quiet => Level::Quiet,
        DecoderLogLevel::Error => Level::Error,
        DecoderLogLevel::Warning => Level::Warning,
        DecoderLogLevel::Info => Level::Info,
        DecoderLogLevel::Debug => Level::Debug,
    };
    ffmpeg_next::util::log::set_level(ffmpeg_level);
}
