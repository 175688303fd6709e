//! Host capability flags.
//!
//! Decode-strategy selection depends on what the hosting environment can do,
//! not on inline version checks scattered through the decode path. The host
//! supplies a [`Capabilities`] value once at startup; the extractor consults
//! it when choosing between the direct-thumbnail fast path, in-decoder
//! scaling, and the unscaled-decode-then-resize fallback.

/// What the hosting environment supports.
///
/// Both flags default to enabled. Hosts embedding the crate on top of a
/// restricted decoder can switch individual strategies off and the extractor
/// falls back to the slower universal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The decoder can scale during extraction, producing a frame already at
    /// the target bounds. When off, frames are decoded at native resolution
    /// and resized afterwards.
    pub scaled_extraction: bool,
    /// A one-call "thumbnail from file" fast path is available for local
    /// sources with no explicit timestamp.
    pub direct_thumbnail: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            scaled_extraction: true,
            direct_thumbnail: true,
        }
    }
}

impl Capabilities {
    /// Capabilities with every optional strategy disabled.
    ///
    /// Useful for exercising the universal fallback path in tests.
    pub fn minimal() -> Self {
        Self {
            scaled_extraction: false,
            direct_thumbnail: false,
        }
    }
}
