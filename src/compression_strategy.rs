// SPDX-License-Identifier: MIT
//! Tiered compression policy for packed resources
//!
//! Decides per file whether compressing its bytes is worth it. Small files
//! and known pre-compressed formats are stored raw; medium files are
//! compressed whole and kept only when the ratio clears the threshold;
//! large files are probed with a bounded sample before paying for a full
//! compression pass.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::trace;

/// Files below this size are never compressed
pub const MIN_COMPRESSION_SIZE: usize = 255;

/// Files below this size are compressed whole; larger files are sampled first
pub const FULL_COMPRESSION_THRESHOLD: usize = 4 * 1024;

/// Sample length used to probe large files
pub const SAMPLE_SIZE: usize = 8 * 1024;

/// Minimum fractional size reduction required to keep compression
pub const MIN_COMPRESSION_RATIO: f64 = 0.05;

/// Extensions of formats that are already compressed (matched without the
/// dot, ASCII case-insensitive)
const COMPRESSED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "ico", // Images
    "zip", "gz", "7z", "rar", "tar", "bz2", // Archives
    "mp3", "mp4", "avi", "mkv", "flv", "mov", // Media
    "pdf", // Documents
    "woff", "woff2", "ttf", "otf", // Fonts
];

/// Outcome of a compression decision
#[derive(Debug)]
pub struct CompressionOutcome {
    /// Whether the stored bytes are compressed
    pub compressed: bool,

    /// Bytes to store in the container (compressed or the original content)
    pub stored: Vec<u8>,
}

/// Size- and format-aware compression selector.
///
/// The policy is fixed; the struct exists so the writer carries one value
/// with the decision logic attached rather than loose functions.
#[derive(Debug, Default)]
pub struct CompressionPolicy;

impl CompressionPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether to compress `content` and produce the bytes to store.
    ///
    /// `extension` is the originating file's extension without the dot, if
    /// it has one.
    pub fn try_compress(
        &self,
        extension: Option<&str>,
        content: &[u8],
    ) -> io::Result<CompressionOutcome> {
        // Tiny files: header overhead dominates, never worth it
        if content.len() < MIN_COMPRESSION_SIZE {
            return Ok(CompressionOutcome {
                compressed: false,
                stored: content.to_vec(),
            });
        }

        if extension.is_some_and(is_compressed_extension) {
            trace!(
                extension = extension.unwrap_or_default(),
                "skipping pre-compressed format"
            );
            return Ok(CompressionOutcome {
                compressed: false,
                stored: content.to_vec(),
            });
        }

        if content.len() < FULL_COMPRESSION_THRESHOLD {
            // Medium files: compress whole, keep only if the ratio clears
            let candidate = gzip_compress(content)?;
            if meets_ratio(content.len(), candidate.len()) {
                return Ok(CompressionOutcome {
                    compressed: true,
                    stored: candidate,
                });
            }
            return Ok(CompressionOutcome {
                compressed: false,
                stored: content.to_vec(),
            });
        }

        // Large files: probe a bounded sample before committing to a full
        // pass. The sample's compressed output is only a measurement and is
        // always discarded.
        let sample_len = SAMPLE_SIZE.min(content.len());
        let sample_compressed = gzip_compress(&content[..sample_len])?;
        if meets_ratio(sample_len, sample_compressed.len()) {
            let stored = gzip_compress(content)?;
            return Ok(CompressionOutcome {
                compressed: true,
                stored,
            });
        }

        Ok(CompressionOutcome {
            compressed: false,
            stored: content.to_vec(),
        })
    }
}

/// Whether `1 - stored/original` clears the minimum ratio
fn meets_ratio(original_len: usize, stored_len: usize) -> bool {
    if original_len == 0 {
        return false;
    }
    let ratio = 1.0 - (stored_len as f64 / original_len as f64);
    ratio >= MIN_COMPRESSION_RATIO
}

fn is_compressed_extension(extension: &str) -> bool {
    COMPRESSED_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(extension))
}

/// Compress bytes with gzip.
///
/// The level is fixed so repeated packs of identical input stay
/// byte-identical. The reader must decode with [`gzip_decompress`].
pub(crate) fn gzip_compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let estimated = (data.len() / 2).max(64);
    let mut encoder = GzEncoder::new(Vec::with_capacity(estimated), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompress gzip bytes produced by [`gzip_compress`]
pub(crate) fn gzip_decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut output = Vec::with_capacity(data.len().saturating_mul(3));
    decoder.read_to_end(&mut output)?;
    Ok(output)
}
