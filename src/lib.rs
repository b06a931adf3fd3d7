// SPDX-License-Identifier: MIT
//! # Resource Packer
//!
//! Bundles a directory of files into one immutable binary container keyed
//! by sanitized identifiers, with fast, thread-safe, random-access reads
//! and transparent decompression.
//!
//! ## Format Overview
//!
//! The container is a flat single-writer, read-many file. There is no
//! central directory to parse at read time beyond a compact index; content
//! offsets are derived from entry order, not stored.
//!
//! ```text
//! Resource Package Format v1
//! ==========================
//!
//! Header:
//! - Version: 1 (1 byte)
//! - Entry count (4 bytes, little-endian i32)
//!
//! Index (count entries, ascending ordinal key order):
//! - Key: ULEB128 length prefix + UTF-8 bytes
//! - Original length (4 bytes, little-endian i32)
//! - Stored length (4 bytes, little-endian i32)
//! - Compressed flag (1 byte)
//!
//! Content (same order as the index):
//! - Each entry's stored bytes, concatenated, no padding
//! ```
//!
//! ## Key Features
//!
//! - **Derived Offsets**: entry *i* starts where entry *i-1* ends, so the
//!   index stays minimal and the whole file is reproducible byte-for-byte
//! - **Tiered Compression**: per-file gzip decision based on size,
//!   extension, and a bounded compression sample for large files
//! - **Concurrent Reads**: every read uses its own file handle, so threads
//!   never contend on shared I/O state
//! - **Streaming Access**: bounded seekable views for raw entries,
//!   forward-only decompressing streams for compressed ones
//!
//! ## Usage
//!
//! ```no_run
//! use resource_packer::{PackageReader, PackageWriter};
//!
//! // Pack a directory into a container
//! let writer = PackageWriter::new("assets")?;
//! writer.pack("assets.dat")?;
//!
//! // Read entries back by key
//! let reader = PackageReader::open("assets.dat")?;
//! let greeting = reader.read_string("greeting")?;
//! let raw = reader.read_bytes("logo")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Keys are derived from file names with the extension suffix stripped and
//! invalid identifier characters replaced (`greeting.txt` → `greeting`,
//! `test.res.json` → `test`); [`resource_key`] exposes the exact mapping
//! for code generators that emit typed accessors.

pub mod compression_strategy;
pub mod format;
pub mod index;
pub mod key;
pub mod reader;
pub mod writer;

// Re-export main types
pub use compression_strategy::{
    CompressionOutcome, CompressionPolicy, FULL_COMPRESSION_THRESHOLD, MIN_COMPRESSION_RATIO,
    MIN_COMPRESSION_SIZE, SAMPLE_SIZE,
};
pub use format::{FORMAT_VERSION, HEADER_SIZE};
pub use index::{PackageIndex, ResourceEntry};
pub use key::{resource_key, sanitize_identifier, KeyError};
pub use reader::{BoundedStream, PackageReader, ReadError, ResourceStream};
pub use writer::{PackageWriter, WriteError};
