// SPDX-License-Identifier: MIT
//! Thread-safe package reader
//!
//! Serves concurrent lookups against one container file. Every read
//! operation opens its own file handle positioned at the entry's byte
//! range, so there is no shared mutable state between threads; the index
//! itself is immutable after load.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use flate2::read::GzDecoder;

use crate::compression_strategy::gzip_decompress;
use crate::index::{PackageIndex, ResourceEntry};

/// Errors that can occur during reading
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported package version {found}, expected {expected}")]
    UnsupportedVersion { found: u8, expected: u8 },

    #[error("invalid package format: {0}")]
    InvalidFormat(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("resource with key '{0}' not found")]
    NotFound(String),

    #[error("unexpected end of data while reading resource '{0}'")]
    Truncated(String),

    #[error("failed to decompress resource '{key}': {source}")]
    Decompression { key: String, source: io::Error },

    #[error("resource '{0}' is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("reader has been closed")]
    Closed,
}

/// Reader for packed resource containers.
///
/// All operations are safe to call concurrently from multiple threads
/// against the same instance. The index is loaded exactly once at
/// construction; reads never observe a partially built index.
pub struct PackageReader {
    path: PathBuf,
    index: PackageIndex,
    closed: AtomicBool,
}

impl PackageReader {
    /// Open a container file and load its index.
    ///
    /// Fails with [`ReadError::UnsupportedVersion`] when the version byte
    /// does not match, before any entry is read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReadError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ReadError::InvalidArgument(
                "container path must not be empty".to_string(),
            ));
        }

        let index = PackageIndex::load(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            index,
            closed: AtomicBool::new(false),
        })
    }

    /// Whether the package contains `key`. Never touches the file.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Iterate over every resource key, in unspecified order.
    pub fn resource_keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys()
    }

    /// Number of resources in the package
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Read a resource fully, transparently decompressing when needed.
    pub fn read_bytes(&self, key: &str) -> Result<Vec<u8>, ReadError> {
        self.ensure_open()?;
        let entry = self.lookup(key)?;
        let stored = self.read_stored(key, &entry)?;

        if entry.compressed {
            gzip_decompress(&stored).map_err(|source| ReadError::Decompression {
                key: key.to_string(),
                source,
            })
        } else {
            Ok(stored)
        }
    }

    /// Read a resource as a UTF-8 string.
    pub fn read_string(&self, key: &str) -> Result<String, ReadError> {
        let bytes = self.read_bytes(key)?;
        String::from_utf8(bytes).map_err(|_| ReadError::InvalidUtf8(key.to_string()))
    }

    /// Async calling convention for [`read_bytes`](Self::read_bytes).
    ///
    /// Wraps the same blocking I/O; there is no suspension point beyond the
    /// call itself.
    pub async fn read_bytes_async(&self, key: &str) -> Result<Vec<u8>, ReadError> {
        self.read_bytes(key)
    }

    /// Async calling convention for [`read_string`](Self::read_string).
    pub async fn read_string_async(&self, key: &str) -> Result<String, ReadError> {
        self.read_string(key)
    }

    /// Open a streaming view over a resource without loading it fully.
    ///
    /// Uncompressed entries yield a seekable view bounded to the entry's
    /// byte range. Compressed entries yield a forward-only stream that
    /// decompresses on the fly and cannot seek or report a length.
    pub fn open_stream(&self, key: &str) -> Result<ResourceStream, ReadError> {
        self.ensure_open()?;
        let entry = self.lookup(key)?;

        let bounded = BoundedStream::open(&self.path, entry.offset, u64::from(entry.stored_len))?;
        if entry.compressed {
            Ok(ResourceStream::Compressed(GzDecoder::new(bounded)))
        } else {
            Ok(ResourceStream::Raw(bounded))
        }
    }

    /// Release the reader.
    ///
    /// Every subsequent file-touching operation fails with
    /// [`ReadError::Closed`]; index-only lookups stay available. Idempotent.
    /// In-flight reads that already opened their handle run to completion.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn ensure_open(&self) -> Result<(), ReadError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ReadError::Closed);
        }
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<ResourceEntry, ReadError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| ReadError::NotFound(key.to_string()))
    }

    /// Read the exact stored byte range with a handle private to this call.
    fn read_stored(&self, key: &str, entry: &ResourceEntry) -> Result<Vec<u8>, ReadError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(entry.offset))?;

        let mut buffer = vec![0u8; entry.stored_len as usize];
        file.read_exact(&mut buffer).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                ReadError::Truncated(key.to_string())
            } else {
                ReadError::Io(e)
            }
        })?;

        Ok(buffer)
    }
}

impl std::fmt::Debug for PackageReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageReader")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

/// Streaming view over one resource.
///
/// Implements [`Read`] for both variants. Seeking is only supported for
/// uncompressed entries; a compressed stream is forward-only and rejects
/// every seek.
pub enum ResourceStream {
    /// Seekable view over an uncompressed entry's byte range
    Raw(BoundedStream),

    /// Forward-only decompressing view over a compressed entry
    Compressed(GzDecoder<BoundedStream>),
}

impl ResourceStream {
    /// Stored length of the underlying range, known only for raw entries
    pub fn len(&self) -> Option<u64> {
        match self {
            ResourceStream::Raw(stream) => Some(stream.len()),
            ResourceStream::Compressed(_) => None,
        }
    }

    /// Whether this stream supports seeking
    pub fn is_seekable(&self) -> bool {
        matches!(self, ResourceStream::Raw(_))
    }
}

impl Read for ResourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ResourceStream::Raw(stream) => stream.read(buf),
            ResourceStream::Compressed(stream) => stream.read(buf),
        }
    }
}

impl Seek for ResourceStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            ResourceStream::Raw(stream) => stream.seek(pos),
            ResourceStream::Compressed(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "compressed resource streams are forward-only",
            )),
        }
    }
}

/// Read-only view bounded to a byte range of the container file.
///
/// Owns a private file handle, so instances are independent of each other
/// and of the reader that created them. Seeks are confined to
/// `[0, len]`; reads past the end of the range return 0.
pub struct BoundedStream {
    file: File,
    start: u64,
    len: u64,
    pos: u64,
}

impl BoundedStream {
    fn open(path: &Path, start: u64, len: u64) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            file,
            start,
            len,
            pos: 0,
        })
    }

    /// Total length of the bounded range
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current position within the range
    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl Read for BoundedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len - self.pos;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let limit = usize::try_from(remaining)
            .unwrap_or(usize::MAX)
            .min(buf.len());

        self.file.seek(SeekFrom::Start(self.start + self.pos))?;
        let read = self.file.read(&mut buf[..limit])?;
        self.pos += read as u64;
        Ok(read)
    }
}

impl Seek for BoundedStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len) + i128::from(delta),
        };

        if target < 0 || target > i128::from(self.len) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek outside the resource's byte range",
            ));
        }

        self.pos = target as u64;
        Ok(self.pos)
    }
}
