// SPDX-License-Identifier: MIT
//! In-memory package index
//!
//! Loaded once per reader from a container's header and index section.
//! Entries are immutable after construction and shared by reference across
//! every concurrent read.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::Path;

use tracing::debug;

use crate::format::{self, IndexRecord, FORMAT_VERSION};
use crate::reader::ReadError;

/// Location and shape of one resource inside the container file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Byte offset of the stored content, derived at load time
    pub offset: u64,

    /// Byte count as written (compressed or raw)
    pub stored_len: u32,

    /// Byte count before compression
    pub original_len: u32,

    /// Whether the stored bytes are gzip-compressed
    pub compressed: bool,
}

/// Immutable key → entry mapping for one container file
#[derive(Debug)]
pub struct PackageIndex {
    entries: HashMap<String, ResourceEntry>,
}

impl PackageIndex {
    /// Load the index from a container file.
    ///
    /// Verifies the version byte, reads every index record, and computes
    /// each entry's offset as a running total starting right after the
    /// index section.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReadError> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);

        let version = format::read_u8(&mut reader)?;
        if version != FORMAT_VERSION {
            return Err(ReadError::UnsupportedVersion {
                found: version,
                expected: FORMAT_VERSION,
            });
        }

        let count = format::read_i32(&mut reader)?;
        if count < 0 {
            return Err(ReadError::InvalidFormat(format!(
                "negative entry count: {count}"
            )));
        }

        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            records.push(IndexRecord::read_from(&mut reader)?);
        }

        // BufReader may have read ahead; stream_position accounts for the
        // buffered bytes and reports the logical content start
        let mut offset = reader.stream_position()?;
        let mut entries = HashMap::with_capacity(records.len());
        for record in records {
            let stored_len = u32::try_from(record.stored_len).map_err(|_| {
                ReadError::InvalidFormat(format!(
                    "negative stored length for key '{}'",
                    record.key
                ))
            })?;
            let original_len = u32::try_from(record.original_len).map_err(|_| {
                ReadError::InvalidFormat(format!(
                    "negative original length for key '{}'",
                    record.key
                ))
            })?;

            entries.insert(
                record.key,
                ResourceEntry {
                    offset,
                    stored_len,
                    original_len,
                    compressed: record.compressed,
                },
            );
            offset += u64::from(stored_len);
        }

        debug!(
            entries = entries.len(),
            path = %path.as_ref().display(),
            "loaded package index"
        );
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&ResourceEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over every key, in unspecified order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_container(records: &[(&str, &[u8], bool)]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[FORMAT_VERSION]).unwrap();
        format::write_i32(&mut file, records.len() as i32).unwrap();
        for (key, stored, compressed) in records {
            IndexRecord {
                key: key.to_string(),
                original_len: stored.len() as i32,
                stored_len: stored.len() as i32,
                compressed: *compressed,
            }
            .write_to(&mut file)
            .unwrap();
        }
        for (_, stored, _) in records {
            file.write_all(stored).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_computes_running_offsets() {
        let file = write_container(&[
            ("alpha", b"12345", false),
            ("beta", b"678", false),
            ("gamma", b"90", false),
        ]);

        let index = PackageIndex::load(file.path()).unwrap();
        assert_eq!(index.len(), 3);

        let alpha = index.get("alpha").unwrap();
        let beta = index.get("beta").unwrap();
        let gamma = index.get("gamma").unwrap();

        assert_eq!(beta.offset, alpha.offset + 5);
        assert_eq!(gamma.offset, beta.offset + 3);
        assert_eq!(gamma.stored_len, 2);
    }

    #[test]
    fn test_load_empty_package() {
        let file = write_container(&[]);
        let index = PackageIndex::load(file.path()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.keys().count(), 0);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[99]).unwrap();
        format::write_i32(&mut file, 0).unwrap();
        file.flush().unwrap();

        let result = PackageIndex::load(file.path());
        assert!(matches!(
            result,
            Err(ReadError::UnsupportedVersion {
                found: 99,
                expected: FORMAT_VERSION
            })
        ));
    }

    #[test]
    fn test_truncated_index_rejected() {
        let full = write_container(&[("alpha", b"12345", false)]);
        let bytes = std::fs::read(full.path()).unwrap();

        let mut truncated = NamedTempFile::new().unwrap();
        truncated.write_all(&bytes[..bytes.len() - 8]).unwrap();
        truncated.flush().unwrap();

        assert!(PackageIndex::load(truncated.path()).is_err());
    }
}
