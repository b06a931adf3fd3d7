// SPDX-License-Identifier: MIT
//! Package writer for bundling a directory into a resource container

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::compression_strategy::CompressionPolicy;
use crate::format::{self, IndexRecord, FORMAT_VERSION};
use crate::key::{resource_key, KeyError};

/// Errors that can occur while packing
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("duplicate resource key '{key}' produced by {path:?}")]
    DuplicateKey { key: String, path: PathBuf },

    #[error("resource {path:?} is too large to pack ({len} bytes)")]
    TooLarge { path: PathBuf, len: u64 },
}

struct ResourceFile {
    key: String,
    path: PathBuf,
    original_len: i32,
    stored: Vec<u8>,
    compressed: bool,
}

/// Bundles every matching file under a source directory into one container.
///
/// Packing is deterministic: entries are sorted by key and nothing
/// environment-dependent (timestamps, walk order) reaches the output, so
/// identical inputs produce byte-identical containers.
pub struct PackageWriter {
    source_directory: PathBuf,
    filter: Option<Pattern>,
    policy: CompressionPolicy,
}

impl PackageWriter {
    /// Create a writer that packs every file under `source_directory`.
    ///
    /// Fails before any I/O if the directory argument is empty.
    pub fn new<P: AsRef<Path>>(source_directory: P) -> Result<Self, WriteError> {
        let source_directory = source_directory.as_ref();
        if source_directory.as_os_str().is_empty() {
            return Err(WriteError::InvalidArgument(
                "source directory must not be empty".to_string(),
            ));
        }

        Ok(Self {
            source_directory: source_directory.to_path_buf(),
            filter: None,
            policy: CompressionPolicy::new(),
        })
    }

    /// Create a writer restricted to file names matching a glob pattern,
    /// e.g. `*.res.*`.
    pub fn with_filter<P: AsRef<Path>>(
        source_directory: P,
        pattern: &str,
    ) -> Result<Self, WriteError> {
        if pattern.is_empty() {
            return Err(WriteError::InvalidArgument(
                "filter pattern must not be empty".to_string(),
            ));
        }

        let mut writer = Self::new(source_directory)?;
        writer.filter = Some(Pattern::new(pattern)?);
        Ok(writer)
    }

    /// Pack matched resources into `output_path`, creating or truncating it.
    ///
    /// A missing source directory yields a valid empty package. A single
    /// unreadable source file aborts the whole operation.
    pub fn pack<P: AsRef<Path>>(&self, output_path: P) -> Result<(), WriteError> {
        let resources = self.collect_resources()?;

        let file = File::create(output_path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_package(&resources, &mut writer)?;
        writer.flush()?;

        info!(
            entries = resources.len(),
            stored_bytes = resources.iter().map(|r| r.stored.len()).sum::<usize>(),
            output = %output_path.as_ref().display(),
            "packed resource container"
        );
        Ok(())
    }

    fn collect_resources(&self) -> Result<Vec<ResourceFile>, WriteError> {
        if !self.source_directory.is_dir() {
            debug!(
                source = %self.source_directory.display(),
                "source directory missing, producing empty package"
            );
            return Ok(Vec::new());
        }

        let mut resources = Vec::new();
        for entry in WalkDir::new(&self.source_directory) {
            let entry = entry.map_err(|e| WriteError::Io(io::Error::from(e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if !self.matches_filter(entry.path()) {
                continue;
            }

            resources.push(self.load_resource(entry.path())?);
        }

        // Ordinal sort fixes both the index order and the content layout
        resources.sort_by(|a, b| a.key.cmp(&b.key));

        for pair in resources.windows(2) {
            if pair[0].key == pair[1].key {
                return Err(WriteError::DuplicateKey {
                    key: pair[1].key.clone(),
                    path: pair[1].path.clone(),
                });
            }
        }

        Ok(resources)
    }

    fn matches_filter(&self, path: &Path) -> bool {
        match &self.filter {
            Some(pattern) => path
                .file_name()
                .map(|name| pattern.matches(&name.to_string_lossy()))
                .unwrap_or(false),
            None => true,
        }
    }

    fn load_resource(&self, path: &Path) -> Result<ResourceFile, WriteError> {
        let content = std::fs::read(path)?;
        let original_len =
            i32::try_from(content.len()).map_err(|_| WriteError::TooLarge {
                path: path.to_path_buf(),
                len: content.len() as u64,
            })?;

        let key = resource_key(path)?;
        let extension = path.extension().map(|ext| ext.to_string_lossy());
        let outcome = self
            .policy
            .try_compress(extension.as_deref(), &content)?;

        if outcome.compressed {
            debug!(
                key = %key,
                original = content.len(),
                stored = outcome.stored.len(),
                "compressed resource"
            );
        }

        Ok(ResourceFile {
            key,
            path: path.to_path_buf(),
            original_len,
            stored: outcome.stored,
            compressed: outcome.compressed,
        })
    }

    fn write_package<W: Write>(
        &self,
        resources: &[ResourceFile],
        writer: &mut W,
    ) -> Result<(), WriteError> {
        writer.write_all(&[FORMAT_VERSION])?;
        format::write_i32(writer, resources.len() as i32)?;

        for resource in resources {
            let record = IndexRecord {
                key: resource.key.clone(),
                original_len: resource.original_len,
                stored_len: resource.stored.len() as i32,
                compressed: resource.compressed,
            };
            record.write_to(writer)?;
        }

        for resource in resources {
            writer.write_all(&resource.stored)?;
        }

        Ok(())
    }
}
