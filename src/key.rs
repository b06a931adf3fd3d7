// SPDX-License-Identifier: MIT
//! Resource key derivation
//!
//! Converts file paths into stable identifiers. The packer and any external
//! code generation must agree on keys, so the mapping lives here and nowhere
//! else.

use std::path::Path;

/// Fallback key for names that sanitize to nothing
const DEFAULT_KEY: &str = "_resource";

/// Errors that can occur while deriving a resource key
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("file path is empty")]
    EmptyPath,

    #[error("file path does not contain a valid base name: {0}")]
    EmptyBaseName(String),
}

/// Derive the resource key for a file path.
///
/// The key is the file name truncated at the first `.` (so the whole
/// multi-extension suffix is stripped: `test.res.json` becomes `test`),
/// sanitized to `[A-Za-z0-9_]`. Same path always yields the same key.
pub fn resource_key<P: AsRef<Path>>(path: P) -> Result<String, KeyError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(KeyError::EmptyPath);
    }

    let base_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    let stem = base_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        return Err(KeyError::EmptyBaseName(path.display().to_string()));
    }

    Ok(sanitize_identifier(stem))
}

/// Sanitize an arbitrary name into a valid identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_`. A leading digit gets an
/// underscore prefix so the result is always usable as an identifier in
/// generated accessor code.
pub fn sanitize_identifier(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if let Some(first) = result.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            result.insert(0, '_');
        }
    }

    if result.is_empty() {
        result = DEFAULT_KEY.to_string();
    }

    result
}
