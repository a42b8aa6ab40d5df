//! Read-only sources of schema text.
//!
//! A source is any addressable collection of named resources. Names are
//! slash-separated paths relative to the source root; absolute paths and
//! `.`/`..` elements are rejected so a source never reads outside itself.

use crate::error::SourceError;
use rootcause::prelude::Report;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A read-only collection of named resources.
pub trait SchemaSource {
    /// Returns the full content of the resource called `name`.
    fn read(&self, name: &str) -> Result<Vec<u8>, Report<SourceError>>;
}

impl<T: SchemaSource + ?Sized> SchemaSource for &T {
    fn read(&self, name: &str) -> Result<Vec<u8>, Report<SourceError>> {
        (**self).read(name)
    }
}

/// Reads `name` from `source` as UTF-8 text.
///
/// # Errors
///
/// Returns an error if the resource is missing, unreadable, or not UTF-8.
#[instrument(skip(source))]
pub fn load_schema<S: SchemaSource + ?Sized>(
    source: &S,
    name: &str,
) -> Result<String, Report<SourceError>> {
    let bytes = source.read(name)?;
    let text = String::from_utf8(bytes).map_err(|_| SourceError::NotUtf8 {
        name: name.to_string(),
    })?;

    debug!(bytes = text.len(), "schema loaded");
    Ok(text)
}

/// Checks that `name` is a clean relative path.
fn validate_name(name: &str) -> Result<(), SourceError> {
    let invalid = |reason: &str| SourceError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains('\\') {
        return Err(invalid("backslashes are not allowed"));
    }
    if name.starts_with('/') {
        return Err(invalid("absolute paths are not allowed"));
    }
    for element in name.split('/') {
        match element {
            "" => return Err(invalid("empty path elements are not allowed")),
            "." | ".." => return Err(invalid("'.' and '..' path elements are not allowed")),
            _ => {}
        }
    }
    Ok(())
}

/// A source backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory this source reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SchemaSource for DirSource {
    fn read(&self, name: &str) -> Result<Vec<u8>, Report<SourceError>> {
        validate_name(name)?;
        let path = self.root.join(name);

        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(SourceError::NotFound {
                name: name.to_string(),
            }
            .into()),
            Err(e) => Err(SourceError::Unreadable {
                name: name.to_string(),
                details: e.to_string(),
            }
            .into()),
        }
    }
}

/// A source holding its resources in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource.
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(name, contents);
        self
    }

    /// Adds or replaces a resource.
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), contents.into());
    }
}

impl SchemaSource for MemorySource {
    fn read(&self, name: &str) -> Result<Vec<u8>, Report<SourceError>> {
        validate_name(name)?;
        self.files.get(name).cloned().ok_or_else(|| {
            SourceError::NotFound {
                name: name.to_string(),
            }
            .into()
        })
    }
}
