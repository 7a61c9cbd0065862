// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only access to the host's resource state.

use hashbrown::HashMap;

use crate::ResourceError;

/// Enumerates named font-declaration documents and serves raw bytes by
/// logical path.
///
/// Implementations are read-only snapshots of the host's current resource
/// state; the reload pipeline reads them from worker threads.
pub trait ResourceSource: Sync {
    /// All font declaration documents as `(font name, JSON bytes)` pairs,
    /// in precedence order: later documents override earlier ones for the
    /// same name.
    fn font_documents(&self) -> Vec<(String, Vec<u8>)>;

    /// Raw bytes for a logical path (atlas images, metadata tables).
    fn bytes(&self, path: &str) -> Result<Vec<u8>, ResourceError>;
}

/// An in-memory resource source.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: Vec<(String, Vec<u8>)>,
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.documents.push((name.to_owned(), bytes.into()));
        self
    }

    pub fn with_file(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_owned(), bytes.into());
        self
    }
}

impl ResourceSource for MemorySource {
    fn font_documents(&self) -> Vec<(String, Vec<u8>)> {
        self.documents.clone()
    }

    fn bytes(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(path.to_owned()))
    }
}
