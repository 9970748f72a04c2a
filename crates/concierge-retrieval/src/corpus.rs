//! Document corpus enumeration.
//!
//! The corpus is a directory of source documents; whatever files are
//! present right now define the known document set. Retrieval results are
//! filtered against this set so a document deleted from disk stops being
//! served even while a stale index still holds its chunks.

use std::path::PathBuf;

use tracing::warn;

/// The currently known document set, defined by a directory listing.
#[derive(Debug, Clone)]
pub struct DocumentCorpus {
    root: PathBuf,
    legal_extensions: Vec<String>,
}

impl DocumentCorpus {
    pub fn new(root: impl Into<PathBuf>, legal_extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            legal_extensions,
        }
    }

    /// File names of all documents currently present, extension-filtered.
    ///
    /// An unreadable directory yields an empty set (and a log entry), so a
    /// missing corpus degrades to "no known documents" rather than an
    /// error.
    pub fn document_names(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = %self.root.display(),
                    error = %e,
                    "Document directory unreadable; treating corpus as empty"
                );
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| self.has_legal_extension(name))
            .collect();
        names.sort();
        names
    }

    /// Whether a document of this name is currently part of the corpus.
    pub fn contains(&self, name: &str) -> bool {
        self.has_legal_extension(name) && self.root.join(name).is_file()
    }

    fn has_legal_extension(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.legal_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    }
}
