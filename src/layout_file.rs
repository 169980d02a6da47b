//! Reading the persisted layout document from disk.
//!
//! DESIGN
//! ======
//! The file is the only persistence the board has, and another process (or a
//! person with an editor) may replace it at any time, so it is re-read on
//! every request rather than cached. It is parsed with the same
//! `LayoutDocument` model the engine uses, which means a file the server
//! accepts is one the page can restore. The original text is what gets
//! served, so unknown keys survive the round trip.

use std::io;
use std::path::{Path, PathBuf};

use board::persist::LayoutDocument;

#[derive(Debug, thiserror::Error)]
pub enum LayoutFileError {
    #[error("layout document {} does not exist", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed layout document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A layout document as read from disk.
#[derive(Debug, Clone)]
pub struct LoadedLayout {
    pub text: String,
    pub document: LayoutDocument,
}

impl LoadedLayout {
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.document.images.len()
    }

    #[must_use]
    pub fn fixed_count(&self) -> usize {
        self.document.fixed_count()
    }
}

/// Read and validate the document at `path`.
pub async fn read_layout(path: &Path) -> Result<LoadedLayout, LayoutFileError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LayoutFileError::Missing { path: path.to_path_buf() });
        }
        Err(source) => return Err(LayoutFileError::Io { path: path.to_path_buf(), source }),
    };
    let document =
        LayoutDocument::from_json(&text).map_err(|source| LayoutFileError::Parse { path: path.to_path_buf(), source })?;
    Ok(LoadedLayout { text, document })
}

/// Log what the page will restore, or why it will start empty.
pub async fn log_summary(path: &Path) {
    match read_layout(path).await {
        Ok(layout) => tracing::info!(
            path = %path.display(),
            images = layout.image_count(),
            fixed = layout.fixed_count(),
            canvas_height = layout.document.canvas_height(),
            "layout document loaded"
        ),
        Err(LayoutFileError::Missing { .. }) => {
            tracing::warn!(path = %path.display(), "no layout document; the board will start empty");
        }
        Err(e) => tracing::warn!(error = %e, "layout document unusable; the board will start empty"),
    }
}

#[cfg(test)]
#[path = "layout_file_test.rs"]
mod tests;
