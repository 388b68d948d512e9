//! Text-extraction seam: a stored-file reference becomes full document text.
//!
//! The reference implementation reads UTF-8 files under the upload
//! directory. PDF or remote-blob backends slot in behind the same trait;
//! whatever the backend, failure to produce text is fatal for the request
//! that needed it (no text means no quiz can be attempted).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ApiError;

#[async_trait]
pub trait TextExtractor: Send + Sync {
  async fn extract(&self, file: &str) -> Result<String, ApiError>;
}

pub struct FsTextExtractor {
  root: PathBuf,
}

impl FsTextExtractor {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

#[async_trait]
impl TextExtractor for FsTextExtractor {
  #[instrument(level = "info", skip(self), fields(%file))]
  async fn extract(&self, file: &str) -> Result<String, ApiError> {
    // References are plain file names; strip any path components.
    let name = Path::new(file)
      .file_name()
      .ok_or_else(|| ApiError::Extraction(format!("bad file reference: {file}")))?;
    let path = self.root.join(name);
    tokio::fs::read_to_string(&path)
      .await
      .map_err(|e| ApiError::Extraction(format!("{}: {}", path.display(), e)))
  }
}
