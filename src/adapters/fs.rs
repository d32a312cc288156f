use crate::domain::ports::FileReader;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads payload files relative to a base directory. Absolute paths are
/// used as given.
#[derive(Debug, Clone)]
pub struct LocalFileReader {
    base_path: PathBuf,
}

impl LocalFileReader {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Resolves paths against the process working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl FileReader for LocalFileReader {
    async fn read_file(&self, path: &str) -> std::io::Result<Vec<u8>> {
        let full_path = self.base_path.join(Path::new(path));
        tracing::debug!(path = %full_path.display(), "reading payload file");
        tokio::fs::read(full_path).await
    }
}
