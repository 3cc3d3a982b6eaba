use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File naming convention `<dir>/<id><suffix>.<ext>`
///
/// Extensions are tried in order and the first existing file wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatentLayout {
    pub dir: PathBuf,
    pub suffix: String,
    pub extensions: Vec<String>,
}

impl Default for LatentLayout {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("ptraw"),
            suffix: "_01_latent".to_string(),
            extensions: vec!["pt".to_string(), "npy".to_string()],
        }
    }
}

impl LatentLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the convention gives for `id` with the preferred extension
    pub fn expected(&self, id: &str) -> PathBuf {
        let ext = self.extensions.first().map(String::as_str).unwrap_or("pt");
        self.candidate(id, ext)
    }

    /// First existing file for `id`, if any
    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| self.candidate(id, ext))
            .find(|path| path.is_file())
    }

    fn candidate(&self, id: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}{}.{}", id, self.suffix, ext))
    }
}
