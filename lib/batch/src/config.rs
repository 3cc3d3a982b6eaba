use latentdist_core::{LatentLayout, LoadOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Participant table, CSV or `.xlsx`
    pub input: PathBuf,
    /// Where the augmented table is written, format chosen by extension
    pub output: PathBuf,
    /// Directory holding participant latents
    pub latent_dir: PathBuf,
    /// Directory holding the four stranger latents
    pub reference_dir: PathBuf,
    /// File name suffix between identifier and extension
    pub suffix: String,
    /// Extensions tried in order when resolving a latent file
    pub extensions: Vec<String>,
    /// Mapping key to read when a tensor archive holds a dict
    pub latent_key: Option<String>,
    /// Optional JSON summary output
    pub summary: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let layout = LatentLayout::default();
        Self {
            input: PathBuf::from("source.csv"),
            output: PathBuf::from("source_with_distances.csv"),
            latent_dir: layout.dir,
            reference_dir: PathBuf::from("."),
            suffix: layout.suffix,
            extensions: layout.extensions,
            latent_key: None,
            summary: None,
        }
    }
}

impl BatchConfig {
    pub fn participant_layout(&self) -> LatentLayout {
        LatentLayout::new(&self.latent_dir)
            .with_suffix(self.suffix.clone())
            .with_extensions(self.extensions.iter().cloned())
    }

    pub fn reference_layout(&self) -> LatentLayout {
        LatentLayout::new(&self.reference_dir)
            .with_suffix(self.suffix.clone())
            .with_extensions(self.extensions.iter().cloned())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            latent_key: self.latent_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_naming_convention() {
        let config = BatchConfig::default();
        let layout = config.participant_layout();
        assert_eq!(layout.expected("p7"), PathBuf::from("ptraw/p7_01_latent.pt"));
        assert_eq!(config.reference_layout().expected("fu1"), PathBuf::from("./fu1_01_latent.pt"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BatchConfig =
            serde_json::from_str(r#"{"latent_dir": "latents", "latent_key": "w"}"#).unwrap();
        assert_eq!(config.latent_dir, PathBuf::from("latents"));
        assert_eq!(config.latent_key.as_deref(), Some("w"));
        assert_eq!(config.input, PathBuf::from("source.csv"));
        assert_eq!(config.load_options().latent_key.as_deref(), Some("w"));
    }
}
