use crate::container::TensorArchive;
use crate::normalize::normalize;
use crate::vector::{CanonicalVector, RawVector};
use crate::{Error, Result};
use ndarray::ArrayD;
use ndarray_npy::{read_npy, ReadNpyError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// On-disk encodings, told apart by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorFormat {
    /// Zip archive with a pickled object graph (`.pt`, `.pth`)
    TensorContainer,
    /// Flat numeric array (`.npy`)
    FlatArray,
}

impl VectorFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "pt" | "pth" => Some(VectorFormat::TensorContainer),
            "npy" => Some(VectorFormat::FlatArray),
            _ => None,
        }
    }
}

/// Options controlling how container payloads are resolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Mapping key holding the latent, when the container is a dict
    pub latent_key: Option<String>,
}

/// Reads latent files into raw arrays
#[derive(Debug, Clone, Default)]
pub struct VectorLoader {
    options: LoadOptions,
}

impl VectorLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load the raw array stored at `path`
    pub fn load(&self, path: &Path) -> Result<RawVector> {
        let format = VectorFormat::from_path(path)
            .ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }

        let raw = match format {
            VectorFormat::TensorContainer => {
                let mut archive = TensorArchive::open(path)?;
                archive.read_latent(self.options.latent_key.as_deref())?
            }
            VectorFormat::FlatArray => load_npy(path)?,
        };
        debug!(path = %path.display(), shape = ?raw.shape(), "Loaded latent");
        Ok(raw)
    }

    /// Load and canonicalize in one step
    pub fn load_canonical(&self, path: &Path) -> Result<CanonicalVector> {
        normalize(self.load(path)?)
    }
}

fn load_npy(path: &Path) -> Result<RawVector> {
    match read_npy::<_, ArrayD<f64>>(path) {
        Ok(array) => Ok(RawVector::new(array)),
        Err(ReadNpyError::WrongDescriptor(_)) => {
            let narrow: ArrayD<f32> = read_npy(path).map_err(|e| Error::decode(path, e))?;
            Ok(RawVector::new(narrow.mapv(f64::from)))
        }
        Err(e) => Err(Error::decode(path, e)),
    }
}
