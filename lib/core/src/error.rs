use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Latent file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Empty mapping in {}, no tensor to extract", .0.display())]
    EmptyMapping(PathBuf),

    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Cannot canonicalize shape {0:?}, expected (512,), (18, 512) or (1, 18, 512)")]
    Shape(Vec<usize>),

    #[error("Reference vector {key} unavailable: {source}")]
    Reference {
        key: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for every failure raised while turning a file into a raw array
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            Error::MissingFile(_)
                | Error::EmptyMapping(_)
                | Error::UnsupportedFormat(_)
                | Error::Decode { .. }
                | Error::Io(_)
        )
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Error::Shape(_))
    }
}
