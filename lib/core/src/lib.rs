//! # latentdist Core
//!
//! Core library for comparing W+ latents.
//!
//! This crate provides:
//!
//! - [`VectorLoader`] - reads `.pt` tensor archives (via `candle_core::pickle`) and `.npy`
//!   arrays into a [`RawVector`]
//! - [`normalize`] - canonicalizes a raw latent into an `(18, 512)` [`CanonicalVector`]
//! - [`euclidean_distance`] - L2 distance between two canonical latents
//! - [`ReferenceSet`] - the four stranger latents, selected by [`Sex`]
//! - [`LatentLayout`] - the `<id>_01_latent.<ext>` file naming convention
//!
//! ## Example
//!
//! ```rust
//! use latentdist_core::{normalize, euclidean_distance, RawVector};
//!
//! let a = normalize(RawVector::from_shape_vec(&[512], vec![0.0; 512]).unwrap()).unwrap();
//! let b = normalize(RawVector::from_shape_vec(&[18, 512], vec![0.0; 18 * 512]).unwrap()).unwrap();
//! assert_eq!(euclidean_distance(&a, &b), 0.0);
//! ```

pub mod error;
pub mod vector;
pub mod normalize;
pub mod distance;
pub mod payload;
pub mod container;
pub mod loader;
pub mod layout;
pub mod reference;

#[cfg(test)]
mod fixtures;

pub use error::{Error, Result};
pub use vector::{CanonicalVector, RawVector, FLAT_LEN, LATENT_DIM, LAYERS};
pub use normalize::normalize;
pub use distance::euclidean_distance;
pub use payload::VectorPayload;
pub use container::TensorArchive;
pub use loader::{LoadOptions, VectorFormat, VectorLoader};
pub use layout::LatentLayout;
pub use reference::{ReferenceSet, Sex, StrangerDistances, StrangerKey};
