//! W+ canonicalization
//!
//! Every accepted on-disk shape is mapped onto `(18, 512)`:
//!
//! - `(1, 18, 512)` drops the leading batch axis
//! - `(512,)` is a single style code, replicated across all 18 layers
//! - `(18, 512)` passes through
//!
//! Anything else is rejected as a whole; there is no padding or truncation.

use crate::vector::{CanonicalVector, RawVector, LATENT_DIM, LAYERS};
use crate::{Error, Result};
use ndarray::{Array2, Axis, Ix1, Ix2};

/// Canonicalize a raw latent into its `(18, 512)` form
pub fn normalize(raw: RawVector) -> Result<CanonicalVector> {
    let shape = raw.shape().to_vec();
    let array = raw.into_array();
    let shape_err = |_| Error::Shape(shape.clone());

    let matrix = match shape.as_slice() {
        [LATENT_DIM] => {
            let code = array.into_dimensionality::<Ix1>().map_err(shape_err)?;
            Array2::from_shape_fn((LAYERS, LATENT_DIM), |(_, j)| code[j])
        }
        [LAYERS, LATENT_DIM] => array.into_dimensionality::<Ix2>().map_err(shape_err)?,
        [1, LAYERS, LATENT_DIM] => array
            .index_axis_move(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .map_err(shape_err)?,
        _ => return Err(Error::Shape(shape.clone())),
    };

    Ok(CanonicalVector::from_matrix(matrix))
}
