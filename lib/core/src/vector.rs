use crate::{Error, Result};
use ndarray::{Array2, ArrayD, ArrayView1, ArrayView2, IxDyn};

/// Number of style layers in a W+ latent
pub const LAYERS: usize = 18;

/// Width of a single style code
pub const LATENT_DIM: usize = 512;

/// Length of a flattened canonical latent
pub const FLAT_LEN: usize = LAYERS * LATENT_DIM;

/// A decoded latent array of arbitrary shape, as found on disk
///
/// Values are held as `f64`; narrower element types are widened on load.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVector {
    data: ArrayD<f64>,
}

impl RawVector {
    #[inline]
    #[must_use]
    pub fn new(data: ArrayD<f64>) -> Self {
        Self { data }
    }

    /// Build from a row-major value buffer and a shape
    pub fn from_shape_vec(shape: &[usize], values: Vec<f64>) -> Result<Self> {
        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map(Self::new)
            .map_err(|_| Error::Shape(shape.to_vec()))
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_array(&self) -> &ArrayD<f64> {
        &self.data
    }

    #[inline]
    pub fn into_array(self) -> ArrayD<f64> {
        self.data
    }
}

impl From<ArrayD<f64>> for RawVector {
    fn from(data: ArrayD<f64>) -> Self {
        Self::new(data)
    }
}

/// A W+ latent of exactly `(LAYERS, LATENT_DIM)`
///
/// Only [`crate::normalize`] can produce one, so every consumer may rely on
/// the shape without checking it again.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalVector {
    data: Array2<f64>,
}

impl CanonicalVector {
    pub(crate) fn from_matrix(data: Array2<f64>) -> Self {
        debug_assert_eq!(data.dim(), (LAYERS, LATENT_DIM));
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { data }
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    #[inline]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    #[inline]
    pub fn row(&self, layer: usize) -> ArrayView1<'_, f64> {
        self.data.row(layer)
    }

    /// Values in row-major order, layer index varying slowest
    #[inline]
    pub fn iter_flat(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    #[must_use]
    pub fn flatten(&self) -> Vec<f64> {
        self.iter_flat().collect()
    }
}
