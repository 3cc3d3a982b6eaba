use crate::vector::CanonicalVector;

/// Euclidean (L2) distance between two W+ latents
///
/// Both operands are flattened in row-major order. The shape is guaranteed
/// by [`CanonicalVector`], so this cannot fail.
#[inline]
pub fn euclidean_distance(a: &CanonicalVector, b: &CanonicalVector) -> f64 {
    a.iter_flat()
        .zip(b.iter_flat())
        .map(|(x, y)| (y - x) * (y - x))
        .sum::<f64>()
        .sqrt()
}
