use crate::error::{PropertyError, Result};
use ndarray::prelude::*;
use ndarray::{Data, Dimension};
use ndarray_einsum_beta::{einsum, tensordot, ArrayLike};
use std::fmt;
use std::time::Instant;

#[cfg(test)]
pub(crate) mod tests;

/// A simple timer based on std::time::Instant, to implement the std::fmt::Display trait on
pub struct Timer {
    time: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Timer {
            time: Instant::now(),
        }
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:>68} {:>8.2} s",
            "elapsed time:",
            self.time.elapsed().as_secs_f32()
        )
    }
}

/// Einstein summation with the result converted to a fixed dimensionality.
pub fn contract<D: Dimension>(subscripts: &str, operands: &[&dyn ArrayLike<f64>]) -> Result<Array<f64, D>> {
    einsum(subscripts, operands)
        .map_err(|msg| PropertyError::Contraction(format!("{}: {}", subscripts, msg)))?
        .into_dimensionality::<D>()
        .map_err(|err| PropertyError::Contraction(format!("{}: {}", subscripts, err)))
}

/// Tensor dot product over the given axes with the result converted to a fixed dimensionality.
pub fn dot_axes<S1, S2, D1, D2, D>(
    lhs: &ArrayBase<S1, D1>,
    rhs: &ArrayBase<S2, D2>,
    lhs_axes: &[Axis],
    rhs_axes: &[Axis],
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D1: Dimension,
    D2: Dimension,
    D: Dimension,
{
    tensordot(lhs, rhs, lhs_axes, rhs_axes)
        .into_dimensionality::<D>()
        .map_err(|err| PropertyError::Contraction(format!("tensordot: {}", err)))
}

/// Reshape an array that may not be in standard layout.
pub fn reshaped<S, D, E>(array: &ArrayBase<S, D>, shape: E) -> Result<Array<f64, E::Dim>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    E: ndarray::IntoDimension,
{
    array
        .as_standard_layout()
        .to_owned()
        .into_shape(shape)
        .map_err(|err| PropertyError::Shape(err.to_string()))
}

/// Regression checksum of an array: the dot product of the flattened array with
/// cos(0), cos(1), cos(2), ...
pub fn fingerprint<S, D>(array: &ArrayBase<S, D>) -> f64
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    array
        .iter()
        .enumerate()
        .fold(0.0, |acc, (k, value)| acc + (k as f64).cos() * value)
}

/// Antisymmetric part 1/2 (A - A^T) of a square matrix.
pub fn antisymmetrize(a: ArrayView2<f64>) -> Array2<f64> {
    0.5 * (&a - &a.t())
}

/// Symmetric part 1/2 (A + A^T) of a square matrix.
pub fn symmetrize(a: ArrayView2<f64>) -> Array2<f64> {
    0.5 * (&a + &a.t())
}

/// C1^T A C2 for every component of a stack of matrices.
pub fn transform_stack(a: ArrayView3<f64>, c1: ArrayView2<f64>, c2: ArrayView2<f64>) -> Array3<f64> {
    let mut out: Array3<f64> = Array3::zeros((a.dim().0, c1.ncols(), c2.ncols()));
    for (mut target, comp) in out.outer_iter_mut().zip(a.outer_iter()) {
        target.assign(&c1.t().dot(&comp.dot(&c2)));
    }
    out
}
