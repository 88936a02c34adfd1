use crate::error::{PropertyError, Result};
use log::{debug, info};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::prelude::*;

/// Rotate a 3x3 tensor to its principal axes. The axes are the eigenvectors of
/// g g^T, ordered by their dominant Cartesian component, with a positive dominant
/// component and forming a right-handed frame. Returns the rotated tensor and the axes
/// as columns.
pub fn align(tensor: ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
    if tensor.dim() != (3, 3) {
        return Err(PropertyError::Shape(format!(
            "principal axes need a 3x3 tensor, got {:?}",
            tensor.dim()
        )));
    }
    let gg: Array2<f64> = tensor.dot(&tensor.t());
    let eig = SymmetricEigen::new(DMatrix::from_fn(3, 3, |i, j| gg[[i, j]]));
    let mut v: Array2<f64> = Array2::from_shape_fn((3, 3), |(i, j)| eig.eigenvectors[(i, j)]);

    // index of the largest component of every axis
    let idxmax: Vec<usize> = v
        .axis_iter(Axis(1))
        .map(|col| {
            col.iter()
                .enumerate()
                .fold((0, 0.0), |(k_max, v_max), (k, x)| {
                    if x.abs() > v_max {
                        (k, x.abs())
                    } else {
                        (k_max, v_max)
                    }
                })
                .0
        })
        .collect();
    for (j, k) in idxmax.iter().enumerate() {
        if v[[*k, j]] < 0.0 {
            v.column_mut(j).mapv_inplace(|x| -x);
        }
    }
    let mut order: Vec<usize> = (0..3).collect();
    order.sort_by_key(|j| idxmax[*j]);
    let mut v: Array2<f64> = v.select(Axis(1), &order);
    if determinant(v.view()) < 0.0 {
        v.column_mut(2).mapv_inplace(|x| -x);
    }
    Ok((v.t().dot(&tensor).dot(&v), v))
}

fn determinant(m: ArrayView2<f64>) -> f64 {
    m[[0, 0]] * (m[[1, 1]] * m[[2, 2]] - m[[1, 2]] * m[[2, 1]])
        - m[[0, 1]] * (m[[1, 0]] * m[[2, 2]] - m[[1, 2]] * m[[2, 0]])
        + m[[0, 2]] * (m[[1, 0]] * m[[2, 1]] - m[[1, 1]] * m[[2, 0]])
}

/// Log the principal values of a tensor, the full tensor only at debug level.
pub fn write_tensor(tensor: ArrayView2<f64>, title: &str) {
    let diag = tensor.diag();
    info!("{} [{:>14.6} {:>14.6} {:>14.6}]", title, diag[0], diag[1], diag[2]);
    debug!("{}", title);
    for (label, row) in ["I_x", "I_y", "I_z"].iter().zip(tensor.outer_iter()) {
        debug!("{} [{:>14.6} {:>14.6} {:>14.6}]", label, row[0], row[1], row[2]);
    }
}
