use crate::error::{PropertyError, Result};
use log::{debug, warn};
use nalgebra::DMatrix;
use ndarray::prelude::*;

/// Outcome of an iterative solve for several right-hand sides at once.
#[derive(Clone, Debug)]
pub struct KrylovSolution {
    /// solution vectors as columns, (dim, k)
    pub x: Array2<f64>,
    pub converged: bool,
    pub iterations: usize,
}

/// Orthogonalize `v` against the columns of `basis` (modified Gram-Schmidt, applied
/// twice) and normalize it. Returns `None` if nothing new is left.
fn orthonormalize_against(basis: ArrayView2<f64>, mut v: Array1<f64>) -> Option<Array1<f64>> {
    let norm_in: f64 = v.dot(&v).sqrt();
    if norm_in == 0.0 {
        return None;
    }
    for _ in 0..2 {
        for b in basis.axis_iter(Axis(1)) {
            let overlap: f64 = b.dot(&v);
            v.scaled_add(-overlap, &b);
        }
    }
    let norm: f64 = v.dot(&v).sqrt();
    if norm < 1.0e-10 * norm_in {
        None
    } else {
        Some(v / norm)
    }
}

fn extend_basis(basis: &Array2<f64>, vectors: &[Array1<f64>]) -> Result<Array2<f64>> {
    let mut extended: Array2<f64> = basis.clone();
    for v in vectors.iter() {
        // a column for each vector that is still linearly independent
        if let Some(q) = orthonormalize_against(extended.view(), v.clone()) {
            extended
                .push_column(q.view())
                .map_err(|err| PropertyError::Shape(err.to_string()))?;
        }
    }
    Ok(extended)
}

/// Solve the subspace equations A_b x_b = b_b for all right-hand sides.
fn solve_subspace(a_b: &Array2<f64>, b_b: &Array2<f64>, iteration: usize) -> Result<Array2<f64>> {
    let (l, k): (usize, usize) = b_b.dim();
    let a: DMatrix<f64> = DMatrix::from_fn(l, l, |i, j| a_b[[i, j]]);
    let b: DMatrix<f64> = DMatrix::from_fn(l, k, |i, j| b_b[[i, j]]);
    let x: DMatrix<f64> = a.lu().solve(&b).ok_or(PropertyError::SingularSubspace(iteration))?;
    Ok(Array2::from_shape_fn((l, k), |(i, j)| x[(i, j)]))
}

/// Solve M x = rhs with a Krylov subspace method for all columns of `rhs` at once.
///
/// `apply` evaluates M on a set of column vectors. The diagonal approximation `diag`
/// of M is used as preconditioner for the first guess and for the new expansion
/// vectors. Residuals with a norm below `expansion_threshold` are not used to enlarge
/// the subspace. Not reaching `conv` within `max_cycle` iterations is only reported.
pub fn krylov_solve<F>(
    mut apply: F,
    diag: ArrayView1<f64>,
    rhs: ArrayView2<f64>,
    conv: f64,
    max_cycle: usize,
    expansion_threshold: f64,
) -> Result<KrylovSolution>
where
    F: FnMut(ArrayView2<f64>) -> Result<Array2<f64>>,
{
    let (dim, k): (usize, usize) = rhs.dim();
    if diag.len() != dim {
        return Err(PropertyError::Shape(format!(
            "preconditioner of length {} for vectors of length {}",
            diag.len(),
            dim
        )));
    }
    if rhs.iter().all(|x| *x == 0.0) {
        return Ok(KrylovSolution {
            x: Array2::zeros((dim, k)),
            converged: true,
            iterations: 0,
        });
    }
    let precond: Array1<f64> = diag.mapv(|d| if d.abs() > 1.0e-8 { 1.0 / d } else { 1.0 });

    // initial expansion vectors from the diagonal guess
    let guesses: Vec<Array1<f64>> = rhs.axis_iter(Axis(1)).map(|b| &precond * &b).collect();
    let mut bs: Array2<f64> = extend_basis(&Array2::zeros((dim, 0)), &guesses)?;
    // products M b for all expansion vectors
    let mut m_bs: Array2<f64> = Array2::zeros((dim, 0));

    let mut x_matrix: Array2<f64> = Array2::zeros((dim, k));
    let mut converged: bool = false;
    let mut iterations: usize = 0;

    for it in 0..max_cycle {
        iterations = it + 1;
        // only the new expansion vectors have to be multiplied
        let l_old: usize = m_bs.ncols();
        let new_products: Array2<f64> = apply(bs.slice(s![.., l_old..]))?;
        for column in new_products.axis_iter(Axis(1)) {
            m_bs.push_column(column)
                .map_err(|err| PropertyError::Shape(err.to_string()))?;
        }

        // representation of M and of the rhs in the subspace
        let a_b: Array2<f64> = bs.t().dot(&m_bs);
        let b_b: Array2<f64> = bs.t().dot(&rhs);
        let x_b: Array2<f64> = solve_subspace(&a_b, &b_b, iterations)?;

        // back to the full space
        x_matrix = bs.dot(&x_b);
        let residual: Array2<f64> = m_bs.dot(&x_b) - &rhs;
        let norms: Vec<f64> = residual
            .axis_iter(Axis(1))
            .map(|r| r.dot(&r).sqrt())
            .collect();
        let max_norm: f64 = norms.iter().cloned().fold(0.0, f64::max);
        debug!("Krylov iteration {:>3}: subspace {:>4}, max. residual {:12.4e}", iterations, bs.ncols(), max_norm);
        if max_norm < conv {
            converged = true;
            break;
        }

        // residual vectors that are (almost) zero cannot be used as new expansion vectors
        let eps: f64 = expansion_threshold * conv;
        let corrections: Vec<Array1<f64>> = residual
            .axis_iter(Axis(1))
            .zip(norms.iter())
            .filter(|(_, norm)| **norm > eps)
            .map(|(r, _)| &precond * &r)
            .collect();
        let expanded: Array2<f64> = extend_basis(&bs, &corrections)?;
        if expanded.ncols() == bs.ncols() {
            // the subspace cannot grow any further
            break;
        }
        bs = expanded;
    }
    if !converged {
        warn!(
            "Krylov solver did not converge in {} iterations (threshold {:e})",
            iterations, conv
        );
    }
    Ok(KrylovSolution {
        x: x_matrix,
        converged,
        iterations,
    })
}
