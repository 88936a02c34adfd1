//! Access to the atomic-orbital integrals of the external integral engine and the
//! transformations built on top of them.
use crate::error::{PropertyError, Result};
use ndarray::prelude::*;

pub mod ao2mo;
pub mod jk;

pub use ao2mo::{transform_eri, transform_one};
pub use jk::{get_jk, get_jk_soc, get_jk_spin};

/// Origin independent one-electron property integrals.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OneElectronIntegral {
    /// p V_nuc x p = -Σ_A Z_A p (1/r_A) x p (3 components)
    PnucxP,
}

/// One-electron property integrals that depend on an origin, 1/|r - origin|.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RinvIntegral {
    /// imaginary part of <σ·(r/r^3 x p)>, 12 components ordered as (3, 4)
    Sa01sp,
    /// p (1/r) x p (3 components)
    PrinvxP,
}

impl RinvIntegral {
    pub fn n_components(&self) -> usize {
        match self {
            RinvIntegral::Sa01sp => 12,
            RinvIntegral::PrinvxP => 3,
        }
    }
}

/// The integral engine. Every origin dependent integral receives the origin
/// as an explicit argument, implementations must not keep origin state.
pub trait IntegralProvider {
    /// Number of atomic orbitals.
    fn n_ao(&self) -> usize;
    /// Core Hamiltonian T + V_nuc.
    fn hcore(&self) -> Array2<f64>;
    fn overlap(&self) -> Array2<f64>;
    /// Electron repulsion integrals (μν|λσ) in chemists' notation.
    fn eri(&self) -> Array4<f64>;
    fn evaluate(&self, kind: OneElectronIntegral) -> Result<Array3<f64>>;
    fn evaluate_at(&self, origin: [f64; 3], kind: RinvIntegral) -> Result<Array3<f64>>;
    /// Values of the atomic orbitals at the given points, shape (n_points, n_ao).
    fn ao_values(&self, coords: ArrayView2<f64>) -> Result<Array2<f64>>;
    /// Two-electron spin-orbit integrals (p1 x p1) in the layout (3, n_ao, n_ao, n_ao, n_ao).
    fn soc_eri(&self) -> Result<Array5<f64>>;
}

/// Derivatives of the AO integrals w.r.t. the Cartesian coordinates of one nucleus.
/// All derivatives are complete, i.e. they include the Hellmann-Feynman part of
/// the core Hamiltonian and the contributions of all basis functions on the atom.
pub trait DerivativeIntegrals {
    /// shape (3, n_ao, n_ao)
    fn hcore_deriv(&self, atom: usize) -> Result<Array3<f64>>;
    /// shape (3, n_ao, n_ao)
    fn overlap_deriv(&self, atom: usize) -> Result<Array3<f64>>;
    /// shape (3, n_ao, n_ao, n_ao, n_ao)
    fn eri_deriv(&self, atom: usize) -> Result<Array5<f64>>;
}

/// Evaluate an origin dependent integral and check the number of components the
/// engine returned.
pub fn evaluate_rinv(ints: &dyn IntegralProvider, origin: [f64; 3], kind: RinvIntegral) -> Result<Array3<f64>> {
    let values: Array3<f64> = ints.evaluate_at(origin, kind)?;
    let n_ao: usize = ints.n_ao();
    if values.dim() != (kind.n_components(), n_ao, n_ao) {
        return Err(PropertyError::External(format!(
            "{:?} integrals with shape {:?}, expected ({}, {}, {})",
            kind,
            values.dim(),
            kind.n_components(),
            n_ao,
            n_ao
        )));
    }
    Ok(values)
}
