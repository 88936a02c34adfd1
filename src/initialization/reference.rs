use crate::error::{PropertyError, Result};
use log::warn;
use ndarray::prelude::*;

/// A quantity that exists once per spin channel.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinPair<T> {
    pub alpha: T,
    pub beta: T,
}

impl<T> SpinPair<T> {
    pub fn new(alpha: T, beta: T) -> Self {
        SpinPair { alpha, beta }
    }

    pub fn as_ref(&self) -> SpinPair<&T> {
        SpinPair {
            alpha: &self.alpha,
            beta: &self.beta,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> SpinPair<U> {
        SpinPair {
            alpha: f(self.alpha),
            beta: f(self.beta),
        }
    }

    /// Alpha first, then beta.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.alpha).chain(std::iter::once(&self.beta))
    }
}

/// A quantity with same-spin and opposite-spin blocks, e.g. a two-particle density.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinTriple<T> {
    pub aa: T,
    pub ab: T,
    pub bb: T,
}

impl<T> SpinTriple<T> {
    pub fn new(aa: T, ab: T, bb: T) -> Self {
        SpinTriple { aa, ab, bb }
    }
}

/// Converged unrestricted Hartree-Fock solution as delivered by the external SCF solver.
#[derive(Clone, Debug)]
pub struct UhfReference {
    /// MO coefficients C[ao, mo] per spin, orbitals sorted by energy
    pub mo_coeff: SpinPair<Array2<f64>>,
    /// orbital energies
    pub mo_energy: SpinPair<Array1<f64>>,
    /// occupation numbers (1.0 or 0.0)
    pub mo_occ: SpinPair<Array1<f64>>,
    /// convergence flag of the SCF
    pub converged: bool,
}

impl UhfReference {
    pub fn new(
        mo_coeff: SpinPair<Array2<f64>>,
        mo_energy: SpinPair<Array1<f64>>,
        mo_occ: SpinPair<Array1<f64>>,
        converged: bool,
    ) -> Result<Self> {
        for ((c, e), occ) in mo_coeff.iter().zip(mo_energy.iter()).zip(mo_occ.iter()) {
            if c.ncols() != e.len() || e.len() != occ.len() {
                return Err(PropertyError::Shape(format!(
                    "{} MO coefficients but {} orbital energies and {} occupations",
                    c.ncols(),
                    e.len(),
                    occ.len()
                )));
            }
            // the occupied orbitals have to come first
            let nocc: usize = occ.iter().filter(|x| **x > 0.0).count();
            if occ.iter().skip(nocc).any(|x| *x > 0.0) {
                return Err(PropertyError::Shape(String::from(
                    "occupied orbitals must precede the virtual orbitals",
                )));
            }
        }
        if !converged {
            warn!("The SCF reference is not converged, properties may be inaccurate");
        }
        Ok(UhfReference {
            mo_coeff,
            mo_energy,
            mo_occ,
            converged,
        })
    }

    pub fn n_ao(&self) -> usize {
        self.mo_coeff.alpha.nrows()
    }

    pub fn nmo(&self) -> usize {
        self.mo_coeff.alpha.ncols()
    }

    /// Number of occupied alpha and beta orbitals.
    pub fn nocc(&self) -> SpinPair<usize> {
        self.mo_occ
            .as_ref()
            .map(|occ| occ.iter().filter(|x| **x > 0.0).count())
    }

    pub fn nvir(&self) -> SpinPair<usize> {
        let nocc: SpinPair<usize> = self.nocc();
        SpinPair::new(self.nmo() - nocc.alpha, self.nmo() - nocc.beta)
    }

    /// Occupied orbital coefficients.
    pub fn orbo(&self) -> SpinPair<ArrayView2<f64>> {
        let nocc: SpinPair<usize> = self.nocc();
        SpinPair::new(
            self.mo_coeff.alpha.slice(s![.., ..nocc.alpha]),
            self.mo_coeff.beta.slice(s![.., ..nocc.beta]),
        )
    }

    /// Virtual orbital coefficients.
    pub fn orbv(&self) -> SpinPair<ArrayView2<f64>> {
        let nocc: SpinPair<usize> = self.nocc();
        SpinPair::new(
            self.mo_coeff.alpha.slice(s![.., nocc.alpha..]),
            self.mo_coeff.beta.slice(s![.., nocc.beta..]),
        )
    }

    /// AO density matrices D = C n C^T.
    pub fn make_rdm1(&self) -> SpinPair<Array2<f64>> {
        let orbo: SpinPair<ArrayView2<f64>> = self.orbo();
        orbo.map(|c| c.dot(&c.t()))
    }

    /// Spin quantum number 2S.
    pub fn spin(&self) -> usize {
        let nocc: SpinPair<usize> = self.nocc();
        (nocc.alpha as isize - nocc.beta as isize).abs() as usize
    }
}

/// Zeroth-order density matrix in the AO basis.
#[derive(Clone, Debug)]
pub enum DensityMatrix {
    /// closed-shell total density
    Restricted(Array2<f64>),
    Unrestricted(SpinPair<Array2<f64>>),
}

impl DensityMatrix {
    /// Spin density D_alpha - D_beta, `None` for a restricted density.
    pub fn spin_density(&self) -> Option<Array2<f64>> {
        match self {
            DensityMatrix::Restricted(_) => None,
            DensityMatrix::Unrestricted(dm) => Some(&dm.alpha - &dm.beta),
        }
    }
}

impl From<SpinPair<Array2<f64>>> for DensityMatrix {
    fn from(dm: SpinPair<Array2<f64>>) -> Self {
        DensityMatrix::Unrestricted(dm)
    }
}

impl From<Array2<f64>> for DensityMatrix {
    fn from(dm: Array2<f64>) -> Self {
        DensityMatrix::Restricted(dm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn reference() -> UhfReference {
        let c: Array2<f64> = Array2::eye(3);
        UhfReference::new(
            SpinPair::new(c.clone(), c),
            SpinPair::new(array![-1.0, -0.5, 0.3], array![-0.9, 0.1, 0.4]),
            SpinPair::new(array![1.0, 1.0, 0.0], array![1.0, 0.0, 0.0]),
            true,
        )
        .unwrap()
    }

    #[test]
    fn orbital_partitioning() {
        let mf: UhfReference = reference();
        assert_eq!(mf.nocc(), SpinPair::new(2, 1));
        assert_eq!(mf.nvir(), SpinPair::new(1, 2));
        assert_eq!(mf.orbo().beta.dim(), (3, 1));
        assert_eq!(mf.orbv().beta.dim(), (3, 2));
        assert_eq!(mf.spin(), 1);
        let dm: SpinPair<Array2<f64>> = mf.make_rdm1();
        assert_abs_diff_eq!(dm.alpha.diag().sum(), 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(dm.beta.diag().sum(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn occupied_orbitals_come_first() {
        let c: Array2<f64> = Array2::eye(2);
        let result = UhfReference::new(
            SpinPair::new(c.clone(), c),
            SpinPair::new(array![-1.0, 0.5], array![-1.0, 0.5]),
            SpinPair::new(array![0.0, 1.0], array![1.0, 0.0]),
            true,
        );
        assert!(matches!(result, Err(PropertyError::Shape(_))));
    }

    #[test]
    fn density_variants() {
        let dm: DensityMatrix = DensityMatrix::from(Array2::<f64>::eye(2));
        assert!(dm.spin_density().is_none());
        let udm: DensityMatrix = reference().make_rdm1().into();
        assert_abs_diff_eq!(udm.spin_density().unwrap().diag().sum(), 1.0, epsilon = 1e-14);
    }
}
