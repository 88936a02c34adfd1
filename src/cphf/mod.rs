//! Coupled-perturbed Hartree-Fock equations of an unrestricted reference.
//!
//! For a perturbation with virtual-occupied matrix elements h1[σ][c,a,i] the first
//! order orbital rotations x solve
//!
//!   (ε_a - ε_i + shift) x_ai + G[x]_ai = -h1_ai
//!
//! where the two-electron response G is supplied by a `ResponseKernel`.
use crate::defaults::KRYLOV_EXPANSION_THRESHOLD;
use crate::error::{PropertyError, Result};
use crate::initialization::SpinPair;
use crate::io::settings::CphfConfig;
use crate::utils::Timer;
use log::info;
use ndarray::prelude::*;

pub mod kernels;
pub mod krylov;

pub use kernels::{ImaginaryKernel, RealKernel};
pub use krylov::{krylov_solve, KrylovSolution};

/// Two-electron part of the orbital Hessian acting on response amplitudes.
pub trait ResponseKernel {
    /// `x[σ]` has the shape (n_components, n_vir, n_occ); the result has the same shape.
    fn apply(&self, x: &SpinPair<Array3<f64>>) -> Result<SpinPair<Array3<f64>>>;
}

/// First-order response of the orbitals.
#[derive(Clone, Debug)]
pub struct CphfSolution {
    /// orbital rotations per spin, (n_components, n_vir, n_occ)
    pub mo1: SpinPair<Array3<f64>>,
    /// first-order orbital energies, only defined for perturbations that change the overlap
    pub mo_e1: Option<SpinPair<Array3<f64>>>,
    pub converged: bool,
    pub iterations: usize,
}

/// Sizes of the occupied and virtual spaces and the orbital-energy gaps ε_a - ε_i.
struct ResponseSpace {
    nocc: SpinPair<usize>,
    nvir: SpinPair<usize>,
    gaps: SpinPair<Array2<f64>>,
}

impl ResponseSpace {
    fn new(mo_energy: &SpinPair<Array1<f64>>, mo_occ: &SpinPair<Array1<f64>>) -> Result<Self> {
        let nocc: SpinPair<usize> = mo_occ.as_ref().map(|occ| occ.iter().filter(|x| **x > 0.0).count());
        let nmo: SpinPair<usize> = mo_occ.as_ref().map(|occ| occ.len());
        if mo_energy.alpha.len() != nmo.alpha || mo_energy.beta.len() != nmo.beta {
            return Err(PropertyError::Shape(String::from(
                "orbital energies and occupations differ in length",
            )));
        }
        let gap = |e: &Array1<f64>, no: usize| -> Array2<f64> {
            Array2::from_shape_fn((e.len() - no, no), |(a, i)| e[no + a] - e[i])
        };
        Ok(ResponseSpace {
            gaps: SpinPair::new(gap(&mo_energy.alpha, nocc.alpha), gap(&mo_energy.beta, nocc.beta)),
            nvir: SpinPair::new(nmo.alpha - nocc.alpha, nmo.beta - nocc.beta),
            nocc,
        })
    }

    fn dim_alpha(&self) -> usize {
        self.nvir.alpha * self.nocc.alpha
    }

    fn dim(&self) -> usize {
        self.dim_alpha() + self.nvir.beta * self.nocc.beta
    }

    fn check(&self, h1: &SpinPair<Array3<f64>>) -> Result<usize> {
        let (nc, va, oa) = h1.alpha.dim();
        let (ncb, vb, ob) = h1.beta.dim();
        if nc != ncb || (va, oa) != (self.nvir.alpha, self.nocc.alpha) || (vb, ob) != (self.nvir.beta, self.nocc.beta)
        {
            return Err(PropertyError::Shape(format!(
                "perturbation blocks {:?} and {:?} do not match the virtual-occupied spaces",
                h1.alpha.dim(),
                h1.beta.dim()
            )));
        }
        Ok(nc)
    }

    /// Columns are components, rows the alpha then beta rotations.
    fn pack(&self, x: &SpinPair<Array3<f64>>) -> Array2<f64> {
        let nc: usize = x.alpha.dim().0;
        let mut packed: Array2<f64> = Array2::zeros((self.dim(), nc));
        for c in 0..nc {
            let alpha = x.alpha.slice(s![c, .., ..]);
            let beta = x.beta.slice(s![c, .., ..]);
            let mut column = packed.column_mut(c);
            for (dst, src) in column.iter_mut().zip(alpha.iter().chain(beta.iter())) {
                *dst = *src;
            }
        }
        packed
    }

    fn unpack(&self, packed: ArrayView2<f64>) -> SpinPair<Array3<f64>> {
        let nc: usize = packed.ncols();
        let na: usize = self.dim_alpha();
        let (va, oa) = (self.nvir.alpha, self.nocc.alpha);
        let (vb, ob) = (self.nvir.beta, self.nocc.beta);
        SpinPair::new(
            Array3::from_shape_fn((nc, va, oa), |(c, a, i)| packed[[a * oa + i, c]]),
            Array3::from_shape_fn((nc, vb, ob), |(c, a, i)| packed[[na + a * ob + i, c]]),
        )
    }

    fn packed_gaps(&self, shift: f64) -> Array1<f64> {
        self.gaps
            .alpha
            .iter()
            .chain(self.gaps.beta.iter())
            .map(|d| d + shift)
            .collect()
    }
}

/// Uncoupled response mo1 = -h1 / (ε_a - ε_i).
pub fn solve_uncoupled(
    mo_energy: &SpinPair<Array1<f64>>,
    mo_occ: &SpinPair<Array1<f64>>,
    h1: &SpinPair<Array3<f64>>,
) -> Result<CphfSolution> {
    let space: ResponseSpace = ResponseSpace::new(mo_energy, mo_occ)?;
    space.check(h1)?;
    let divide = |h: &Array3<f64>, gap: &Array2<f64>| -> Array3<f64> {
        let mut mo1: Array3<f64> = -h;
        for mut component in mo1.outer_iter_mut() {
            component /= gap;
        }
        mo1
    };
    Ok(CphfSolution {
        mo1: SpinPair::new(
            divide(&h1.alpha, &space.gaps.alpha),
            divide(&h1.beta, &space.gaps.beta),
        ),
        mo_e1: None,
        converged: true,
        iterations: 0,
    })
}

/// Solve the coupled equations with a Krylov subspace method. Non-convergence is
/// logged and reported through `CphfSolution::converged`.
pub fn solve(
    kernel: &dyn ResponseKernel,
    mo_energy: &SpinPair<Array1<f64>>,
    mo_occ: &SpinPair<Array1<f64>>,
    h1: &SpinPair<Array3<f64>>,
    config: &CphfConfig,
) -> Result<CphfSolution> {
    config.validate()?;
    let timer: Timer = Timer::start();
    let space: ResponseSpace = ResponseSpace::new(mo_energy, mo_occ)?;
    space.check(h1)?;

    let rhs: Array2<f64> = -space.pack(h1);
    let diag: Array1<f64> = space.packed_gaps(config.level_shift);
    let apply = |v: ArrayView2<f64>| -> Result<Array2<f64>> {
        let x: SpinPair<Array3<f64>> = space.unpack(v);
        let gx: Array2<f64> = space.pack(&kernel.apply(&x)?);
        let mut mv: Array2<f64> = v.to_owned();
        for mut column in mv.axis_iter_mut(Axis(1)) {
            column *= &diag;
        }
        Ok(mv + gx)
    };
    let solution: KrylovSolution = krylov_solve(
        apply,
        diag.view(),
        rhs.view(),
        config.conv_tol,
        config.max_cycle,
        KRYLOV_EXPANSION_THRESHOLD,
    )?;
    info!(
        "{:<25} {} iterations, converged: {}",
        "CPHF solve", solution.iterations, solution.converged
    );
    info!("{}", timer);
    Ok(CphfSolution {
        mo1: space.unpack(solution.x.view()),
        mo_e1: None,
        converged: solution.converged,
        iterations: solution.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tests::{random_array, ModelSystem};
    use approx::assert_abs_diff_eq;

    struct NoCoupling;

    impl ResponseKernel for NoCoupling {
        fn apply(&self, x: &SpinPair<Array3<f64>>) -> Result<SpinPair<Array3<f64>>> {
            Ok(x.as_ref().map(|x| Array3::zeros(x.raw_dim())))
        }
    }

    fn perturbation(model: &ModelSystem, n: usize, seed: u64) -> SpinPair<Array3<f64>> {
        let nocc: SpinPair<usize> = model.reference.nocc();
        let nvir: SpinPair<usize> = model.reference.nvir();
        SpinPair::new(
            random_array((n, nvir.alpha, nocc.alpha), seed).into_dimensionality().unwrap(),
            random_array((n, nvir.beta, nocc.beta), seed + 1).into_dimensionality().unwrap(),
        )
    }

    #[test]
    fn uncoupled_limit_is_reproduced() {
        let model: ModelSystem = ModelSystem::new(5, 3, 2, 71);
        let mf = &model.reference;
        let h1: SpinPair<Array3<f64>> = perturbation(&model, 3, 2);
        let coupled: CphfSolution =
            solve(&NoCoupling, &mf.mo_energy, &mf.mo_occ, &h1, &CphfConfig::default()).unwrap();
        let uncoupled: CphfSolution = solve_uncoupled(&mf.mo_energy, &mf.mo_occ, &h1).unwrap();
        assert!(coupled.converged);
        assert!(coupled.mo_e1.is_none());
        assert_abs_diff_eq!(coupled.mo1.alpha, uncoupled.mo1.alpha, epsilon = 1e-8);
        assert_abs_diff_eq!(coupled.mo1.beta, uncoupled.mo1.beta, epsilon = 1e-8);
        // mo1 = -h1 / (e_a - e_i)
        let (e, no) = (&mf.mo_energy.beta, 2);
        assert_abs_diff_eq!(
            uncoupled.mo1.beta[[1, 0, 1]],
            -h1.beta[[1, 0, 1]] / (e[no] - e[1]),
            epsilon = 1e-14
        );
    }

    #[test]
    fn coupled_solution_satisfies_the_equations() {
        let _ = env_logger::builder().is_test(true).try_init();
        let model: ModelSystem = ModelSystem::new(5, 3, 2, 73);
        let mf = &model.reference;
        let eri: Array4<f64> = model.integrals.eri.clone();
        let h1: SpinPair<Array3<f64>> = perturbation(&model, 2, 7);
        let imaginary: ImaginaryKernel = ImaginaryKernel::new(eri.view(), mf);
        let real: RealKernel = RealKernel::new(eri.view(), mf);
        let kernels: [&dyn ResponseKernel; 2] = [&imaginary, &real];
        for kernel in kernels.iter() {
            let solution: CphfSolution =
                solve(*kernel, &mf.mo_energy, &mf.mo_occ, &h1, &CphfConfig::default()).unwrap();
            assert!(solution.converged);
            let g: SpinPair<Array3<f64>> = kernel.apply(&solution.mo1).unwrap();
            let space: ResponseSpace = ResponseSpace::new(&mf.mo_energy, &mf.mo_occ).unwrap();
            for (((x, gx), h), gap) in solution
                .mo1
                .iter()
                .zip(g.iter())
                .zip(h1.iter())
                .zip(space.gaps.iter())
            {
                for c in 0..2 {
                    let lhs: Array2<f64> = &x.slice(s![c, .., ..]) * gap + gx.slice(s![c, .., ..]);
                    assert_abs_diff_eq!(lhs, -&h.slice(s![c, .., ..]), epsilon = 1e-8);
                }
            }
        }
    }

    #[test]
    fn zero_perturbation_gives_zero_response() {
        let model: ModelSystem = ModelSystem::new(4, 2, 1, 79);
        let mf = &model.reference;
        let h1: SpinPair<Array3<f64>> = SpinPair::new(Array3::zeros((3, 2, 2)), Array3::zeros((3, 3, 1)));
        let kernel: ImaginaryKernel = ImaginaryKernel::new(model.integrals.eri.view(), mf);
        let solution: CphfSolution =
            solve(&kernel, &mf.mo_energy, &mf.mo_occ, &h1, &CphfConfig::default()).unwrap();
        assert!(solution.mo1.alpha.iter().chain(solution.mo1.beta.iter()).all(|x| *x == 0.0));
    }

    #[test]
    fn mismatched_perturbation_is_rejected() {
        let model: ModelSystem = ModelSystem::new(4, 2, 1, 79);
        let mf = &model.reference;
        let h1: SpinPair<Array3<f64>> = SpinPair::new(Array3::zeros((3, 2, 2)), Array3::zeros((3, 2, 2)));
        assert!(matches!(
            solve_uncoupled(&mf.mo_energy, &mf.mo_occ, &h1),
            Err(PropertyError::Shape(_))
        ));
    }
}
