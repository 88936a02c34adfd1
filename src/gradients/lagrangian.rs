use crate::cc::MoIntegrals;
use crate::cphf::{solve, CphfSolution, RealKernel};
use crate::error::Result;
use crate::initialization::{SpinPair, SpinTriple, UhfReference};
use crate::integrals::{get_jk_spin, transform_eri, DerivativeIntegrals};
use crate::io::settings::CphfConfig;
use crate::utils::{contract, symmetrize};
use log::warn;
use ndarray::prelude::*;

/// Generalized Fock matrices of a correlated state,
/// X_pq = Σ_r h_pr γ_qr + Σ_rst (pr|st) Γ_qrst, with the opposite-spin block
/// entering both spins.
pub fn generalized_fock(
    eris: &MoIntegrals,
    dm1: &SpinPair<Array2<f64>>,
    dm2: &SpinTriple<Array4<f64>>,
) -> Result<SpinPair<Array2<f64>>> {
    let xa: Array2<f64> = contract::<Ix2>("pr,qr->pq", &[&eris.hcore.alpha, &dm1.alpha])?
        + contract::<Ix2>("prst,qrst->pq", &[&eris.eri.aa, &dm2.aa])?
        + contract::<Ix2>("prst,qrst->pq", &[&eris.eri.ab, &dm2.ab])?;
    let xb: Array2<f64> = contract::<Ix2>("pr,qr->pq", &[&eris.hcore.beta, &dm1.beta])?
        + contract::<Ix2>("prst,qrst->pq", &[&eris.eri.bb, &dm2.bb])?
        + contract::<Ix2>("stpr,stqr->pq", &[&eris.eri.ab, &dm2.ab])?;
    Ok(SpinPair::new(xa, xb))
}

/// Lagrange multipliers of the Hartree-Fock conditions (z-vector).
#[derive(Clone, Debug)]
pub struct OrbitalRelaxation {
    /// z_ai per spin, (n_vir, n_occ)
    pub z: SpinPair<Array2<f64>>,
    pub converged: bool,
}

/// Solve (ε_a - ε_i) z_ai + G[z]_ai = -2 (X_ai - X_ia).
pub fn solve_zvector<'a>(
    reference: &'a UhfReference,
    eri_ao: ArrayView4<'a, f64>,
    x: &SpinPair<Array2<f64>>,
    config: &CphfConfig,
) -> Result<OrbitalRelaxation> {
    let nocc: SpinPair<usize> = reference.nocc();
    let rhs = |x: &Array2<f64>, no: usize| -> Array3<f64> {
        let x_vo = x.slice(s![no.., ..no]);
        let x_ov = x.slice(s![..no, no..]);
        (2.0 * (&x_vo - &x_ov.t())).insert_axis(Axis(0))
    };
    let h1: SpinPair<Array3<f64>> = SpinPair::new(rhs(&x.alpha, nocc.alpha), rhs(&x.beta, nocc.beta));
    let kernel: RealKernel<'a> = RealKernel::new(eri_ao, reference);
    let solution: CphfSolution = solve(&kernel, &reference.mo_energy, &reference.mo_occ, &h1, config)?;
    if !solution.converged {
        warn!("The orbital relaxation equations are not converged, the gradient may be inaccurate");
    }
    Ok(OrbitalRelaxation {
        z: solution.mo1.map(|z| z.index_axis_move(Axis(0), 0)),
        converged: solution.converged,
    })
}

/// Densities in the AO basis that are contracted with the derivative integrals.
#[derive(Clone, Debug)]
pub struct RelaxedDensities {
    /// relaxed one-particle density per spin
    pub gamma: SpinPair<Array2<f64>>,
    /// C_v z C_o^T + h.c. per spin
    pub dz: SpinPair<Array2<f64>>,
    /// energy-weighted density, summed over spins
    pub w: Array2<f64>,
    /// ½ Γaa + Γab + ½ Γbb in the AO basis
    pub gamma2: Array4<f64>,
}

/// Relaxed one-particle density, energy-weighted density and the two-particle density
/// in the AO basis.
pub fn relaxed_densities(
    reference: &UhfReference,
    eri_ao: ArrayView4<f64>,
    dm1: &SpinPair<Array2<f64>>,
    dm2: &SpinTriple<Array4<f64>>,
    x: &SpinPair<Array2<f64>>,
    relaxation: &OrbitalRelaxation,
) -> Result<RelaxedDensities> {
    let nocc: SpinPair<usize> = reference.nocc();
    let orbo: SpinPair<ArrayView2<f64>> = reference.orbo();
    let orbv: SpinPair<ArrayView2<f64>> = reference.orbv();
    let c: SpinPair<ArrayView2<f64>> = reference.mo_coeff.as_ref().map(|c| c.view());

    let dz_spin = |z: &Array2<f64>, co: ArrayView2<f64>, cv: ArrayView2<f64>| -> Array2<f64> {
        let d: Array2<f64> = cv.dot(z).dot(&co.t());
        &d + &d.t()
    };
    let dz: SpinPair<Array2<f64>> = SpinPair::new(
        dz_spin(&relaxation.z.alpha, orbo.alpha, orbv.alpha),
        dz_spin(&relaxation.z.beta, orbo.beta, orbv.beta),
    );
    let gamma: SpinPair<Array2<f64>> = SpinPair::new(
        c.alpha.dot(&dm1.alpha).dot(&c.alpha.t()) + 0.5 * &dz.alpha,
        c.beta.dot(&dm1.beta).dot(&c.beta.t()) + 0.5 * &dz.beta,
    );

    // response of the Fock matrix to the z-vector density
    let vz: SpinPair<Array2<f64>> = get_jk_spin(eri_ao, &SpinPair::new(dz.alpha.view(), dz.beta.view()))?;
    let w_spin = |x: &Array2<f64>,
                  vz: &Array2<f64>,
                  z: &Array2<f64>,
                  c: ArrayView2<f64>,
                  e: &Array1<f64>,
                  no: usize|
     -> Array2<f64> {
        let mut w: Array2<f64> = symmetrize(x.view());
        let v: Array2<f64> = c.t().dot(vz).dot(&c);
        let mut w_oo = w.slice_mut(s![..no, ..no]);
        w_oo += &(0.5 * &v.slice(s![..no, ..no]));
        let w_vo: Array2<f64> = Array2::from_shape_fn(z.raw_dim(), |(a, i)| {
            0.25 * v[[no + a, i]] + 0.25 * z[[a, i]] * (e[no + a] + e[i])
        });
        let mut block = w.slice_mut(s![no.., ..no]);
        block += &w_vo;
        let mut block = w.slice_mut(s![..no, no..]);
        block += &w_vo.t();
        c.dot(&w).dot(&c.t())
    };
    let w: Array2<f64> = w_spin(
        &x.alpha,
        &vz.alpha,
        &relaxation.z.alpha,
        c.alpha,
        &reference.mo_energy.alpha,
        nocc.alpha,
    ) + w_spin(
        &x.beta,
        &vz.beta,
        &relaxation.z.beta,
        c.beta,
        &reference.mo_energy.beta,
        nocc.beta,
    );

    let ct: SpinPair<ArrayView2<f64>> = SpinPair::new(c.alpha.t(), c.beta.t());
    let gamma2: Array4<f64> = 0.5 * transform_eri(dm2.aa.view(), ct.alpha, ct.alpha, ct.alpha, ct.alpha)?
        + transform_eri(dm2.ab.view(), ct.alpha, ct.alpha, ct.beta, ct.beta)?
        + 0.5 * transform_eri(dm2.bb.view(), ct.beta, ct.beta, ct.beta, ct.beta)?;

    Ok(RelaxedDensities { gamma, dz, w, gamma2 })
}

/// Electronic gradient of one atom: h^x γ + (μν|λσ)^x Γ - S^x W and the response of the
/// reference Fock matrix contracted with the z-vector density.
pub fn atom_gradient(
    derivatives: &dyn DerivativeIntegrals,
    atom: usize,
    densities: &RelaxedDensities,
    dm_ref: &SpinPair<Array2<f64>>,
) -> Result<Array1<f64>> {
    let h1: Array3<f64> = derivatives.hcore_deriv(atom)?;
    let s1: Array3<f64> = derivatives.overlap_deriv(atom)?;
    let eri1: Array5<f64> = derivatives.eri_deriv(atom)?;
    let gamma_tot: Array2<f64> = &densities.gamma.alpha + &densities.gamma.beta;

    let mut grad: Array1<f64> = Array1::zeros(3);
    for (xyz, g) in grad.iter_mut().enumerate() {
        let eri_x: ArrayView4<f64> = eri1.index_axis(Axis(0), xyz);
        let vhf_x: SpinPair<Array2<f64>> =
            get_jk_spin(eri_x, &SpinPair::new(dm_ref.alpha.view(), dm_ref.beta.view()))?;
        *g = (&h1.index_axis(Axis(0), xyz) * &gamma_tot).sum()
            + (&eri_x * &densities.gamma2).sum()
            - (&s1.index_axis(Axis(0), xyz) * &densities.w).sum()
            + 0.5 * (&densities.dz.alpha * &vhf_x.alpha).sum()
            + 0.5 * (&densities.dz.beta * &vhf_x.beta).sum();
    }
    Ok(grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cc::ResolvedAmplitudes;
    use crate::cphf::ResponseKernel;
    use crate::rdm::{make_rdms, CorrelatedDensities};
    use crate::utils::tests::ModelSystem;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reference_generalized_fock_is_the_orbital_energy() {
        let model: ModelSystem = ModelSystem::new(5, 3, 2, 83);
        let cc: ResolvedAmplitudes = model.resolved(0.0, 1);
        let d: CorrelatedDensities = make_rdms(&cc, false, true, &std::env::temp_dir()).unwrap();
        let x: SpinPair<Array2<f64>> = generalized_fock(&cc.eris, &d.dm1, &d.dm2).unwrap();
        let nocc: SpinPair<usize> = cc.reference.nocc();
        let mut expected: Array2<f64> = Array2::zeros((5, 5));
        for i in 0..nocc.beta {
            expected[[i, i]] = cc.reference.mo_energy.beta[i];
        }
        assert_abs_diff_eq!(x.beta, expected, epsilon = 1e-8);
        // the Hartree-Fock conditions need no relaxation
        let relaxation: OrbitalRelaxation =
            solve_zvector(&cc.reference, model.integrals.eri.view(), &x, &CphfConfig::default()).unwrap();
        assert!(relaxation.converged);
        assert!(relaxation.z.alpha.iter().all(|z| z.abs() < 1e-7));
    }

    #[test]
    fn zvector_solves_the_relaxation_equations() {
        let model: ModelSystem = ModelSystem::new(5, 3, 2, 89);
        let cc: ResolvedAmplitudes = model.resolved(0.1, 4);
        let d: CorrelatedDensities = make_rdms(&cc, true, true, &std::env::temp_dir()).unwrap();
        let x: SpinPair<Array2<f64>> = generalized_fock(&cc.eris, &d.dm1, &d.dm2).unwrap();
        let mut config: CphfConfig = CphfConfig::default();
        config.conv_tol = 1e-10;
        let relaxation: OrbitalRelaxation =
            solve_zvector(&cc.reference, model.integrals.eri.view(), &x, &config).unwrap();
        assert!(relaxation.converged);

        // (e_a - e_i) z + G[z] = -2 (X_vo - X_ov^T)
        let kernel: RealKernel = RealKernel::new(model.integrals.eri.view(), &cc.reference);
        let z3: SpinPair<Array3<f64>> = relaxation.z.clone().map(|z| z.insert_axis(Axis(0)));
        let gz: SpinPair<Array3<f64>> = kernel.apply(&z3).unwrap();
        let (no, e) = (3, &cc.reference.mo_energy.alpha);
        let lhs: Array2<f64> = Array2::from_shape_fn((2, 3), |(a, i)| {
            (e[no + a] - e[i]) * relaxation.z.alpha[[a, i]] + gz.alpha[[0, a, i]]
        });
        let rhs: Array2<f64> = Array2::from_shape_fn((2, 3), |(a, i)| {
            -2.0 * (x.alpha[[no + a, i]] - x.alpha[[i, no + a]])
        });
        assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-8);
    }
}
