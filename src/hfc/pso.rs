use crate::cphf::CphfSolution;
use crate::error::Result;
use crate::hfc::report::{align, write_tensor};
use crate::hfc::soc::solve_mo1_soc;
use crate::hfc::HyperfineCoupling;
use crate::initialization::SpinPair;
use crate::integrals::{evaluate_rinv, RinvIntegral};
use crate::utils::{antisymmetrize, contract};
use ndarray::prelude::*;

/// C_v mo1 C_o^T for every component.
fn dm1_mo2ao(mo1: ArrayView3<f64>, orbv: ArrayView2<f64>, orbo: ArrayView2<f64>) -> Array3<f64> {
    let mut dm1: Array3<f64> = Array3::zeros((mo1.dim().0, orbv.nrows(), orbo.nrows()));
    for (mut d, x) in dm1.outer_iter_mut().zip(mo1.outer_iter()) {
        d.assign(&orbv.dot(&x).dot(&orbo.t()));
    }
    dm1
}

/// Paramagnetic spin-orbit contribution to the hyperfine tensors, in MHz.
pub fn make_pso_soc(hfc: &HyperfineCoupling, nuclei: &[usize]) -> Result<Array3<f64>> {
    let solution: CphfSolution = solve_mo1_soc(hfc, None)?;
    pso_from_mo1(hfc, &solution.mo1, nuclei)
}

/// The PSO tensors for a given spin-orbit response. The sign of the beta block is
/// carried by the response itself.
pub fn pso_from_mo1(hfc: &HyperfineCoupling, mo1: &SpinPair<Array3<f64>>, nuclei: &[usize]) -> Result<Array3<f64>> {
    let fac: f64 = hfc.pso_factor()?;
    let orbo: SpinPair<ArrayView2<f64>> = hfc.reference.orbo();
    let orbv: SpinPair<ArrayView2<f64>> = hfc.reference.orbv();
    let dm1: Array3<f64> = dm1_mo2ao(mo1.alpha.view(), orbv.alpha, orbo.alpha)
        + dm1_mo2ao(mo1.beta.view(), orbv.beta, orbo.beta);
    let dm1: Array3<f64> = &dm1 - &dm1.view().permuted_axes([0, 2, 1]);

    let mut tensors: Array3<f64> = Array3::zeros((nuclei.len(), 3, 3));
    for (mut tensor, atom) in tensors.outer_iter_mut().zip(nuclei.iter()) {
        let nuc_gyro: f64 = hfc.nuc_gyro(*atom)?;
        // Im[r/r^3 x p] = -p (1/r) x p
        let prinvxp: Array3<f64> = evaluate_rinv(hfc.integrals, hfc.molecule.atom_coord(*atom), RinvIntegral::PrinvxP)?;
        let mut h1ao: Array3<f64> = Array3::zeros(prinvxp.raw_dim());
        for (mut h, p) in h1ao.outer_iter_mut().zip(prinvxp.outer_iter()) {
            h.assign(&(-antisymmetrize(p)));
        }
        let de: Array2<f64> = fac * nuc_gyro * contract::<Ix2>("xij,yij->xy", &[&h1ao, &dm1])?;
        let (de_aligned, _) = align(de.view())?;
        write_tensor(de_aligned.view(), &format!("PSO of atom {} (in MHz)", atom));
        tensor.assign(&de);
    }
    Ok(tensors)
}
