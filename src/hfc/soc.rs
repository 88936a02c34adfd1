use crate::constants::koseki_charge;
use crate::cphf::{solve, solve_uncoupled, CphfSolution, ImaginaryKernel};
use crate::error::Result;
use crate::hfc::HyperfineCoupling;
use crate::initialization::{SpinPair, UhfReference};
use crate::integrals::{evaluate_rinv, get_jk_soc, OneElectronIntegral, RinvIntegral};
use crate::utils::transform_stack;
use log::debug;
use ndarray::prelude::*;

/// One- and two-electron spin-orbit integrals per spin block.
///
/// The one-electron operator is the imaginary part of i σ·(p V x p). The sign of σ_z
/// is included, i.e. the beta block is the negative of the alpha block. The factor 1/2
/// of the spin operator is not included.
pub fn make_h1_soc(hfc: &HyperfineCoupling, dm0: &SpinPair<Array2<f64>>) -> Result<SpinPair<Array3<f64>>> {
    let hso1e: Array3<f64> = if hfc.config.hfc.with_effective_charge() {
        let n_ao: usize = hfc.integrals.n_ao();
        let mut h: Array3<f64> = Array3::zeros((3, n_ao, n_ao));
        for atom in 0..hfc.molecule.n_atoms() {
            let z: f64 = koseki_charge(hfc.molecule.atom_charge(atom));
            let prinvxp: Array3<f64> = evaluate_rinv(hfc.integrals, hfc.molecule.atom_coord(atom), RinvIntegral::PrinvxP)?;
            h.scaled_add(-z, &prinvxp);
        }
        h
    } else {
        hfc.integrals.evaluate(OneElectronIntegral::PnucxP)?
    };
    let mut hso: SpinPair<Array3<f64>> = SpinPair::new(hso1e.clone(), -hso1e);

    if hfc.config.hfc.with_soc2e() {
        let hso2e: SpinPair<Array3<f64>> = make_h1_soc2e(hfc, dm0)?;
        hso.alpha += &hso2e.alpha;
        hso.beta += &hso2e.beta;
    }
    Ok(hso)
}

/// Mean-field two-electron spin-orbit operator of the density `dm0`, combining the
/// spin-same-orbit and the spin-other-orbit terms that are switched on.
/// The sign of the beta block is included.
pub fn make_h1_soc2e(hfc: &HyperfineCoupling, dm0: &SpinPair<Array2<f64>>) -> Result<SpinPair<Array3<f64>>> {
    let soc_eri: Array5<f64> = hfc.integrals.soc_eri()?;
    let (vj, vk) = get_jk_soc(soc_eri.view(), dm0)?;
    let dim = vj.alpha.raw_dim();
    let mut vjaa: Array3<f64> = Array3::zeros(dim.clone());
    let mut vjbb: Array3<f64> = Array3::zeros(dim.clone());
    let mut vkaa: Array3<f64> = Array3::zeros(dim.clone());
    let mut vkbb: Array3<f64> = Array3::zeros(dim);
    if hfc.config.hfc.sso {
        let vj1: Array3<f64> = &vj.alpha + &vj.beta;
        vjaa += &vj1;
        vjbb -= &vj1;
        vkaa += &vk.alpha;
        vkbb -= &vk.beta;
    }
    if hfc.config.hfc.soo {
        let vj1: Array3<f64> = &vj.alpha - &vj.beta;
        vjaa.scaled_add(2.0, &vj1);
        vjbb.scaled_add(2.0, &vj1);
        vkaa.scaled_add(2.0, &vk.alpha);
        vkbb.scaled_add(-2.0, &vk.beta);
    }
    Ok(SpinPair::new(vjaa - vkaa, vjbb - vkbb))
}

/// First-order orbital response to the spin-orbit operator (imaginary part of MO^1).
/// Without `h1` the operator of the reference density is built and projected onto the
/// virtual-occupied block.
pub fn solve_mo1_soc(hfc: &HyperfineCoupling, h1: Option<SpinPair<Array3<f64>>>) -> Result<CphfSolution> {
    let reference: &UhfReference = hfc.reference;
    let h1: SpinPair<Array3<f64>> = match h1 {
        Some(h1) => h1,
        None => {
            let hso: SpinPair<Array3<f64>> = make_h1_soc(hfc, &reference.make_rdm1())?;
            let orbo: SpinPair<ArrayView2<f64>> = reference.orbo();
            let orbv: SpinPair<ArrayView2<f64>> = reference.orbv();
            SpinPair::new(
                transform_stack(hso.alpha.view(), orbv.alpha, orbo.alpha),
                transform_stack(hso.beta.view(), orbv.beta, orbo.beta),
            )
        }
    };
    if hfc.config.hfc.cphf {
        debug!("spin-orbit response from the coupled equations");
        let eri: Array4<f64> = hfc.integrals.eri();
        let kernel: ImaginaryKernel = ImaginaryKernel::new(eri.view(), reference);
        solve(&kernel, &reference.mo_energy, &reference.mo_occ, &h1, &hfc.config.cphf)
    } else {
        solve_uncoupled(&reference.mo_energy, &reference.mo_occ, &h1)
    }
}
