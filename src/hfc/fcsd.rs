use crate::error::Result;
use crate::hfc::report::{align, write_tensor};
use crate::hfc::HyperfineCoupling;
use crate::initialization::DensityMatrix;
use crate::integrals::{evaluate_rinv, RinvIntegral};
use crate::utils::{contract, reshaped};
use log::info;
use ndarray::prelude::*;
use std::f64::consts::PI;

/// Fermi-contact and spin-dipole contribution to the hyperfine tensors of `nuclei`,
/// in MHz. A restricted density has no spin density and gives zero tensors.
pub fn make_fcsd(hfc: &HyperfineCoupling, dm0: &DensityMatrix, nuclei: &[usize]) -> Result<Array3<f64>> {
    let mut tensors: Array3<f64> = Array3::zeros((nuclei.len(), 3, 3));
    let spindm: Array2<f64> = match dm0.spin_density() {
        Some(spindm) => spindm,
        None => return Ok(tensors),
    };
    let fac: f64 = hfc.fcsd_factor()?;
    let n_ao: usize = spindm.nrows();
    let coords: Array2<f64> = hfc.molecule.atom_coords();
    let ao: Array2<f64> = hfc.integrals.ao_values(coords.view())?;

    for (mut tensor, atom) in tensors.outer_iter_mut().zip(nuclei.iter()) {
        let nuc_gyro: f64 = hfc.nuc_gyro(*atom)?;
        // imaginary part of <σ (r/r^3 x p)> with the nucleus as origin
        let a01p: Array3<f64> = evaluate_rinv(hfc.integrals, hfc.molecule.atom_coord(*atom), RinvIntegral::Sa01sp)?;
        let a01p: Array4<f64> = reshaped(&a01p, (3, 4, n_ao, n_ao))?;
        let a01p = a01p.slice(s![.., ..3, .., ..]);
        let h1: Array4<f64> = -(&a01p + &a01p.permuted_axes([0, 1, 3, 2]));
        let fcsd: Array2<f64> = contract("xyij,ji->xy", &[&h1, &spindm])?;

        let ao_atom = ao.row(*atom);
        let fc: f64 = 8.0 * PI / 3.0 * ao_atom.dot(&spindm.dot(&ao_atom));
        let sd: Array2<f64> = &fcsd - &(Array2::<f64>::eye(3) * fc);

        let scale: f64 = fac * nuc_gyro;
        info!(
            "FC of atom {} {} (in MHz) {:>14.6}",
            atom,
            hfc.molecule.atom_symbol(*atom),
            scale * fc
        );
        let (sd_aligned, _) = align((scale * &sd).view())?;
        write_tensor(sd_aligned.view(), &format!("SD of atom {} (in MHz)", atom));
        tensor.assign(&(scale * &fcsd));
    }
    Ok(tensors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::SpinPair;
    use crate::io::settings::Configuration;
    use crate::utils::tests::ModelSystem;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equal_spin_densities_give_zero() {
        let model: ModelSystem = ModelSystem::new(4, 2, 1, 157);
        let config: Configuration = Configuration::default();
        let hfc: HyperfineCoupling = HyperfineCoupling::new(&model.molecule, &model.integrals, &model.reference, &config);
        let dm: Array2<f64> = model.reference.make_rdm1().alpha;
        let dm0: DensityMatrix = DensityMatrix::from(SpinPair::new(dm.clone(), dm));
        let tensors: Array3<f64> = make_fcsd(&hfc, &dm0, &[0, 1, 2]).unwrap();
        assert_eq!(tensors.dim(), (3, 3, 3));
        assert!(tensors.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn restricted_density_gives_zero() {
        let model: ModelSystem = ModelSystem::new(4, 2, 1, 157);
        let config: Configuration = Configuration::default();
        let hfc: HyperfineCoupling = HyperfineCoupling::new(&model.molecule, &model.integrals, &model.reference, &config);
        let dm0: DensityMatrix = DensityMatrix::from(Array2::<f64>::eye(4));
        let tensors: Array3<f64> = make_fcsd(&hfc, &dm0, &[1, 0]).unwrap();
        assert_eq!(tensors, Array3::<f64>::zeros((2, 3, 3)));
    }

    #[test]
    fn spin_dipole_part_is_traceless() {
        let _ = env_logger::builder().is_test(true).try_init();
        let model: ModelSystem = ModelSystem::new(5, 3, 1, 163);
        let config: Configuration = Configuration::default();
        let hfc: HyperfineCoupling = HyperfineCoupling::new(&model.molecule, &model.integrals, &model.reference, &config);
        let dm0: DensityMatrix = DensityMatrix::from(model.reference.make_rdm1());
        let spindm: Array2<f64> = dm0.spin_density().unwrap();
        let tensors: Array3<f64> = make_fcsd(&hfc, &dm0, &[2]).unwrap();

        // the isotropic part of the FCSD tensor is the Fermi-contact term
        let coords: Array2<f64> = model.molecule.atom_coords();
        let ao: Array2<f64> = hfc.integrals.ao_values(coords.view()).unwrap();
        let fc: f64 = 8.0 * PI / 3.0 * ao.row(2).dot(&spindm.dot(&ao.row(2)));
        let scale: f64 = hfc.fcsd_factor().unwrap() * hfc.nuc_gyro(2).unwrap();
        let sd: Array2<f64> = &tensors.slice(s![0, .., ..]) - &(Array2::<f64>::eye(3) * (scale * fc));
        assert!(fc.abs() > 1e-6);
        assert_abs_diff_eq!(sd.diag().sum(), 0.0, epsilon = 1e-8 * scale.abs());
    }
}
