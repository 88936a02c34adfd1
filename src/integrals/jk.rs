use crate::error::Result;
use crate::initialization::SpinPair;
use crate::utils::contract;
use ndarray::prelude::*;

/// Coulomb and exchange matrices of a (not necessarily symmetric) density,
/// J_μν = Σ (μν|λσ) D_σλ and K_μσ = Σ (μν|λσ) D_νλ.
pub fn get_jk(eri: ArrayView4<f64>, dm: ArrayView2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
    let vj: Array2<f64> = contract("ijkl,lk->ij", &[&eri, &dm])?;
    let vk: Array2<f64> = contract("ijkl,jk->il", &[&eri, &dm])?;
    Ok((vj, vk))
}

/// Fock-like response potentials of an unrestricted density pair,
/// V^σ = J[D^α + D^β] - K[D^σ].
pub fn get_jk_spin(eri: ArrayView4<f64>, dm: &SpinPair<ArrayView2<f64>>) -> Result<SpinPair<Array2<f64>>> {
    let (vj_a, vk_a) = get_jk(eri, dm.alpha)?;
    let (vj_b, vk_b) = get_jk(eri, dm.beta)?;
    let vj: Array2<f64> = vj_a + vj_b;
    Ok(SpinPair::new(&vj - &vk_a, &vj - &vk_b))
}

/// Coulomb and exchange type contractions of the two-electron spin-orbit integrals
/// with the densities of both spins. The exchange part collects both electron
/// orderings of the p1 x p1 operator.
pub fn get_jk_soc(
    soc_eri: ArrayView5<f64>,
    dm: &SpinPair<Array2<f64>>,
) -> Result<(SpinPair<Array3<f64>>, SpinPair<Array3<f64>>)> {
    let coulomb = |d: &Array2<f64>| -> Result<Array3<f64>> { contract("xijkl,lk->xij", &[&soc_eri, d]) };
    let exchange = |d: &Array2<f64>| -> Result<Array3<f64>> {
        let vk: Array3<f64> = contract("xijkl,jk->xil", &[&soc_eri, d])?;
        let vk_swapped: Array3<f64> = contract("xijkl,li->xkj", &[&soc_eri, d])?;
        Ok(vk + vk_swapped)
    };
    let vj: SpinPair<Array3<f64>> = SpinPair::new(coulomb(&dm.alpha)?, coulomb(&dm.beta)?);
    let vk: SpinPair<Array3<f64>> = SpinPair::new(exchange(&dm.alpha)?, exchange(&dm.beta)?);
    Ok((vj, vk))
}
