use crate::cc::{MoIntegrals, SpinOrbitalSpace};
use crate::error::Result;
use crate::initialization::{SpinPair, SpinTriple};
use crate::rdm::gamma1::Gamma1;
use crate::rdm::gamma2::Gamma2;
use itertools::iproduct;
use ndarray::prelude::*;

/// Spin-orbital one-particle density dm1[p,q] = <q^+ p> including the reference.
pub fn make_rdm1_so(space: &SpinOrbitalSpace, d1: &Gamma1) -> Array2<f64> {
    let (no, n): (usize, usize) = (space.n_occ(), space.n_so());
    let mut dm1: Array2<f64> = Array2::zeros((n, n));
    let doo: Array2<f64> = 0.5 * (&d1.doo + &d1.doo.t());
    let dov: Array2<f64> = 0.5 * (&d1.dov + &d1.dvo.t());
    let dvv: Array2<f64> = 0.5 * (&d1.dvv + &d1.dvv.t());
    dm1.slice_mut(s![..no, ..no]).assign(&doo);
    dm1.slice_mut(s![..no, no..]).assign(&dov);
    dm1.slice_mut(s![no.., ..no]).assign(&dov.t());
    dm1.slice_mut(s![no.., no..]).assign(&dvv);
    for i in 0..no {
        dm1[[i, i]] += 1.0;
    }
    dm1
}

/// The alpha and beta one-particle densities in the MO basis.
pub fn make_rdm1(space: &SpinOrbitalSpace, d1: &Gamma1) -> SpinPair<Array2<f64>> {
    space.split_one(make_rdm1_so(space, d1).view())
}

// signed permutations that map the two-particle density onto itself
const PAIR_SYMMETRY: [([usize; 4], f64); 8] = [
    ([0, 1, 2, 3], 1.0),
    ([2, 3, 0, 1], 1.0),
    ([1, 0, 3, 2], 1.0),
    ([3, 2, 1, 0], 1.0),
    ([2, 1, 0, 3], -1.0),
    ([0, 3, 2, 1], -1.0),
    ([1, 2, 3, 0], -1.0),
    ([3, 0, 1, 2], -1.0),
];

/// Average over the permutations that leave the density invariant. This removes
/// the asymmetry of the non-variational contributions.
fn project_pair_symmetry(dm2: &Array4<f64>) -> Array4<f64> {
    let mut projected: Array4<f64> = Array4::zeros(dm2.raw_dim());
    for (axes, sign) in PAIR_SYMMETRY.iter() {
        projected.scaled_add(*sign, &dm2.view().permuted_axes(*axes));
    }
    projected / 8.0
}

/// Spin-orbital two-particle density in chemists' ordering,
/// dm2[p,q,r,s] = <p^+ r^+ s q>, including the reference contribution.
pub fn make_rdm2_so(space: &SpinOrbitalSpace, d1: &Gamma1, d2: &Gamma2) -> Array4<f64> {
    let (no, n): (usize, usize) = (space.n_occ(), space.n_so());
    let mut dm2: Array4<f64> = Array4::zeros((n, n, n, n));
    let tr = |x: &Array4<f64>, axes: [usize; 4]| -> Array4<f64> { x.view().permuted_axes(axes).to_owned() };

    dm2.slice_mut(s![..no, no.., ..no, no..]).assign(&d2.dovov);
    dm2.slice_mut(s![no.., ..no, no.., ..no]).assign(&tr(&d2.dovov, [1, 0, 3, 2]));

    dm2.slice_mut(s![..no, ..no, no.., no..]).assign(&(-tr(&d2.dovvo, [0, 3, 2, 1])));
    dm2.slice_mut(s![no.., no.., ..no, ..no]).assign(&(-tr(&d2.dovvo, [2, 1, 0, 3])));
    dm2.slice_mut(s![..no, no.., no.., ..no]).assign(&d2.dovvo);
    dm2.slice_mut(s![no.., ..no, ..no, no..]).assign(&tr(&d2.dovvo, [1, 0, 3, 2]));

    dm2.slice_mut(s![no.., no.., no.., no..]).assign(&d2.dvvvv);
    dm2.slice_mut(s![..no, ..no, ..no, ..no]).assign(&d2.doooo);

    dm2.slice_mut(s![..no, no.., no.., no..]).assign(&d2.dovvv);
    dm2.slice_mut(s![no.., no.., ..no, no..]).assign(&tr(&d2.dovvv, [2, 3, 0, 1]));
    dm2.slice_mut(s![no.., no.., no.., ..no]).assign(&tr(&d2.dovvv, [3, 2, 1, 0]));
    dm2.slice_mut(s![no.., ..no, no.., no..]).assign(&tr(&d2.dovvv, [1, 0, 3, 2]));

    dm2.slice_mut(s![..no, ..no, ..no, no..]).assign(&d2.dooov);
    dm2.slice_mut(s![..no, no.., ..no, ..no]).assign(&tr(&d2.dooov, [2, 3, 0, 1]));
    dm2.slice_mut(s![..no, ..no, no.., ..no]).assign(&tr(&d2.dooov, [1, 0, 3, 2]));
    dm2.slice_mut(s![no.., ..no, ..no, ..no]).assign(&tr(&d2.dooov, [3, 2, 1, 0]));

    // separable part: products of the correlated and the reference one-particle density
    let mut dm1: Array2<f64> = make_rdm1_so(space, d1);
    for i in 0..no {
        dm1[[i, i]] -= 1.0;
    }
    for i in 0..no {
        let mut block = dm2.slice_mut(s![i, i, .., ..]);
        block += &dm1;
        let mut block = dm2.slice_mut(s![.., .., i, i]);
        block += &dm1;
        let mut block = dm2.slice_mut(s![.., i, i, ..]);
        block -= &dm1;
        let mut block = dm2.slice_mut(s![i, .., .., i]);
        block -= &dm1.t();
    }
    for (i, j) in iproduct!(0..no, 0..no) {
        dm2[[i, i, j, j]] += 1.0;
        dm2[[i, j, j, i]] -= 1.0;
    }
    project_pair_symmetry(&dm2)
}

/// The aa, ab and bb blocks of the two-particle density in the MO basis.
pub fn make_rdm2(space: &SpinOrbitalSpace, d1: &Gamma1, d2: &Gamma2) -> SpinTriple<Array4<f64>> {
    space.split_two(make_rdm2_so(space, d1, d2).view())
}

/// Electronic energy Σ h γ + ½ Σ (pq|rs) Γaa + Σ (pq|rs) Γab + ½ Σ (pq|rs) Γbb.
pub fn energy_from_rdms(
    eris: &MoIntegrals,
    dm1: &SpinPair<Array2<f64>>,
    dm2: &SpinTriple<Array4<f64>>,
) -> Result<f64> {
    let e1: f64 = (&eris.hcore.alpha * &dm1.alpha).sum() + (&eris.hcore.beta * &dm1.beta).sum();
    let e2: f64 = 0.5 * (&eris.eri.aa * &dm2.aa).sum()
        + (&eris.eri.ab * &dm2.ab).sum()
        + 0.5 * (&eris.eri.bb * &dm2.bb).sum();
    Ok(e1 + e2)
}
