//! Small model systems for the unit tests: random but well-behaved integrals, a
//! converged UHF reference and amplitudes with the correct permutational symmetry.
use crate::cc::{AmplitudeOverrides, AmplitudeStore, Doubles, MoIntegrals, ResolvedAmplitudes, Singles};
use crate::error::{PropertyError, Result};
use crate::initialization::{Atom, Molecule, SpinPair, SpinTriple, UhfReference};
use crate::integrals::{DerivativeIntegrals, IntegralProvider, OneElectronIntegral, RinvIntegral};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::prelude::*;
use ndarray::{Dimension, ShapeBuilder};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use std::f64::consts::PI;

const MODEL_GEOMETRY: [[f64; 3]; 3] = [[0.0, 0.0, 0.0], [1.4, 0.0, 0.0], [0.2, 1.2, 0.3]];

/// Uniformly distributed numbers in [-1, 1) that are reproducible for a given seed.
pub fn random_array<Sh, D>(shape: Sh, seed: u64) -> Array<f64, D>
where
    Sh: ShapeBuilder<Dim = D>,
    D: Dimension,
{
    let mut rng: StdRng = StdRng::seed_from_u64(seed);
    Array::random_using(shape, Uniform::new(-1.0, 1.0), &mut rng)
}

fn random_symmetric(n: usize, scale: f64, seed: u64) -> Array2<f64> {
    let r: Array2<f64> = random_array((n, n), seed);
    0.5 * scale * (&r + &r.t())
}

/// (pq|rs) = Σ_k A_k[p,q] B_k[r,s]
fn outer_sum(a: &[Array2<f64>], b: &[Array2<f64>]) -> Array4<f64> {
    let n: usize = a[0].nrows();
    Array4::from_shape_fn((n, n, n, n), |(p, q, r, s)| {
        a.iter().zip(b.iter()).map(|(x, y)| x[[p, q]] * y[[r, s]]).sum()
    })
}

fn antisymmetric_doubles(x: Array4<f64>) -> Array4<f64> {
    &x - &x.view().permuted_axes([1, 0, 2, 3]) - &x.view().permuted_axes([0, 1, 3, 2])
        + &x.view().permuted_axes([1, 0, 3, 2])
}

/// Integrals of the model: a positive semidefinite two-electron tensor Σ_k B_k ⊗ B_k,
/// orthonormal basis functions and property integrals that are smooth functions of
/// the origin.
pub struct ModelIntegrals {
    pub hcore: Array2<f64>,
    pub eri: Array4<f64>,
    pub soc_eri: Array5<f64>,
    centers: Vec<[f64; 3]>,
    charges: Vec<f64>,
    /// antisymmetric base of the p (1/r) x p integrals
    prinvxp_base: Array3<f64>,
    /// base of the sa01sp integrals, traceless in the Cartesian indices
    sa01sp_base: Array4<f64>,
    hcore_deriv: Vec<Array3<f64>>,
    overlap_deriv: Vec<Array3<f64>>,
    eri_deriv: Vec<Array5<f64>>,
}

impl ModelIntegrals {
    fn new(n_ao: usize, molecule: &Molecule, seed: u64) -> Self {
        let n_atoms: usize = molecule.n_atoms();
        let mut hcore: Array2<f64> = random_symmetric(n_ao, 0.1, seed);
        for i in 0..n_ao {
            hcore[[i, i]] += 0.7 * i as f64 - 2.0;
        }
        let factors: Vec<Array2<f64>> = (0..n_ao)
            .map(|k| random_symmetric(n_ao, 0.15, seed + 10 + k as u64))
            .collect();
        let eri: Array4<f64> = outer_sum(&factors, &factors);

        let r: Array3<f64> = random_array((3, n_ao, n_ao), seed + 1000);
        let prinvxp_base: Array3<f64> = 0.5 * (&r - &r.view().permuted_axes([0, 2, 1]));
        let mut sa01sp_base: Array4<f64> = random_array((3, 4, n_ao, n_ao), seed + 2000);
        let trace: Array2<f64> = (0..3).fold(Array2::zeros((n_ao, n_ao)), |acc, x| {
            acc + &sa01sp_base.slice(s![x, x, .., ..])
        }) / 3.0;
        for x in 0..3 {
            let mut diag = sa01sp_base.slice_mut(s![x, x, .., ..]);
            diag -= &trace;
        }
        let soc_eri: Array5<f64> = 0.05 * random_array((3, n_ao, n_ao, n_ao, n_ao), seed + 3000);

        // derivatives of all but the last atom are random, the last one makes them sum to zero
        let mut hcore_deriv: Vec<Array3<f64>> = Vec::new();
        let mut overlap_deriv: Vec<Array3<f64>> = Vec::new();
        let mut eri_deriv: Vec<Array5<f64>> = Vec::new();
        for atom in 0..n_atoms - 1 {
            let seed_a: u64 = seed + 5000 + 100 * atom as u64;
            let mut h1: Array3<f64> = Array3::zeros((3, n_ao, n_ao));
            let mut s1: Array3<f64> = Array3::zeros((3, n_ao, n_ao));
            let mut eri1: Array5<f64> = Array5::zeros((3, n_ao, n_ao, n_ao, n_ao));
            for xyz in 0..3 {
                let seed_x: u64 = seed_a + 10 * xyz as u64;
                h1.slice_mut(s![xyz, .., ..]).assign(&random_symmetric(n_ao, 0.1, seed_x));
                s1.slice_mut(s![xyz, .., ..]).assign(&random_symmetric(n_ao, 0.05, seed_x + 1));
                let d_factors: Vec<Array2<f64>> = (0..n_ao)
                    .map(|k| random_symmetric(n_ao, 0.05, seed_x + 2 + k as u64 * 1000))
                    .collect();
                let d_eri: Array4<f64> = outer_sum(&d_factors, &factors) + outer_sum(&factors, &d_factors);
                eri1.slice_mut(s![xyz, .., .., .., ..]).assign(&d_eri);
            }
            hcore_deriv.push(h1);
            overlap_deriv.push(s1);
            eri_deriv.push(eri1);
        }
        let h_last: Array3<f64> = hcore_deriv.iter().fold(Array3::zeros((3, n_ao, n_ao)), |acc, x| acc - x);
        let s_last: Array3<f64> = overlap_deriv.iter().fold(Array3::zeros((3, n_ao, n_ao)), |acc, x| acc - x);
        let eri_last: Array5<f64> = eri_deriv
            .iter()
            .fold(Array5::zeros((3, n_ao, n_ao, n_ao, n_ao)), |acc, x| acc - x);
        hcore_deriv.push(h_last);
        overlap_deriv.push(s_last);
        eri_deriv.push(eri_last);

        ModelIntegrals {
            hcore,
            eri,
            soc_eri,
            centers: molecule.atoms.iter().map(|atom| atom.xyz).collect(),
            charges: molecule.atoms.iter().map(|atom| atom.charge()).collect(),
            prinvxp_base,
            sa01sp_base,
            hcore_deriv,
            overlap_deriv,
            eri_deriv,
        }
    }

    fn ao_value(&self, i: usize, point: [f64; 3]) -> f64 {
        let center: [f64; 3] = self.centers[i % self.centers.len()];
        let r2: f64 = (0..3).map(|k| (point[k] - center[k]).powi(2)).sum();
        (1.0 + 0.1 * i as f64) * (-0.5 * r2).exp()
    }

    fn ao_at(&self, point: [f64; 3]) -> Array1<f64> {
        Array1::from_shape_fn(self.hcore.nrows(), |i| self.ao_value(i, point))
    }

    fn prinvxp(&self, origin: [f64; 3]) -> Array3<f64> {
        let phi: Array1<f64> = self.ao_at(origin);
        Array3::from_shape_fn(self.prinvxp_base.raw_dim(), |(x, i, j)| {
            self.prinvxp_base[[x, i, j]] * (phi[i] + phi[j])
        })
    }

    fn sa01sp(&self, origin: [f64; 3]) -> Array3<f64> {
        let n: usize = self.hcore.nrows();
        let phi: Array1<f64> = self.ao_at(origin);
        let a: Array4<f64> = Array4::from_shape_fn((3, 4, n, n), |(x, y, i, j)| {
            let contact: f64 = if x == y { -4.0 * PI / 3.0 } else { 0.0 };
            (self.sa01sp_base[[x, y, i, j]] + contact) * phi[i] * phi[j]
        });
        a.into_shape((12, n, n)).unwrap()
    }

    fn deriv<T: Clone>(list: &[T], atom: usize) -> Result<T> {
        list.get(atom)
            .cloned()
            .ok_or_else(|| PropertyError::External(format!("no derivative integrals for atom {}", atom)))
    }
}

impl IntegralProvider for ModelIntegrals {
    fn n_ao(&self) -> usize {
        self.hcore.nrows()
    }

    fn hcore(&self) -> Array2<f64> {
        self.hcore.clone()
    }

    fn overlap(&self) -> Array2<f64> {
        Array2::eye(self.hcore.nrows())
    }

    fn eri(&self) -> Array4<f64> {
        self.eri.clone()
    }

    fn evaluate(&self, kind: OneElectronIntegral) -> Result<Array3<f64>> {
        match kind {
            OneElectronIntegral::PnucxP => Ok(self
                .centers
                .iter()
                .zip(self.charges.iter())
                .fold(Array3::zeros(self.prinvxp_base.raw_dim()), |acc, (center, z)| {
                    acc - *z * &self.prinvxp(*center)
                })),
        }
    }

    fn evaluate_at(&self, origin: [f64; 3], kind: RinvIntegral) -> Result<Array3<f64>> {
        match kind {
            RinvIntegral::Sa01sp => Ok(self.sa01sp(origin)),
            RinvIntegral::PrinvxP => Ok(self.prinvxp(origin)),
        }
    }

    fn ao_values(&self, coords: ArrayView2<f64>) -> Result<Array2<f64>> {
        Ok(Array2::from_shape_fn((coords.nrows(), self.hcore.nrows()), |(p, i)| {
            self.ao_value(i, [coords[[p, 0]], coords[[p, 1]], coords[[p, 2]]])
        }))
    }

    fn soc_eri(&self) -> Result<Array5<f64>> {
        Ok(self.soc_eri.clone())
    }
}

impl DerivativeIntegrals for ModelIntegrals {
    fn hcore_deriv(&self, atom: usize) -> Result<Array3<f64>> {
        Self::deriv(&self.hcore_deriv, atom)
    }

    fn overlap_deriv(&self, atom: usize) -> Result<Array3<f64>> {
        Self::deriv(&self.overlap_deriv, atom)
    }

    fn eri_deriv(&self, atom: usize) -> Result<Array5<f64>> {
        Self::deriv(&self.eri_deriv, atom)
    }
}

/// Stand-in for the coupled-cluster solver object.
pub struct ModelStore {
    pub reference: UhfReference,
    pub t1: Option<Singles>,
    pub t2: Option<Doubles>,
    pub l1: Option<Singles>,
    pub l2: Option<Doubles>,
    pub eris: Option<MoIntegrals>,
}

impl AmplitudeStore for ModelStore {
    fn reference(&self) -> Option<&UhfReference> {
        Some(&self.reference)
    }
    fn t1(&self) -> Option<&Singles> {
        self.t1.as_ref()
    }
    fn t2(&self) -> Option<&Doubles> {
        self.t2.as_ref()
    }
    fn l1(&self) -> Option<&Singles> {
        self.l1.as_ref()
    }
    fn l2(&self) -> Option<&Doubles> {
        self.l2.as_ref()
    }
    fn eris(&self) -> Option<&MoIntegrals> {
        self.eris.as_ref()
    }
}

/// Three hydrogen nuclei, `n_ao` orthonormal basis functions and a converged
/// UHF reference with `nalpha` and `nbeta` electrons.
pub struct ModelSystem {
    pub molecule: Molecule,
    pub integrals: ModelIntegrals,
    pub reference: UhfReference,
}

impl ModelSystem {
    pub fn new(n_ao: usize, nalpha: usize, nbeta: usize, seed: u64) -> Self {
        let atoms: Vec<Atom> = MODEL_GEOMETRY.iter().map(|xyz| Atom::from((1, *xyz))).collect();
        let charge: i8 = atoms.len() as i8 - (nalpha + nbeta) as i8;
        let molecule: Molecule = Molecule::new(atoms, charge, (nalpha - nbeta) as u8, "model").unwrap();
        let integrals: ModelIntegrals = ModelIntegrals::new(n_ao, &molecule, seed);
        let reference: UhfReference = uhf(&integrals.hcore, &integrals.eri, nalpha, nbeta);
        ModelSystem {
            molecule,
            integrals,
            reference,
        }
    }

    pub fn random_matrix(&self, rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        random_array((rows, cols), seed)
    }

    fn singles(&self, scale: f64, seed: u64) -> Singles {
        let nocc: SpinPair<usize> = self.reference.nocc();
        let nvir: SpinPair<usize> = self.reference.nvir();
        SpinPair::new(
            scale * random_array((nocc.alpha, nvir.alpha), seed),
            scale * random_array((nocc.beta, nvir.beta), seed + 1),
        )
    }

    fn doubles(&self, scale: f64, seed: u64) -> Doubles {
        let (oa, ob): (usize, usize) = (self.reference.nocc().alpha, self.reference.nocc().beta);
        let (va, vb): (usize, usize) = (self.reference.nvir().alpha, self.reference.nvir().beta);
        SpinTriple::new(
            scale * antisymmetric_doubles(random_array((oa, oa, va, va), seed)),
            scale * random_array((oa, ob, va, vb), seed + 1),
            scale * antisymmetric_doubles(random_array((ob, ob, vb, vb), seed + 2)),
        )
    }

    /// Amplitudes and multipliers of magnitude `scale`, the MO integrals are left to
    /// the resolution step.
    pub fn store(&self, scale: f64, seed: u64) -> ModelStore {
        ModelStore {
            reference: self.reference.clone(),
            t1: Some(self.singles(scale, seed)),
            t2: Some(self.doubles(scale, seed + 10)),
            l1: Some(self.singles(scale, seed + 20)),
            l2: Some(self.doubles(scale, seed + 30)),
            eris: None,
        }
    }

    pub fn resolved(&self, scale: f64, seed: u64) -> ResolvedAmplitudes {
        AmplitudeOverrides::default()
            .resolve(&self.store(scale, seed), &self.integrals)
            .unwrap()
    }
}

/// Eigenvalues in ascending order with the corresponding eigenvectors as columns.
fn eigh(m: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n: usize = m.nrows();
    let eig = SymmetricEigen::new(DMatrix::from_fn(n, n, |i, j| m[[i, j]]));
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| eig.eigenvalues[*a].partial_cmp(&eig.eigenvalues[*b]).unwrap());
    let values: Array1<f64> = order.iter().map(|k| eig.eigenvalues[*k]).collect();
    let vectors: Array2<f64> = Array2::from_shape_fn((n, n), |(i, j)| eig.eigenvectors[(i, order[j])]);
    (values, vectors)
}

/// S^(-1/2) of a positive definite overlap matrix.
pub fn lowdin(overlap: &Array2<f64>) -> Array2<f64> {
    let (values, vectors) = eigh(overlap);
    let scaled: Array2<f64> = &vectors / &values.mapv(f64::sqrt).insert_axis(Axis(0));
    scaled.dot(&vectors.t())
}

fn fock(hcore: &Array2<f64>, eri: &Array4<f64>, dm: &SpinPair<Array2<f64>>) -> SpinPair<Array2<f64>> {
    let n: usize = hcore.nrows();
    let total: Array2<f64> = &dm.alpha + &dm.beta;
    let coulomb = |d: &Array2<f64>| Array2::from_shape_fn((n, n), |(p, q)| {
        (eri.slice(s![p, q, .., ..]).to_owned() * d).sum()
    });
    let exchange = |d: &Array2<f64>| Array2::from_shape_fn((n, n), |(p, s)| {
        (eri.slice(s![p, .., .., s]).to_owned() * d).sum()
    });
    let vj: Array2<f64> = coulomb(&total);
    SpinPair::new(hcore + &vj - exchange(&dm.alpha), hcore + &vj - exchange(&dm.beta))
}

/// Damped Roothaan iterations in an orthonormal basis.
pub fn uhf(hcore: &Array2<f64>, eri: &Array4<f64>, nalpha: usize, nbeta: usize) -> UhfReference {
    let n: usize = hcore.nrows();
    let occupied = |c: &Array2<f64>, no: usize| -> Array2<f64> {
        let co = c.slice(s![.., ..no]);
        co.dot(&co.t())
    };
    let (_, c0) = eigh(hcore);
    let mut dm: SpinPair<Array2<f64>> = SpinPair::new(occupied(&c0, nalpha), occupied(&c0, nbeta));
    for _ in 0..5000 {
        let f: SpinPair<Array2<f64>> = fock(hcore, eri, &dm);
        let (_, ca) = eigh(&f.alpha);
        let (_, cb) = eigh(&f.beta);
        let new: SpinPair<Array2<f64>> = SpinPair::new(occupied(&ca, nalpha), occupied(&cb, nbeta));
        let change: f64 = (&new.alpha - &dm.alpha)
            .iter()
            .chain((&new.beta - &dm.beta).iter())
            .fold(0.0, |acc: f64, x| acc.max(x.abs()));
        dm = SpinPair::new(0.3 * &dm.alpha + 0.7 * &new.alpha, 0.3 * &dm.beta + 0.7 * &new.beta);
        if change < 1e-13 {
            break;
        }
    }
    let f: SpinPair<Array2<f64>> = fock(hcore, eri, &dm);
    let (ea, ca) = eigh(&f.alpha);
    let (eb, cb) = eigh(&f.beta);
    let occ = |no: usize| Array1::from_shape_fn(n, |i| if i < no { 1.0 } else { 0.0 });
    UhfReference::new(
        SpinPair::new(ca, cb),
        SpinPair::new(ea, eb),
        SpinPair::new(occ(nalpha), occ(nbeta)),
        true,
    )
    .unwrap()
}
