use crate::cc::spin_orbital::{Spin, SpinOrbitalSpace};
use crate::error::Result;
use crate::initialization::{SpinPair, SpinTriple, UhfReference};
use crate::integrals::{get_jk_spin, transform_eri, transform_one, IntegralProvider};
use ndarray::prelude::*;
use ndarray::Slice;

/// Integrals of an unrestricted reference in the MO basis.
#[derive(Clone, Debug)]
pub struct MoIntegrals {
    /// core Hamiltonian per spin
    pub hcore: SpinPair<Array2<f64>>,
    /// Fock matrix of the reference per spin
    pub fock: SpinPair<Array2<f64>>,
    /// (pq|rs) with aa = (αα|αα), ab = (αα|ββ) and bb = (ββ|ββ)
    pub eri: SpinTriple<Array4<f64>>,
    pub nocc: SpinPair<usize>,
}

impl MoIntegrals {
    pub fn from_reference(ints: &dyn IntegralProvider, mf: &UhfReference) -> Result<Self> {
        let h_ao: Array2<f64> = ints.hcore();
        let eri_ao: Array4<f64> = ints.eri();
        let ca: ArrayView2<f64> = mf.mo_coeff.alpha.view();
        let cb: ArrayView2<f64> = mf.mo_coeff.beta.view();

        let dm: SpinPair<Array2<f64>> = mf.make_rdm1();
        let veff: SpinPair<Array2<f64>> =
            get_jk_spin(eri_ao.view(), &SpinPair::new(dm.alpha.view(), dm.beta.view()))?;
        let fock_ao: SpinPair<Array2<f64>> = veff.map(|v| &h_ao + &v);

        let eri: SpinTriple<Array4<f64>> = SpinTriple::new(
            transform_eri(eri_ao.view(), ca, ca, ca, ca)?,
            transform_eri(eri_ao.view(), ca, ca, cb, cb)?,
            transform_eri(eri_ao.view(), cb, cb, cb, cb)?,
        );
        Ok(MoIntegrals {
            hcore: SpinPair::new(transform_one(h_ao.view(), ca, ca), transform_one(h_ao.view(), cb, cb)),
            fock: SpinPair::new(
                transform_one(fock_ao.alpha.view(), ca, ca),
                transform_one(fock_ao.beta.view(), cb, cb),
            ),
            eri,
            nocc: mf.nocc(),
        })
    }

    pub fn nmo(&self) -> usize {
        self.fock.alpha.nrows()
    }

    pub fn space(&self) -> SpinOrbitalSpace {
        let nmo: usize = self.nmo();
        SpinOrbitalSpace::new(
            &self.nocc,
            &SpinPair::new(nmo - self.nocc.alpha, nmo - self.nocc.beta),
        )
    }

    /// Orbital energies, the diagonal of the Fock matrices.
    pub fn mo_energy(&self) -> SpinPair<Array1<f64>> {
        self.fock.as_ref().map(|f| f.diag().to_owned())
    }

    /// Chemists' integral (pq|rs) between spin orbitals, zero unless both pairs have equal spin.
    fn so_chemist(&self, space: &SpinOrbitalSpace, p: usize, q: usize, r: usize, s: usize) -> f64 {
        let (sp, ip) = space.orbital(p);
        let (sq, iq) = space.orbital(q);
        let (sr, ir) = space.orbital(r);
        let (ss, is) = space.orbital(s);
        if sp != sq || sr != ss {
            return 0.0;
        }
        match (sp, sr) {
            (Spin::Alpha, Spin::Alpha) => self.eri.aa[[ip, iq, ir, is]],
            (Spin::Alpha, Spin::Beta) => self.eri.ab[[ip, iq, ir, is]],
            (Spin::Beta, Spin::Alpha) => self.eri.ab[[ir, is, ip, iq]],
            (Spin::Beta, Spin::Beta) => self.eri.bb[[ip, iq, ir, is]],
        }
    }

    /// Antisymmetrized integrals <pq||rs> and the Fock matrix in the spin-orbital basis.
    pub fn spin_orbital(&self) -> SpinOrbitalEris {
        let space: SpinOrbitalSpace = self.space();
        let n: usize = space.n_so();
        let antisym: Array4<f64> = Array4::from_shape_fn((n, n, n, n), |(p, q, r, s)| {
            self.so_chemist(&space, p, r, q, s) - self.so_chemist(&space, p, s, q, r)
        });
        let fock: Array2<f64> = Array2::from_shape_fn((n, n), |(p, q)| {
            let (sp, ip) = space.orbital(p);
            let (sq, iq) = space.orbital(q);
            match (sp, sq) {
                (Spin::Alpha, Spin::Alpha) => self.fock.alpha[[ip, iq]],
                (Spin::Beta, Spin::Beta) => self.fock.beta[[ip, iq]],
                _ => 0.0,
            }
        });
        SpinOrbitalEris {
            space,
            mo_energy: fock.diag().to_owned(),
            fock,
            antisym,
        }
    }
}

/// Integrals in the spin-orbital basis (occupied orbitals first).
#[derive(Clone, Debug)]
pub struct SpinOrbitalEris {
    pub space: SpinOrbitalSpace,
    pub fock: Array2<f64>,
    pub mo_energy: Array1<f64>,
    /// <pq||rs> = <pq|rs> - <pq|sr>
    pub antisym: Array4<f64>,
}

impl SpinOrbitalEris {
    fn block(&self, kinds: [bool; 4]) -> ArrayView4<f64> {
        let n_occ: usize = self.space.n_occ();
        let mut view: ArrayView4<f64> = self.antisym.view();
        for (axis, occupied) in kinds.iter().enumerate() {
            let slice: Slice = if *occupied {
                Slice::from(..n_occ)
            } else {
                Slice::from(n_occ..)
            };
            view.slice_axis_inplace(Axis(axis), slice);
        }
        view
    }

    /// <ij||ab>
    pub fn oovv(&self) -> ArrayView4<f64> {
        self.block([true, true, false, false])
    }

    /// <ij||ka>
    pub fn ooov(&self) -> ArrayView4<f64> {
        self.block([true, true, true, false])
    }

    /// <ia||bc>
    pub fn ovvv(&self) -> ArrayView4<f64> {
        self.block([true, false, false, false])
    }

    /// Occupied-virtual and virtual-occupied block of the Fock matrix.
    pub fn fock_ov(&self) -> ArrayView2<f64> {
        let n_occ: usize = self.space.n_occ();
        self.fock.slice(s![..n_occ, n_occ..])
    }

    pub fn fock_vo(&self) -> ArrayView2<f64> {
        let n_occ: usize = self.space.n_occ();
        self.fock.slice(s![n_occ.., ..n_occ])
    }

    /// e_ia = ε_i - ε_a
    pub fn eia(&self) -> Array2<f64> {
        let n_occ: usize = self.space.n_occ();
        let e_occ: ArrayView1<f64> = self.mo_energy.slice(s![..n_occ]);
        let e_vir: ArrayView1<f64> = self.mo_energy.slice(s![n_occ..]);
        Array2::from_shape_fn((e_occ.len(), e_vir.len()), |(i, a)| e_occ[i] - e_vir[a])
    }
}
