use crate::initialization::{SpinPair, SpinTriple};
use ndarray::prelude::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Spin {
    Alpha,
    Beta,
}

/// Layout of the spin-orbital basis built from an unrestricted reference:
/// occupied alpha, occupied beta, virtual alpha, virtual beta.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpinOrbitalSpace {
    pub nocc: (usize, usize),
    pub nvir: (usize, usize),
}

impl SpinOrbitalSpace {
    pub fn new(nocc: &SpinPair<usize>, nvir: &SpinPair<usize>) -> Self {
        SpinOrbitalSpace {
            nocc: (nocc.alpha, nocc.beta),
            nvir: (nvir.alpha, nvir.beta),
        }
    }

    /// Total number of occupied spin orbitals.
    pub fn n_occ(&self) -> usize {
        self.nocc.0 + self.nocc.1
    }

    pub fn n_vir(&self) -> usize {
        self.nvir.0 + self.nvir.1
    }

    pub fn n_so(&self) -> usize {
        self.n_occ() + self.n_vir()
    }

    pub fn nmo(&self, spin: Spin) -> usize {
        match spin {
            Spin::Alpha => self.nocc.0 + self.nvir.0,
            Spin::Beta => self.nocc.1 + self.nvir.1,
        }
    }

    /// Position of the occupied orbital `i` of the given spin among the occupied spin orbitals.
    pub fn occ_index(&self, spin: Spin, i: usize) -> usize {
        match spin {
            Spin::Alpha => i,
            Spin::Beta => self.nocc.0 + i,
        }
    }

    /// Position of the virtual orbital `a` of the given spin among the virtual spin orbitals.
    pub fn vir_index(&self, spin: Spin, a: usize) -> usize {
        match spin {
            Spin::Alpha => a,
            Spin::Beta => self.nvir.0 + a,
        }
    }

    /// Spin-orbital index of the spatial MO `p` (occupied orbitals first).
    pub fn index(&self, spin: Spin, p: usize) -> usize {
        let nocc: usize = match spin {
            Spin::Alpha => self.nocc.0,
            Spin::Beta => self.nocc.1,
        };
        if p < nocc {
            self.occ_index(spin, p)
        } else {
            self.n_occ() + self.vir_index(spin, p - nocc)
        }
    }

    /// Inverse of `index`.
    pub fn orbital(&self, so: usize) -> (Spin, usize) {
        let n_occ: usize = self.n_occ();
        if so < self.nocc.0 {
            (Spin::Alpha, so)
        } else if so < n_occ {
            (Spin::Beta, so - self.nocc.0)
        } else if so < n_occ + self.nvir.0 {
            (Spin::Alpha, self.nocc.0 + so - n_occ)
        } else {
            (Spin::Beta, self.nocc.1 + so - n_occ - self.nvir.0)
        }
    }

    /// Map singles amplitudes (t1a, t1b) onto the spin-orbital block [occ, vir].
    pub fn singles(&self, t1: &SpinPair<Array2<f64>>) -> Array2<f64> {
        let mut t: Array2<f64> = Array2::zeros((self.n_occ(), self.n_vir()));
        for ((i, a), value) in t1.alpha.indexed_iter() {
            t[[self.occ_index(Spin::Alpha, i), self.vir_index(Spin::Alpha, a)]] = *value;
        }
        for ((i, a), value) in t1.beta.indexed_iter() {
            t[[self.occ_index(Spin::Beta, i), self.vir_index(Spin::Beta, a)]] = *value;
        }
        t
    }

    /// Map doubles amplitudes (aa, ab, bb) onto the antisymmetric spin-orbital block [occ, occ, vir, vir].
    pub fn doubles(&self, t2: &SpinTriple<Array4<f64>>) -> Array4<f64> {
        let (no, nv): (usize, usize) = (self.n_occ(), self.n_vir());
        let mut t: Array4<f64> = Array4::zeros((no, no, nv, nv));
        for ((i, j, a, b), value) in t2.aa.indexed_iter() {
            t[[
                self.occ_index(Spin::Alpha, i),
                self.occ_index(Spin::Alpha, j),
                self.vir_index(Spin::Alpha, a),
                self.vir_index(Spin::Alpha, b),
            ]] = *value;
        }
        for ((i, j, a, b), value) in t2.bb.indexed_iter() {
            t[[
                self.occ_index(Spin::Beta, i),
                self.occ_index(Spin::Beta, j),
                self.vir_index(Spin::Beta, a),
                self.vir_index(Spin::Beta, b),
            ]] = *value;
        }
        for ((i, j, a, b), value) in t2.ab.indexed_iter() {
            let ia: usize = self.occ_index(Spin::Alpha, i);
            let jb: usize = self.occ_index(Spin::Beta, j);
            let aa: usize = self.vir_index(Spin::Alpha, a);
            let bb: usize = self.vir_index(Spin::Beta, b);
            t[[ia, jb, aa, bb]] = *value;
            t[[jb, ia, bb, aa]] = *value;
            t[[ia, jb, bb, aa]] = -*value;
            t[[jb, ia, aa, bb]] = -*value;
        }
        t
    }

    /// Spin blocks of a spin-orbital one-particle density, each in the MO order of its spin.
    pub fn split_one(&self, dm: ArrayView2<f64>) -> SpinPair<Array2<f64>> {
        let block = |spin: Spin| -> Array2<f64> {
            let n: usize = self.nmo(spin);
            Array2::from_shape_fn((n, n), |(p, q)| dm[[self.index(spin, p), self.index(spin, q)]])
        };
        SpinPair::new(block(Spin::Alpha), block(Spin::Beta))
    }

    /// The aa, ab (alpha pair p,q and beta pair r,s) and bb blocks of a spin-orbital
    /// two-particle density in chemists' ordering.
    pub fn split_two(&self, dm: ArrayView4<f64>) -> SpinTriple<Array4<f64>> {
        let block = |s1: Spin, s2: Spin| -> Array4<f64> {
            let (n1, n2): (usize, usize) = (self.nmo(s1), self.nmo(s2));
            Array4::from_shape_fn((n1, n1, n2, n2), |(p, q, r, s)| {
                dm[[
                    self.index(s1, p),
                    self.index(s1, q),
                    self.index(s2, r),
                    self.index(s2, s),
                ]]
            })
        };
        SpinTriple::new(
            block(Spin::Alpha, Spin::Alpha),
            block(Spin::Alpha, Spin::Beta),
            block(Spin::Beta, Spin::Beta),
        )
    }
}
