use crate::cc::eris::SpinOrbitalEris;
use crate::error::Result;
use crate::utils::contract;
use ndarray::prelude::*;

/// Perturbative triples amplitudes in the spin-orbital basis, indexed [i,j,k,a,b,c].
#[derive(Clone, Debug)]
pub struct Triples {
    /// connected part, from the doubles and the two-electron integrals
    pub connected: Array6<f64>,
    /// disconnected part, from the singles and the occupied-virtual Fock block
    pub disconnected: Array6<f64>,
}

/// P(a/bc) f = f(abc) - f(bac) - f(cba), followed by P(i/jk).
fn permute_three(w: Array6<f64>) -> Array6<f64> {
    let w: Array6<f64> =
        &w - &w.view().permuted_axes([0, 1, 2, 4, 3, 5]) - &w.view().permuted_axes([0, 1, 2, 5, 4, 3]);
    &w - &w.view().permuted_axes([1, 0, 2, 3, 4, 5]) - &w.view().permuted_axes([2, 1, 0, 3, 4, 5])
}

impl Triples {
    pub fn new(t1: ArrayView2<f64>, t2: ArrayView4<f64>, eris: &SpinOrbitalEris) -> Result<Self> {
        let (n_occ, n_vir): (usize, usize) = t1.dim();
        let eia: Array2<f64> = eris.eia();
        let d3: Array6<f64> = Array6::from_shape_fn((n_occ, n_occ, n_occ, n_vir, n_vir, n_vir), |(i, j, k, a, b, c)| {
            eia[[i, a]] + eia[[j, b]] + eia[[k, c]]
        });

        // <ei||bc> = <ie||cb>, <ma||jk> = <jk||ma>
        let bcei: ArrayView4<f64> = eris.ovvv().permuted_axes([3, 2, 1, 0]);
        let majk: ArrayView4<f64> = eris.ooov().permuted_axes([2, 3, 0, 1]);
        let bcjk: ArrayView4<f64> = eris.oovv().permuted_axes([2, 3, 0, 1]);

        let w: Array6<f64> = contract::<Ix6>("jkae,bcei->ijkabc", &[&t2, &bcei])?
            - contract::<Ix6>("imbc,majk->ijkabc", &[&t2, &majk])?;
        let connected: Array6<f64> = permute_three(w) / &d3;

        let v: Array6<f64> = contract::<Ix6>("ia,bcjk->ijkabc", &[&t1, &bcjk])?
            + contract::<Ix6>("ai,jkbc->ijkabc", &[&eris.fock_vo(), &t2])?;
        let disconnected: Array6<f64> = permute_three(v) / &d3;

        Ok(Triples {
            connected,
            disconnected,
        })
    }

    /// The (T) energy correction 1/36 Σ tc D (tc + td).
    pub fn energy(&self, eris: &SpinOrbitalEris) -> f64 {
        let eia: Array2<f64> = eris.eia();
        let mut energy: f64 = 0.0;
        for ((i, j, k, a, b, c), tc) in self.connected.indexed_iter() {
            let d: f64 = eia[[i, a]] + eia[[j, b]] + eia[[k, c]];
            energy += tc * d * (tc + self.disconnected[[i, j, k, a, b, c]]);
        }
        energy / 36.0
    }

    /// tc + td
    pub fn total(&self) -> Array6<f64> {
        &self.connected + &self.disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cc::{ResolvedAmplitudes, SpinOrbitalAmplitudes};
    use crate::utils::tests::ModelSystem;
    use approx::assert_abs_diff_eq;

    #[test]
    fn triples_are_antisymmetric() {
        let model: ModelSystem = ModelSystem::new(5, 3, 2, 31);
        let cc: ResolvedAmplitudes = model.resolved(0.05, 2);
        let amp: SpinOrbitalAmplitudes = cc.spin_orbital();
        let eris: SpinOrbitalEris = cc.eris.spin_orbital();
        let t3: Triples = Triples::new(amp.t1.view(), amp.t2.view(), &eris).unwrap();
        for t in [&t3.connected, &t3.disconnected].iter() {
            let t: &Array6<f64> = t;
            assert_abs_diff_eq!(*t, -t.view().permuted_axes([1, 0, 2, 3, 4, 5]).to_owned(), epsilon = 1e-12);
            assert_abs_diff_eq!(*t, -t.view().permuted_axes([0, 2, 1, 3, 4, 5]).to_owned(), epsilon = 1e-12);
            assert_abs_diff_eq!(*t, -t.view().permuted_axes([0, 1, 2, 3, 5, 4]).to_owned(), epsilon = 1e-12);
            assert_abs_diff_eq!(*t, t.view().permuted_axes([1, 2, 0, 4, 5, 3]).to_owned(), epsilon = 1e-12);
        }
    }

    #[test]
    fn no_triples_without_amplitudes() {
        let model: ModelSystem = ModelSystem::new(4, 2, 1, 5);
        let cc: ResolvedAmplitudes = model.resolved(0.0, 2);
        let amp: SpinOrbitalAmplitudes = cc.spin_orbital();
        let eris: SpinOrbitalEris = cc.eris.spin_orbital();
        let t3: Triples = Triples::new(amp.t1.view(), amp.t2.view(), &eris).unwrap();
        assert_abs_diff_eq!(t3.energy(&eris), 0.0, epsilon = 1e-15);
        assert!(t3.total().iter().all(|x| *x == 0.0));
    }
}
