//! Inputs of the correlated density builders: converged amplitudes and multipliers
//! of the external coupled-cluster solver and the MO integrals they refer to.
use crate::error::{PropertyError, Result};
use crate::initialization::{SpinPair, SpinTriple, UhfReference};
use crate::integrals::IntegralProvider;
use derive_builder::*;
use log::debug;
use ndarray::prelude::*;

pub mod eris;
pub mod spin_orbital;
pub mod triples;

pub use eris::{MoIntegrals, SpinOrbitalEris};
pub use spin_orbital::{Spin, SpinOrbitalSpace};
pub use triples::Triples;

pub type Singles = SpinPair<Array2<f64>>;
pub type Doubles = SpinTriple<Array4<f64>>;

/// Read access to the state of the external coupled-cluster solver.
/// Every accessor may return `None` if the solver never produced the quantity.
pub trait AmplitudeStore {
    fn reference(&self) -> Option<&UhfReference>;
    fn t1(&self) -> Option<&Singles>;
    fn t2(&self) -> Option<&Doubles>;
    fn l1(&self) -> Option<&Singles>;
    fn l2(&self) -> Option<&Doubles>;
    fn eris(&self) -> Option<&MoIntegrals>;
}

/// Caller supplied replacements for the quantities of an `AmplitudeStore`.
/// Unset fields fall back to the store.
/// ```ignore
/// let overrides = AmplitudeOverridesBuilder::default()
///       .t1(t1)
///       .l1(l1)
///       .build()
///       .unwrap();
/// ```
#[derive(Builder, Clone, Debug, Default)]
#[builder(default, setter(strip_option))]
pub struct AmplitudeOverrides {
    pub t1: Option<Singles>,
    pub t2: Option<Doubles>,
    pub l1: Option<Singles>,
    pub l2: Option<Doubles>,
    pub eris: Option<MoIntegrals>,
}

/// The inputs of one density evaluation. They are resolved once at the call
/// boundary and never re-read from the solver afterwards.
#[derive(Clone, Debug)]
pub struct ResolvedAmplitudes {
    pub reference: UhfReference,
    pub t1: Singles,
    pub t2: Doubles,
    pub l1: Singles,
    pub l2: Doubles,
    pub eris: MoIntegrals,
}

fn pick<T: Clone>(given: &Option<T>, stored: Option<&T>, name: &'static str) -> Result<T> {
    match (given, stored) {
        (Some(value), _) => Ok(value.clone()),
        (None, Some(value)) => {
            debug!("{} taken from the coupled-cluster solver", name);
            Ok(value.clone())
        }
        (None, None) => Err(PropertyError::MissingInput(name)),
    }
}

impl AmplitudeOverrides {
    /// Resolve every input, preferring the caller supplied values. If the MO integrals are
    /// available from neither source they are transformed from the AO integrals.
    pub fn resolve(&self, store: &dyn AmplitudeStore, ints: &dyn IntegralProvider) -> Result<ResolvedAmplitudes> {
        let reference: UhfReference = store
            .reference()
            .cloned()
            .ok_or(PropertyError::MissingInput("reference"))?;
        let eris: MoIntegrals = match (&self.eris, store.eris()) {
            (Some(eris), _) => eris.clone(),
            (None, Some(eris)) => eris.clone(),
            (None, None) => MoIntegrals::from_reference(ints, &reference)?,
        };
        let resolved: ResolvedAmplitudes = ResolvedAmplitudes {
            t1: pick(&self.t1, store.t1(), "t1")?,
            t2: pick(&self.t2, store.t2(), "t2")?,
            l1: pick(&self.l1, store.l1(), "l1")?,
            l2: pick(&self.l2, store.l2(), "l2")?,
            reference,
            eris,
        };
        resolved.check_shapes()?;
        Ok(resolved)
    }
}

impl ResolvedAmplitudes {
    pub fn space(&self) -> SpinOrbitalSpace {
        self.eris.space()
    }

    fn check_shapes(&self) -> Result<()> {
        let nocc: SpinPair<usize> = self.reference.nocc();
        let nvir: SpinPair<usize> = self.reference.nvir();
        let (oa, ob, va, vb) = (nocc.alpha, nocc.beta, nvir.alpha, nvir.beta);
        let singles_ok = |t: &Singles| t.alpha.dim() == (oa, va) && t.beta.dim() == (ob, vb);
        let doubles_ok = |t: &Doubles| {
            t.aa.dim() == (oa, oa, va, va) && t.ab.dim() == (oa, ob, va, vb) && t.bb.dim() == (ob, ob, vb, vb)
        };
        if !(singles_ok(&self.t1) && singles_ok(&self.l1)) {
            return Err(PropertyError::Shape(format!(
                "singles amplitudes do not match {}+{} occupied and {}+{} virtual orbitals",
                oa, ob, va, vb
            )));
        }
        if !(doubles_ok(&self.t2) && doubles_ok(&self.l2)) {
            return Err(PropertyError::Shape(format!(
                "doubles amplitudes do not match {}+{} occupied and {}+{} virtual orbitals",
                oa, ob, va, vb
            )));
        }
        if self.eris.nocc != nocc || self.eris.nmo() != self.reference.nmo() {
            return Err(PropertyError::Shape(String::from(
                "MO integrals belong to a different orbital space",
            )));
        }
        Ok(())
    }

    /// The amplitudes and multipliers in the spin-orbital basis.
    pub fn spin_orbital(&self) -> SpinOrbitalAmplitudes {
        let space: SpinOrbitalSpace = self.space();
        SpinOrbitalAmplitudes {
            t1: space.singles(&self.t1),
            t2: space.doubles(&self.t2),
            l1: space.singles(&self.l1),
            l2: space.doubles(&self.l2),
        }
    }
}

/// Amplitudes and multipliers with spin-orbital indices t1[i,a], t2[i,j,a,b].
#[derive(Clone, Debug)]
pub struct SpinOrbitalAmplitudes {
    pub t1: Array2<f64>,
    pub t2: Array4<f64>,
    pub l1: Array2<f64>,
    pub l2: Array4<f64>,
}
