//! Reduced density matrices of UCCSD and UCCSD(T).
//!
//! The amplitudes are mapped to the spin-orbital basis, the density intermediates are
//! built there, the two-particle intermediates go through a scratch file and the
//! assembled densities are split back into spin blocks of the MO basis.
use crate::cc::{ResolvedAmplitudes, SpinOrbitalAmplitudes, SpinOrbitalEris, SpinOrbitalSpace, Triples};
use crate::error::Result;
use crate::initialization::{SpinPair, SpinTriple};
use crate::utils::Timer;
use log::{debug, info};
use ndarray::prelude::*;
use std::path::Path;

pub mod assemble;
pub mod gamma1;
pub mod gamma2;
pub mod scratch;

pub use assemble::{energy_from_rdms, make_rdm1_so, make_rdm2_so};
pub use gamma1::{gamma1_intermediates, Gamma1};
pub use gamma2::{gamma2_intermediates, gamma2_outcore, load_gamma2, triples_intermediates, Gamma2, TriplesGamma2};
pub use scratch::{with_scratch, Rdm2Block, ScratchStore};

/// One- and two-particle densities of a correlated state in the MO basis.
#[derive(Clone, Debug)]
pub struct CorrelatedDensities {
    /// dm1[p,q] per spin
    pub dm1: SpinPair<Array2<f64>>,
    /// chemists' ordering, aa, ab and bb blocks
    pub dm2: SpinTriple<Array4<f64>>,
}

/// Perturbative triples amplitudes of the resolved state.
pub fn triples(cc: &ResolvedAmplitudes, amp: &SpinOrbitalAmplitudes) -> Result<Triples> {
    let eris: SpinOrbitalEris = cc.eris.spin_orbital();
    let t3: Triples = Triples::new(amp.t1.view(), amp.t2.view(), &eris)?;
    debug!("(T) energy correction {:18.12}", t3.energy(&eris));
    Ok(t3)
}

/// The one-particle density per spin. `for_grad` selects the intermediates used in
/// the gradient, which differ from the expectation value density only by the (T)
/// Fock response.
pub fn make_rdm1(cc: &ResolvedAmplitudes, with_triples: bool, for_grad: bool) -> Result<SpinPair<Array2<f64>>> {
    let amp: SpinOrbitalAmplitudes = cc.spin_orbital();
    let t3: Option<Triples> = if with_triples { Some(triples(cc, &amp)?) } else { None };
    let d1: Gamma1 = gamma1_intermediates(&amp, t3.as_ref(), for_grad)?;
    Ok(assemble::make_rdm1(&cc.space(), &d1))
}

/// The two-particle density. The intermediates are stored in a scratch file inside
/// `scratch_dir` that is removed before this function returns.
pub fn make_rdm2(cc: &ResolvedAmplitudes, with_triples: bool, scratch_dir: &Path) -> Result<SpinTriple<Array4<f64>>> {
    Ok(make_rdms(cc, with_triples, false, scratch_dir)?.dm2)
}

/// Both densities from one set of intermediates.
pub fn make_rdms(
    cc: &ResolvedAmplitudes,
    with_triples: bool,
    for_grad: bool,
    scratch_dir: &Path,
) -> Result<CorrelatedDensities> {
    let timer: Timer = Timer::start();
    let space: SpinOrbitalSpace = cc.space();
    let amp: SpinOrbitalAmplitudes = cc.spin_orbital();
    let t3: Option<Triples> = if with_triples { Some(triples(cc, &amp)?) } else { None };

    let d1: Gamma1 = gamma1_intermediates(&amp, t3.as_ref(), for_grad)?;
    let dm2_so: Array4<f64> = with_scratch(scratch_dir, |store| {
        gamma2_outcore(&amp, t3.as_ref(), store)?;
        drop(amp);
        let d2: Gamma2 = load_gamma2(store)?;
        Ok(make_rdm2_so(&space, &d1, &d2))
    })?;
    let densities: CorrelatedDensities = CorrelatedDensities {
        dm1: assemble::make_rdm1(&space, &d1),
        dm2: space.split_two(dm2_so.view()),
    };
    info!("{:<25}", "Correlated densities built");
    info!("{}", timer);
    Ok(densities)
}
