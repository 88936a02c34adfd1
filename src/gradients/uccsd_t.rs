use crate::cc::{AmplitudeOverrides, AmplitudeStore, ResolvedAmplitudes};
use crate::error::Result;
use crate::gradients::lagrangian::*;
use crate::initialization::{Molecule, SpinPair};
use crate::integrals::{DerivativeIntegrals, IntegralProvider};
use crate::io::settings::Configuration;
use crate::rdm::{energy_from_rdms, make_rdms, CorrelatedDensities};
use crate::utils::Timer;
use log::{debug, info};
use ndarray::prelude::*;
use ndarray_stats::{DeviationExt, QuantileExt};

/// Analytic gradient of UCCSD(T), or of UCCSD if the triples are switched off.
pub struct UccsdTGradient<'a> {
    pub molecule: &'a Molecule,
    pub integrals: &'a dyn IntegralProvider,
    pub derivatives: &'a dyn DerivativeIntegrals,
    pub config: &'a Configuration,
    pub with_triples: bool,
}

impl<'a> UccsdTGradient<'a> {
    pub fn new(
        molecule: &'a Molecule,
        integrals: &'a dyn IntegralProvider,
        derivatives: &'a dyn DerivativeIntegrals,
        config: &'a Configuration,
    ) -> Self {
        UccsdTGradient {
            molecule,
            integrals,
            derivatives,
            config,
            with_triples: true,
        }
    }

    pub fn with_triples(mut self, with_triples: bool) -> Self {
        self.with_triples = with_triples;
        self
    }

    /// Gradient of the atoms in `config.gradient.atoms` (all atoms if unset), shape
    /// (n_requested, 3), rows in the order of the request.
    pub fn kernel(&self, store: &dyn AmplitudeStore, overrides: &AmplitudeOverrides) -> Result<Array2<f64>> {
        self.config.gradient.validate(self.molecule.n_atoms())?;
        info!("{:^80}", "");
        info!("{:^80}", "Calculating analytic gradient");
        info!("{:-^80}", "");
        let cc: ResolvedAmplitudes = overrides.resolve(store, self.integrals)?;
        let densities: CorrelatedDensities =
            make_rdms(&cc, self.with_triples, true, &self.config.scratch.directory)?;
        self.grad_from_densities(&cc, &densities)
    }

    /// The gradient for densities that were built elsewhere.
    pub fn grad_from_densities(&self, cc: &ResolvedAmplitudes, densities: &CorrelatedDensities) -> Result<Array2<f64>> {
        let timer: Timer = Timer::start();
        let atoms: Vec<usize> = self.config.gradient.atoms(self.molecule.n_atoms());
        if log::log_enabled!(log::Level::Debug) {
            let energy: f64 =
                energy_from_rdms(&cc.eris, &densities.dm1, &densities.dm2)? + self.molecule.nuclear_repulsion_energy();
            debug!("{:<25} {:>18.10}", "Energy from densities:", energy);
        }

        let eri_ao: Array4<f64> = self.integrals.eri();
        let x: SpinPair<Array2<f64>> = generalized_fock(&cc.eris, &densities.dm1, &densities.dm2)?;
        let relaxation: OrbitalRelaxation =
            solve_zvector(&cc.reference, eri_ao.view(), &x, &self.config.gradient.zvector_settings())?;
        let relaxed: RelaxedDensities =
            relaxed_densities(&cc.reference, eri_ao.view(), &densities.dm1, &densities.dm2, &x, &relaxation)?;
        drop(eri_ao);

        let dm_ref: SpinPair<Array2<f64>> = cc.reference.make_rdm1();
        let grad_nuc: Array2<f64> = self.molecule.nuclear_repulsion_gradient();
        let mut gradient: Array2<f64> = Array2::zeros((atoms.len(), 3));
        for (mut row, atom) in gradient.outer_iter_mut().zip(atoms.iter()) {
            let de: Array1<f64> = atom_gradient(self.derivatives, *atom, &relaxed, &dm_ref)?;
            row.assign(&(&de + &grad_nuc.row(*atom)));
        }
        self.print_gradient(&atoms, gradient.view());
        info!("{}", timer);
        info!("{:^80} ", "");
        Ok(gradient)
    }

    fn print_gradient(&self, atoms: &[usize], gradient: ArrayView2<f64>) {
        info!("{: <45} ", "Gradient in atomic units");
        info!("{: <4} {: >18} {: >18} {: >18}", "Atom", "dE/dx", "dE/dy", "dE/dz");
        info!("{:-^61} ", "");
        for (grad_xyz, atom) in gradient.outer_iter().zip(atoms.iter()) {
            info!(
                "{: <4} {:>18.10e} {:>18.10e} {:>18.10e}",
                self.molecule.atom_symbol(*atom),
                grad_xyz[0],
                grad_xyz[1],
                grad_xyz[2]
            );
        }
        info!("{:-^61} ", "");
        if let Ok(max) = gradient.max() {
            info!("{:<25} {:>18.10e}", "Max gradient component:", max);
        }
        if let Ok(rms) = gradient.root_mean_sq_err(&(&gradient * 0.0)) {
            info!("{:<25} {:>18.10e}", "RMS gradient:", rms);
        }
        info!("{:-^80} ", "");
    }
}
