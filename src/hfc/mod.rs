//! Hyperfine coupling tensors of an unrestricted Hartree-Fock reference.
//!
//! The tensor of every nucleus is the sum of the Fermi-contact/spin-dipole term and
//! the paramagnetic spin-orbit correction, both in MHz:
//! dE = I · A · s
use crate::constants::{ALPHA, AU2MHZ, E_GYRO, NUC_MAG};
use crate::error::{PropertyError, Result};
use crate::initialization::{DensityMatrix, Molecule, UhfReference};
use crate::integrals::IntegralProvider;
use crate::io::settings::Configuration;
use crate::utils::Timer;
use log::{info, warn};
use ndarray::prelude::*;

pub mod fcsd;
pub mod pso;
pub mod report;
pub mod soc;

pub use fcsd::make_fcsd;
pub use pso::{make_pso_soc, pso_from_mo1};
pub use report::{align, write_tensor};
pub use soc::{make_h1_soc, make_h1_soc2e, solve_mo1_soc};

/// One physical contribution to the hyperfine tensors.
pub trait PerturbationTermBuilder {
    fn name(&self) -> &'static str;
    /// Tensors of shape (n_nuclei, 3, 3) in MHz, in the order of `nuclei`.
    fn build(&self, hfc: &HyperfineCoupling, dm0: &DensityMatrix, nuclei: &[usize]) -> Result<Array3<f64>>;
}

/// Fermi-contact and spin-dipole interaction of the spin density with the nuclear spin.
pub struct FermiContactSpinDipole;

impl PerturbationTermBuilder for FermiContactSpinDipole {
    fn name(&self) -> &'static str {
        "FC+SD"
    }

    fn build(&self, hfc: &HyperfineCoupling, dm0: &DensityMatrix, nuclei: &[usize]) -> Result<Array3<f64>> {
        make_fcsd(hfc, dm0, nuclei)
    }
}

/// Paramagnetic spin-orbit term from the spin-orbit response of the orbitals.
pub struct ParamagneticSoc;

impl PerturbationTermBuilder for ParamagneticSoc {
    fn name(&self) -> &'static str {
        "PSO-SOC"
    }

    fn build(&self, hfc: &HyperfineCoupling, _dm0: &DensityMatrix, nuclei: &[usize]) -> Result<Array3<f64>> {
        make_pso_soc(hfc, nuclei)
    }
}

pub struct HyperfineCoupling<'a> {
    pub molecule: &'a Molecule,
    pub integrals: &'a dyn IntegralProvider,
    pub reference: &'a UhfReference,
    pub config: &'a Configuration,
    terms: Vec<Box<dyn PerturbationTermBuilder>>,
}

impl<'a> HyperfineCoupling<'a> {
    pub fn new(
        molecule: &'a Molecule,
        integrals: &'a dyn IntegralProvider,
        reference: &'a UhfReference,
        config: &'a Configuration,
    ) -> Self {
        HyperfineCoupling {
            molecule,
            integrals,
            reference,
            config,
            terms: vec![Box::new(FermiContactSpinDipole), Box::new(ParamagneticSoc)],
        }
    }

    /// Replace the list of contributions that are summed up.
    pub fn with_terms(mut self, terms: Vec<Box<dyn PerturbationTermBuilder>>) -> Self {
        self.terms = terms;
        self
    }

    /// S = (N_alpha - N_beta) / 2
    fn effective_spin(&self) -> Result<f64> {
        match self.molecule.spin {
            0 => Err(PropertyError::ClosedShell),
            spin => Ok(spin as f64 * 0.5),
        }
    }

    /// Prefactor of the first-order (FC+SD) term.
    pub fn fcsd_factor(&self) -> Result<f64> {
        Ok(ALPHA.powi(2) / 2.0 / self.effective_spin()? * E_GYRO * AU2MHZ)
    }

    /// Prefactor of the second-order (PSO-SOC) term.
    pub fn pso_factor(&self) -> Result<f64> {
        Ok(ALPHA.powi(4) / 4.0 / self.effective_spin()? * E_GYRO * AU2MHZ)
    }

    /// Nuclear magnetic moment per spin in units of the electronic Bohr magneton.
    pub fn nuc_gyro(&self, atom: usize) -> Result<f64> {
        let g: f64 = self
            .molecule
            .atoms
            .get(atom)
            .ok_or_else(|| PropertyError::InvalidConfig(format!("no atom with index {}", atom)))?
            .nuc_g_factor()?;
        Ok(g * NUC_MAG)
    }

    fn dump_flags(&self, nuclei: &[usize]) {
        let settings = &self.config.hfc;
        info!("{:^80}", "");
        info!("{:^80}", "Hyperfine coupling tensors");
        info!("{:-^80}", "");
        info!("{:<25} {:?}", "HFC for atoms", nuclei);
        if settings.cphf {
            info!("{:<25} {:e}", "CPHF conv_tol", self.config.cphf.conv_tol);
            info!("{:<25} {}", "CPHF max_cycle", self.config.cphf.max_cycle);
        }
        info!("{:<25} {}", "para_soc2e", settings.para_soc2e);
        info!("{:<25} {} (2e spin-same-orbit coupling)", "sso", settings.sso);
        info!("{:<25} {} (2e spin-other-orbit coupling)", "soo", settings.soo);
        info!("{:<25} {} (1e SO effective charge)", "so_eff_charge", settings.so_eff_charge);
        if !self.reference.converged {
            warn!("Ground state SCF is not converged");
        }
    }

    /// The hyperfine tensors of the nuclei in `config.hfc.hfc_nuc` (all nuclei if unset),
    /// shape (n_nuclei, 3, 3) in MHz.
    pub fn kernel(&self) -> Result<Array3<f64>> {
        let timer: Timer = Timer::start();
        self.config.hfc.validate(self.molecule.n_atoms())?;
        self.config.cphf.validate()?;
        if self.reference.spin() != self.molecule.spin as usize {
            return Err(PropertyError::InvalidConfig(format!(
                "the reference has 2S = {} but the molecule 2S = {}",
                self.reference.spin(),
                self.molecule.spin
            )));
        }
        let nuclei: Vec<usize> = self.config.hfc.nuclei(self.molecule.n_atoms());
        self.dump_flags(&nuclei);

        let dm0: DensityMatrix = DensityMatrix::from(self.reference.make_rdm1());
        let mut hfc_tensor: Array3<f64> = Array3::zeros((nuclei.len(), 3, 3));
        for term in self.terms.iter() {
            info!("{:<25} {}", "contribution", term.name());
            hfc_tensor += &term.build(self, &dm0, &nuclei)?;
        }

        for (tensor, atom) in hfc_tensor.outer_iter().zip(nuclei.iter()) {
            let (aligned, _) = align(tensor)?;
            write_tensor(
                aligned.view(),
                &format!(
                    "Hyperfine coupling tensor of atom {} {} (in MHz)",
                    atom,
                    self.molecule.atom_symbol(*atom)
                ),
            );
        }
        info!("{}", timer);
        Ok(hfc_tensor)
    }
}
