use crate::defaults::*;
use crate::error::{PropertyError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_para_soc2e() -> bool {
    PARA_SOC2E
}
fn default_sso() -> bool {
    SSO
}
fn default_soo() -> bool {
    SOO
}
fn default_so_eff_charge() -> bool {
    SO_EFF_CHARGE
}
fn default_cphf() -> bool {
    CPHF
}
fn default_nuclei() -> Option<Vec<usize>> {
    None
}
fn default_cphf_conv_tol() -> f64 {
    CPHF_CONV_TOL
}
fn default_cphf_max_cycle() -> usize {
    CPHF_MAX_CYCLE
}
fn default_cphf_level_shift() -> f64 {
    CPHF_LEVEL_SHIFT
}
fn default_zvector_conv_tol() -> f64 {
    ZVECTOR_CONV_TOL
}
fn default_zvector_max_cycle() -> usize {
    ZVECTOR_MAX_CYCLE
}
fn default_scratch_directory() -> PathBuf {
    std::env::temp_dir()
}
fn default_hfc_config() -> HfcConfig {
    HfcConfig::default()
}
fn default_cphf_config() -> CphfConfig {
    CphfConfig::default()
}
fn default_gradient_config() -> GradientConfig {
    GradientConfig::default()
}
fn default_scratch_config() -> ScratchConfig {
    ScratchConfig::default()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Configuration {
    #[serde(default = "default_hfc_config")]
    pub hfc: HfcConfig,
    #[serde(default = "default_cphf_config")]
    pub cphf: CphfConfig,
    #[serde(default = "default_gradient_config")]
    pub gradient: GradientConfig,
    #[serde(default = "default_scratch_config")]
    pub scratch: ScratchConfig,
}

impl Configuration {
    /// Parse a configuration from a TOML string. Missing keys and sections take
    /// their default values, so the empty string gives the default configuration.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|err| PropertyError::InvalidConfig(err.to_string()))
    }

    /// Read the configuration file at `path`. If the file does not exist the
    /// default settings are returned.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_string: String = if path.exists() {
            fs::read_to_string(path).map_err(|err| {
                PropertyError::InvalidConfig(format!("{}: {}", path.display(), err))
            })?
        } else {
            String::new()
        };
        Self::from_toml_str(&config_string)
    }

    /// Read `spinprop.toml` from the working directory, falling back to defaults.
    pub fn new() -> Result<Self> {
        Self::from_file(Path::new(CONFIG_FILE_NAME))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| PropertyError::InvalidConfig(err.to_string()))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            hfc: HfcConfig::default(),
            cphf: CphfConfig::default(),
            gradient: GradientConfig::default(),
            scratch: ScratchConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HfcConfig {
    #[serde(default = "default_para_soc2e")]
    pub para_soc2e: bool,
    #[serde(default = "default_sso")]
    pub sso: bool,
    #[serde(default = "default_soo")]
    pub soo: bool,
    #[serde(default = "default_so_eff_charge")]
    pub so_eff_charge: bool,
    #[serde(default = "default_cphf")]
    pub cphf: bool,
    #[serde(default = "default_nuclei")]
    pub hfc_nuc: Option<Vec<usize>>,
}

impl Default for HfcConfig {
    fn default() -> Self {
        HfcConfig {
            para_soc2e: PARA_SOC2E,
            sso: SSO,
            soo: SOO,
            so_eff_charge: SO_EFF_CHARGE,
            cphf: CPHF,
            hfc_nuc: None,
        }
    }
}

impl HfcConfig {
    /// Whether the two-electron SOC operator has to be built at all.
    pub fn with_soc2e(&self) -> bool {
        self.para_soc2e && (self.sso || self.soo)
    }

    /// Whether the one-electron SOC operator uses Koseki effective charges
    /// instead of the bare nuclear potential.
    pub fn with_effective_charge(&self) -> bool {
        self.so_eff_charge || !self.para_soc2e
    }

    /// The nuclei for which the tensor is evaluated, in request order.
    pub fn nuclei(&self, n_atoms: usize) -> Vec<usize> {
        match &self.hfc_nuc {
            Some(list) => list.clone(),
            None => (0..n_atoms).collect(),
        }
    }

    pub fn validate(&self, n_atoms: usize) -> Result<()> {
        if self.para_soc2e && !self.sso && !self.soo {
            return Err(PropertyError::InvalidConfig(String::from(
                "para_soc2e is enabled but neither sso nor soo is selected",
            )));
        }
        if let Some(list) = &self.hfc_nuc {
            check_atom_indices("hfc_nuc", list, n_atoms)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CphfConfig {
    #[serde(default = "default_cphf_conv_tol")]
    pub conv_tol: f64,
    #[serde(default = "default_cphf_max_cycle")]
    pub max_cycle: usize,
    #[serde(default = "default_cphf_level_shift")]
    pub level_shift: f64,
}

impl Default for CphfConfig {
    fn default() -> Self {
        CphfConfig {
            conv_tol: CPHF_CONV_TOL,
            max_cycle: CPHF_MAX_CYCLE,
            level_shift: CPHF_LEVEL_SHIFT,
        }
    }
}

impl CphfConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.conv_tol > 0.0) {
            return Err(PropertyError::InvalidConfig(format!(
                "cphf conv_tol must be positive, got {}",
                self.conv_tol
            )));
        }
        if self.max_cycle == 0 {
            return Err(PropertyError::InvalidConfig(String::from(
                "cphf max_cycle must be at least 1",
            )));
        }
        if self.level_shift < 0.0 {
            return Err(PropertyError::InvalidConfig(format!(
                "cphf level_shift must not be negative, got {}",
                self.level_shift
            )));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GradientConfig {
    #[serde(default = "default_nuclei")]
    pub atoms: Option<Vec<usize>>,
    #[serde(default = "default_zvector_conv_tol")]
    pub zvector_conv_tol: f64,
    #[serde(default = "default_zvector_max_cycle")]
    pub zvector_max_cycle: usize,
}

impl Default for GradientConfig {
    fn default() -> Self {
        GradientConfig {
            atoms: None,
            zvector_conv_tol: ZVECTOR_CONV_TOL,
            zvector_max_cycle: ZVECTOR_MAX_CYCLE,
        }
    }
}

impl GradientConfig {
    pub fn atoms(&self, n_atoms: usize) -> Vec<usize> {
        match &self.atoms {
            Some(list) => list.clone(),
            None => (0..n_atoms).collect(),
        }
    }

    /// The orbital-relaxation solve reuses the linear-response settings.
    pub fn zvector_settings(&self) -> CphfConfig {
        CphfConfig {
            conv_tol: self.zvector_conv_tol,
            max_cycle: self.zvector_max_cycle,
            level_shift: 0.0,
        }
    }

    pub fn validate(&self, n_atoms: usize) -> Result<()> {
        if let Some(list) = &self.atoms {
            check_atom_indices("gradient.atoms", list, n_atoms)?;
        }
        self.zvector_settings().validate()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScratchConfig {
    #[serde(default = "default_scratch_directory")]
    pub directory: PathBuf,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        ScratchConfig {
            directory: default_scratch_directory(),
        }
    }
}

fn check_atom_indices(key: &str, list: &[usize], n_atoms: usize) -> Result<()> {
    match list.iter().find(|idx| **idx >= n_atoms) {
        Some(idx) => Err(PropertyError::InvalidConfig(format!(
            "{} contains atom index {} but the molecule has {} atoms",
            key, idx, n_atoms
        ))),
        None => Ok(()),
    }
}
