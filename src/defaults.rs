// CONFIGURATION FILE
pub const CONFIG_FILE_NAME: &str = "spinprop.toml";

// HYPERFINE COUPLING
// two-electron spin-orbit coupling in the SOC perturbation
pub const PARA_SOC2E: bool = true;
// two-electron spin-same-orbit term
pub const SSO: bool = true;
// two-electron spin-other-orbit term
pub const SOO: bool = true;
// replace the nuclear charge of the 1e SOC operator by the Koseki effective charge
pub const SO_EFF_CHARGE: bool = false;
// solve the coupled response equations instead of the uncoupled approximation
pub const CPHF: bool = false;

// LINEAR RESPONSE
// convergence threshold for the norm of the residual vectors
pub const CPHF_CONV_TOL: f64 = 1.0e-9;
// maximal number of Krylov iterations
pub const CPHF_MAX_CYCLE: usize = 20;
// shift added to the orbital energy differences
pub const CPHF_LEVEL_SHIFT: f64 = 0.0;
// residual vectors below this norm are not used to expand the subspace
pub const KRYLOV_EXPANSION_THRESHOLD: f64 = 1.0e-2;

// GRADIENT
pub const ZVECTOR_CONV_TOL: f64 = 1.0e-8;
pub const ZVECTOR_MAX_CYCLE: usize = 50;

// SCRATCH STORAGE
pub const SCRATCH_PREFIX: &str = "spinprop-rdm2";
