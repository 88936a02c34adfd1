//! Analytic nuclear gradients of UCCSD and UCCSD(T).
//!
//! The correlated densities are turned into an orbital Lagrangian, the orbital
//! relaxation is obtained from the z-vector equations and the relaxed densities
//! are contracted with the derivative integrals of every requested atom.
pub mod lagrangian;
pub mod uccsd_t;

pub use lagrangian::{
    atom_gradient, generalized_fock, relaxed_densities, solve_zvector, OrbitalRelaxation, RelaxedDensities,
};
pub use uccsd_t::UccsdTGradient;
