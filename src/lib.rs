//! Analytic UCCSD(T) gradients and UHF hyperfine coupling tensors.
//!
//! Both kernels consume the results of external solvers: the AO integrals through
//! [IntegralProvider](crate::integrals::IntegralProvider), the converged amplitudes
//! through [AmplitudeStore](crate::cc::AmplitudeStore) and the mean-field solution as
//! [UhfReference](crate::initialization::UhfReference).
pub mod cc;
pub mod constants;
pub mod cphf;
pub mod defaults;
pub mod error;
pub mod gradients;
pub mod hfc;
pub mod initialization;
pub mod integrals;
pub mod io;
pub mod rdm;
pub mod utils;

pub use error::{PropertyError, Result};
pub use gradients::UccsdTGradient;
pub use hfc::HyperfineCoupling;
