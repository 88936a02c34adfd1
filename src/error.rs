use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised by the property kernels.
///
/// Numerical edge cases (closed-shell densities, zero perturbations) are
/// not errors: they are absorbed by the kernels and turned into zero tensors.
/// Non-convergence of a response solve is only logged.
#[derive(Debug)]
pub enum PropertyError {
    /// A tensor contraction could not be carried out (malformed subscripts
    /// or incompatible operand shapes).
    Contraction(String),
    /// An array does not have the shape a kernel expects.
    Shape(String),
    /// An input was neither supplied by the caller nor held by the solver object.
    MissingInput(&'static str),
    /// Unsupported or inconsistent configuration.
    InvalidConfig(String),
    /// Element symbol or nuclear charge without tabulated data.
    UnknownElement(String),
    /// The projected subspace problem of the Krylov solver is singular.
    SingularSubspace(usize),
    /// The spin-dependent property needs unpaired electrons.
    ClosedShell,
    /// Reading or writing a scratch file failed.
    Scratch { path: PathBuf, message: String },
    /// A scratch file could not be removed after use.
    ScratchCleanup { path: PathBuf, source: io::Error },
    /// An external collaborator (integral engine) failed.
    External(String),
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PropertyError::Contraction(msg) => write!(f, "tensor contraction failed: {}", msg),
            PropertyError::Shape(msg) => write!(f, "unexpected array shape: {}", msg),
            PropertyError::MissingInput(name) => write!(
                f,
                "input `{}` was neither given nor available from the solver object",
                name
            ),
            PropertyError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            PropertyError::UnknownElement(name) => {
                write!(f, "no tabulated data for element `{}`", name)
            }
            PropertyError::SingularSubspace(iter) => write!(
                f,
                "subspace matrix of the linear solver became singular in iteration {}",
                iter
            ),
            PropertyError::ClosedShell => {
                write!(f, "the requested property requires an open-shell molecule")
            }
            PropertyError::Scratch { path, message } => {
                write!(f, "scratch file {}: {}", path.display(), message)
            }
            PropertyError::ScratchCleanup { path, source } => write!(
                f,
                "scratch file {} could not be removed: {}",
                path.display(),
                source
            ),
            PropertyError::External(msg) => write!(f, "integral engine: {}", msg),
        }
    }
}

impl error::Error for PropertyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            PropertyError::ScratchCleanup { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PropertyError>;
