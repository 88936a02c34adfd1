pub use atom::Atom;
pub use molecule::Molecule;
pub use reference::{DensityMatrix, SpinPair, SpinTriple, UhfReference};

mod atom;
mod molecule;
mod reference;
