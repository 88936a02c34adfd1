use crate::constants::{ATOMIC_NUMBERS, ATOM_NAMES, NUC_G_FACTOR};
use crate::error::{PropertyError, Result};
use ndarray::prelude::*;

/// `Atom` type that contains the chemical element and the position of a nucleus.
#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    /// Symbol of the chemical element
    pub name: &'static str,
    /// Ordinary number of the element
    pub number: u8,
    /// Cartesian coordinates in bohr
    pub xyz: [f64; 3],
}

impl Atom {
    /// Create a new `Atom` from the atomic symbol (case insensitive) and its position in bohr.
    pub fn new(symbol: &str, xyz: [f64; 3]) -> Result<Self> {
        let symbol: String = normalize_symbol(symbol);
        let number: u8 = *ATOMIC_NUMBERS
            .get(symbol.as_str())
            .ok_or_else(|| PropertyError::UnknownElement(symbol.clone()))?;
        Ok(Atom {
            name: ATOM_NAMES[number as usize],
            number,
            xyz,
        })
    }

    /// Nuclear charge in atomic units.
    pub fn charge(&self) -> f64 {
        self.number as f64
    }

    pub fn position(&self) -> Array1<f64> {
        Array1::from(self.xyz.to_vec())
    }

    /// Nuclear g-factor of the most abundant magnetic isotope of the element.
    pub fn nuc_g_factor(&self) -> Result<f64> {
        NUC_G_FACTOR
            .get(self.name)
            .copied()
            .ok_or_else(|| PropertyError::UnknownElement(String::from(self.name)))
    }
}

impl From<(u8, [f64; 3])> for Atom {
    fn from(atom: (u8, [f64; 3])) -> Self {
        Atom {
            name: ATOM_NAMES[atom.0 as usize],
            number: atom.0,
            xyz: atom.1,
        }
    }
}

fn normalize_symbol(symbol: &str) -> String {
    let mut chars = symbol.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_case_insensitive() {
        let atom: Atom = Atom::new("ne", [0.0; 3]).unwrap();
        assert_eq!(atom.number, 10);
        assert_eq!(atom.name, "Ne");
        assert_eq!(Atom::new("CL", [0.0; 3]).unwrap().number, 17);
        assert!(Atom::new("Xx", [0.0; 3]).is_err());
    }

    #[test]
    fn g_factor_lookup() {
        let hydrogen: Atom = Atom::from((1, [0.0, 0.0, 1.0]));
        assert!((hydrogen.nuc_g_factor().unwrap() - 5.58569468).abs() < 1e-12);
        let zinc: Atom = Atom::new("Zn", [0.0; 3]).unwrap();
        assert!((zinc.nuc_g_factor().unwrap() - 0.350192).abs() < 1e-12);
        let argon: Atom = Atom::from((18, [0.0; 3]));
        assert!(matches!(argon.nuc_g_factor(), Err(PropertyError::UnknownElement(_))));
    }
}
