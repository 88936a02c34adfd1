use crate::error::{PropertyError, Result};
use crate::initialization::Atom;
use ndarray::prelude::*;

/// Type that holds the nuclear framework and the electron count of a molecule.
/// The basis set itself lives in the integral engine, only its name is kept here.
#[derive(Clone, Debug)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    /// Total charge
    pub charge: i8,
    /// Number of unpaired electrons, 2S = N_alpha - N_beta
    pub spin: u8,
    /// Name of the basis set
    pub basis: String,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>, charge: i8, spin: u8, basis: &str) -> Result<Self> {
        let n_elec: i64 = atoms.iter().map(|atom| atom.number as i64).sum::<i64>() - charge as i64;
        if n_elec < spin as i64 || (n_elec - spin as i64) % 2 != 0 {
            return Err(PropertyError::InvalidConfig(format!(
                "{} electrons are incompatible with 2S = {}",
                n_elec, spin
            )));
        }
        Ok(Molecule {
            atoms,
            charge,
            spin,
            basis: String::from(basis),
        })
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn n_electrons(&self) -> usize {
        (self.atoms.iter().map(|atom| atom.number as i64).sum::<i64>() - self.charge as i64) as usize
    }

    /// Number of alpha and beta electrons.
    pub fn nelec(&self) -> (usize, usize) {
        let n_elec: usize = self.n_electrons();
        let n_beta: usize = (n_elec - self.spin as usize) / 2;
        (n_elec - n_beta, n_beta)
    }

    /// Coordinates of all nuclei, shape (n_atoms, 3).
    pub fn atom_coords(&self) -> Array2<f64> {
        let mut coords: Array2<f64> = Array2::zeros((self.n_atoms(), 3));
        for (mut row, atom) in coords.outer_iter_mut().zip(self.atoms.iter()) {
            row.assign(&atom.position());
        }
        coords
    }

    pub fn atom_coord(&self, index: usize) -> [f64; 3] {
        self.atoms[index].xyz
    }

    pub fn atom_charge(&self, index: usize) -> u8 {
        self.atoms[index].number
    }

    pub fn atom_symbol(&self, index: usize) -> &'static str {
        self.atoms[index].name
    }

    pub fn nuclear_repulsion_energy(&self) -> f64 {
        let mut energy: f64 = 0.0;
        for (i, atom_i) in self.atoms.iter().enumerate() {
            for atom_j in self.atoms[..i].iter() {
                let r: Array1<f64> = &atom_i.position() - &atom_j.position();
                energy += atom_i.charge() * atom_j.charge() / r.dot(&r).sqrt();
            }
        }
        energy
    }

    /// Derivative of the nuclear repulsion energy w.r.t. the nuclear coordinates, shape (n_atoms, 3).
    pub fn nuclear_repulsion_gradient(&self) -> Array2<f64> {
        let mut gradient: Array2<f64> = Array2::zeros((self.n_atoms(), 3));
        for (i, atom_i) in self.atoms.iter().enumerate() {
            for (j, atom_j) in self.atoms.iter().enumerate() {
                if i == j {
                    continue;
                }
                let r: Array1<f64> = &atom_i.position() - &atom_j.position();
                let r_ij: f64 = r.dot(&r).sqrt();
                let prefactor: f64 = -atom_i.charge() * atom_j.charge() / r_ij.powi(3);
                gradient.row_mut(i).scaled_add(prefactor, &r);
            }
        }
        gradient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn water() -> Molecule {
        let atoms: Vec<Atom> = vec![
            Atom::new("O", [0.0, 0.0, 0.0]).unwrap(),
            Atom::new("H", [0.0, -1.430541, -1.109245]).unwrap(),
            Atom::new("H", [0.0, 1.430541, -1.109245]).unwrap(),
        ];
        Molecule::new(atoms, 0, 2, "6-31g").unwrap()
    }

    #[test]
    fn electron_count() {
        let mol: Molecule = water();
        assert_eq!(mol.n_electrons(), 10);
        assert_eq!(mol.nelec(), (6, 4));
        let neon_anion: Molecule =
            Molecule::new(vec![Atom::new("Ne", [0.0; 3]).unwrap()], -1, 1, "cc-pvdz").unwrap();
        assert_eq!(neon_anion.nelec(), (6, 5));
        assert!(Molecule::new(vec![Atom::new("Ne", [0.0; 3]).unwrap()], 0, 1, "cc-pvdz").is_err());
    }

    #[test]
    fn nuclear_gradient_matches_finite_difference() {
        let mol: Molecule = water();
        let analytic: Array2<f64> = mol.nuclear_repulsion_gradient();
        let step: f64 = 1e-5;
        for atom in 0..mol.n_atoms() {
            for x in 0..3 {
                let mut plus: Molecule = mol.clone();
                plus.atoms[atom].xyz[x] += step;
                let mut minus: Molecule = mol.clone();
                minus.atoms[atom].xyz[x] -= step;
                let numeric: f64 = (plus.nuclear_repulsion_energy()
                    - minus.nuclear_repulsion_energy())
                    / (2.0 * step);
                assert_abs_diff_eq!(analytic[[atom, x]], numeric, epsilon = 1e-7);
            }
        }
        // translational invariance
        assert_abs_diff_eq!(analytic.sum_axis(Axis(0)), Array1::zeros(3), epsilon = 1e-12);
    }
}
