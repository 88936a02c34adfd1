// CODATA 2014 values, the same set the reference hyperfine data was produced with.
pub const G_ELECTRON: f64 = 2.00231930436182;
pub const E_MASS: f64 = 9.10938356e-31;
pub const PROTON_MASS: f64 = 1.672621898e-27;
pub const HARTREE2J: f64 = 4.359744650e-18;
pub const PLANCK: f64 = 6.626070040e-34;
// fine-structure constant
pub const ALPHA: f64 = 7.2973525664e-3;
pub const BOHR: f64 = 0.52917721092;

/// Hartree to MHz.
pub const AU2MHZ: f64 = HARTREE2J / PLANCK * 1e-6;
/// Electron gyromagnetic factor g_e / 2.
pub const E_GYRO: f64 = 0.5 * G_ELECTRON;
/// Nuclear magneton in atomic units, e*hbar/(2 m_p).
pub const NUC_MAG: f64 = 0.5 * (E_MASS / PROTON_MASS);

pub const ATOM_NAMES: [&str; 37] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr",
];

pub static ATOMIC_NUMBERS: phf::Map<&'static str, u8> = phf::phf_map! {
    "H" => 1, "He" => 2, "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "Ne" => 10, "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15,
    "S" => 16, "Cl" => 17, "Ar" => 18, "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22,
    "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26, "Co" => 27, "Ni" => 28, "Cu" => 29,
    "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33, "Se" => 34, "Br" => 35, "Kr" => 36,
};

// nuclear g-factors (mu / (I mu_N)) of the most abundant magnetic isotope
pub static NUC_G_FACTOR: phf::Map<&'static str, f64> = phf::phf_map! {
    "H" => 5.58569468,   // 1H
    "He" => -4.25499544, // 3He
    "Li" => 2.17095093,  // 7Li
    "Be" => -0.78495,    // 9Be
    "B" => 1.79243,      // 11B
    "C" => 1.4048236,    // 13C
    "N" => 0.40376100,   // 14N
    "O" => -0.757516,    // 17O
    "F" => 5.257736,     // 19F
    "Ne" => -0.441198,   // 21Ne
    "Na" => 1.478348,    // 23Na
    "Mg" => -0.34218,    // 25Mg
    "Al" => 1.4566028,   // 27Al
    "Si" => -1.11058,    // 29Si
    "P" => 2.26320,      // 31P
    "S" => 0.429214,     // 33S
    "Cl" => 0.5479162,   // 35Cl
    "K" => 0.26098,      // 39K
    "Ca" => -0.37646,    // 43Ca
    "Sc" => 1.35900,     // 45Sc
    "Ti" => -0.31539,    // 47Ti
    "V" => 1.47106,      // 51V
    "Cr" => -0.31636,    // 53Cr
    "Mn" => 1.3819,      // 55Mn
    "Fe" => 0.1809,      // 57Fe
    "Co" => 1.322,       // 59Co
    "Ni" => -0.50001,    // 61Ni
    "Cu" => 1.4824,      // 63Cu
    "Zn" => 0.350192,    // 67Zn
    "Ga" => 1.34439,     // 69Ga
    "Ge" => -0.195437,   // 73Ge
    "As" => 0.959647,    // 75As
    "Se" => 1.070128,    // 77Se
    "Br" => 1.404267,    // 79Br
    "Kr" => -0.215704,   // 83Kr
};

/// Koseki effective nuclear charge for the one-electron spin-orbit operator.
/// Beyond argon the bare charge is used.
pub fn koseki_charge(z: u8) -> f64 {
    let z: f64 = z as f64;
    if z <= 2.0 {
        z
    } else if z <= 10.0 {
        z * (0.3 + z * 0.05)
    } else if z <= 18.0 {
        z * (1.05 - z * 0.0125)
    } else {
        z
    }
}
