pub mod settings;

pub use settings::{Configuration, CphfConfig, GradientConfig, HfcConfig, ScratchConfig};
