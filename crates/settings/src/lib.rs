//! Generation settings and the process-wide generator state.

pub mod config;
pub mod sender;
pub mod state;

pub use config::{read_update, DataMatrixDefaults, GenerationConfig, SettingsError};
pub use sender::{load_sender, parse_sender};
pub use state::{GeneratorSnapshot, SharedGeneratorState};
