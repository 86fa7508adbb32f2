mod config;
mod constants;
mod data;
mod stats;
mod thresholds;

pub use config::*;
pub use constants::*;
pub use data::*;
pub use stats::*;
pub use thresholds::*;
