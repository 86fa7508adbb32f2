#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod scenario;

pub(crate) mod pool;
pub(crate) mod recorder;
pub(crate) mod trial;

pub use loadstat_core::*;
pub use loadstat_macros::scenario;
pub use scenario::{ConfigurableScenario, Scenario};

pub mod prelude {
    pub use crate::scenario::{ConfigurableScenario, Scenario};
    pub use loadstat_core::{RunStatistics, StageStatistics, Summary, ThresholdError, Thresholds};
    pub use loadstat_macros::scenario;
}
