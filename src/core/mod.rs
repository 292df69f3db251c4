pub mod boot;
pub mod plan;
pub mod steps;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::model::{BootReport, CommandSpec, StepOutcome, Variant};
pub use crate::domain::ports::{BootContext, CommandRunner, Handoff, Step};
pub use crate::utils::error::Result;
