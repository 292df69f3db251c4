pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod setup;
pub mod utils;

pub use config::{toml_config::BootConfig, BootArgs};
pub use core::boot::{BootEngine, BootExit, BootResult};
pub use core::plan::{build_engine, Adapters};
pub use domain::model::{CommandSpec, Variant};
pub use utils::error::{BootError, Result};
