pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{Preopen, Sandbox, SandboxError};
pub use config::{CoreutilsConfig, MulticallCli};
pub use core::{Context, Environment, Registry, Utility};
pub use utils::error::{Result, UtilError};
