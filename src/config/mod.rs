pub mod cli;
pub mod toml_config;

pub use cli::MulticallCli;
pub use toml_config::{CoreutilsConfig, SandboxConfig, CONFIG_ENV_VAR};
