use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Front end of the multicall binary when it is not invoked under a
/// utility's name.
#[derive(Debug, Clone, Parser)]
#[command(name = "coreutils", version)]
#[command(about = "Multicall binary hosting a portable coreutils suite")]
#[command(override_usage = "coreutils [OPTIONS] UTILITY [ARGS]...")]
pub struct MulticallCli {
    /// TOML configuration file (falls back to $COREUTILS_CONFIG)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long)]
    pub verbose: bool,

    /// List available utilities and exit
    #[arg(long)]
    pub list: bool,

    /// Utility to run
    pub utility: Option<String>,

    /// Arguments passed to the utility
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<OsString>,
}
