use anyhow::Context as _;
use clap::CommandFactory;
use coreutils::config::CONFIG_ENV_VAR;
use coreutils::core::dispatch::{Invocation, Request, MULTICALL_NAME};
use coreutils::utils::error::describe_io;
use coreutils::utils::logger::{self, LogFormat};
use coreutils::utils::validation::Validate;
use coreutils::{Context, CoreutilsConfig, Environment, MulticallCli, Registry, Sandbox};
use std::ffi::OsString;
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use std::process;

fn main() {
    let argv: Vec<OsString> = std::env::args_os().collect();
    let registry = Registry::builtin();

    let request = match registry.resolve(argv).unwrap_or_else(|e| e.exit()) {
        Invocation::Run(request) => request,
        Invocation::List => {
            if let Err(e) = registry.write_list(&mut io::stdout().lock()) {
                eprintln!("{}: write error: {}", MULTICALL_NAME, describe_io(&e));
                process::exit(1);
            }
            return;
        }
        Invocation::Usage => {
            eprint!("{}", MulticallCli::command().render_usage());
            eprintln!();
            eprintln!("Try '{} --help' for more information.", MULTICALL_NAME);
            process::exit(1);
        }
    };

    match run(&registry, request) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", MULTICALL_NAME, e);
            process::exit(1);
        }
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<CoreutilsConfig> {
    let path = path.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

    let config = match path {
        Some(path) => CoreutilsConfig::from_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => CoreutilsConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Working directory as the host reports it. WASI runtimes without a
/// notion of cwd fall back to `$PWD`, then `/`.
fn initial_cwd() -> PathBuf {
    std::env::current_dir()
        .ok()
        .filter(|p| p.is_absolute())
        .or_else(|| {
            std::env::var_os("PWD")
                .map(PathBuf::from)
                .filter(|p| p.is_absolute())
        })
        .unwrap_or_else(|| PathBuf::from("/"))
}

fn run(registry: &Registry, request: Request) -> anyhow::Result<i32> {
    let config = load_config(request.config)?;

    let format = LogFormat::parse(config.log_format()).unwrap_or_default();
    logger::init_cli_logger(request.verbose, config.log_level(), format);
    tracing::debug!("Starting {} as {}", MULTICALL_NAME, request.utility);

    let sandbox = Sandbox::from_config(&config.sandbox, initial_cwd());
    let env = Environment::capture(&config.sandbox.env_allow);

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut stdin = stdin.lock();
    let mut stdout = BufWriter::with_capacity(64 * 1024, io::stdout().lock());
    let mut stderr = io::stderr().lock();

    let mut ctx = Context {
        stdin: &mut stdin,
        stdout: &mut stdout,
        stderr: &mut stderr,
        fs: &sandbox,
        env: &env,
        registry,
        interactive,
    };
    let code = registry.run(&mut ctx, &request.utility, request.args);
    tracing::debug!("{} exited with status {}", request.utility, code);
    Ok(code)
}
