use super::quote;
use crate::core::dispatch::{invoked_name, parse_args};
use crate::core::{Context, Environment, Result};
use clap::Parser;
use std::ffi::OsString;

pub const NAME: &str = "env";
pub const ABOUT: &str = "Set each NAME to VALUE in the environment and run UTILITY";

/// Exit status when the requested utility does not exist.
const NOT_FOUND: i32 = 127;

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// start with an empty environment
    #[arg(short = 'i', long = "ignore-environment")]
    ignore_environment: bool,

    /// end each output line with NUL, not newline
    #[arg(short = '0', long = "null")]
    null: bool,

    /// remove variable from the environment
    #[arg(short = 'u', long = "unset", value_name = "NAME")]
    unset: Vec<String>,

    #[arg(
        value_name = "NAME=VALUE",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    rest: Vec<OsString>,
}

/// Splits `NAME=VALUE`; a leading `=` is not an assignment.
fn assignment(arg: &str) -> Option<(&str, &str)> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Some((name, value)),
        _ => None,
    }
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    let mut rest = args.rest.into_iter().peekable();

    // A lone `-` is the historical spelling of `-i`.
    let mut ignore = args.ignore_environment;
    if rest.peek().is_some_and(|a| a == "-") {
        ignore = true;
        rest.next();
    }

    let mut env = if ignore {
        Environment::new()
    } else {
        ctx.env.clone()
    };
    for name in &args.unset {
        env.remove(name);
    }

    while let Some(arg) = rest.peek() {
        let text = arg.to_string_lossy().into_owned();
        let Some((name, value)) = assignment(&text) else {
            break;
        };
        env.set(name, value);
        rest.next();
    }

    let Some(utility) = rest.next() else {
        let terminator = if args.null { '\0' } else { '\n' };
        for (name, value) in env.iter() {
            write!(ctx.stdout, "{}={}{}", name, value, terminator)?;
        }
        return Ok(0);
    };

    let name = invoked_name(&utility);
    let registry = ctx.registry;
    if registry.lookup(&name).is_none() {
        ctx.warn(
            NAME,
            &format!("{}: No such file or directory", quote(&utility.to_string_lossy())),
        );
        return Ok(NOT_FOUND);
    }

    let mut child_args = vec![OsString::from(&name)];
    child_args.extend(rest);
    tracing::debug!("env running {} with {} variable(s)", name, env.iter().count());

    let mut child = Context {
        stdin: &mut *ctx.stdin,
        stdout: &mut *ctx.stdout,
        stderr: &mut *ctx.stderr,
        fs: ctx.fs,
        env: &env,
        registry,
        interactive: ctx.interactive,
    };
    Ok(registry.run(&mut child, &name, child_args))
}
