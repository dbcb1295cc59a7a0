use crate::core::dispatch::parse_args;
use crate::core::{Context, Result};
use clap::Parser;
use std::ffi::OsString;

pub const NAME: &str = "pwd";
pub const ABOUT: &str = "Print the full filename of the current working directory";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// use PWD from environment, even if it contains symlinks
    #[arg(short = 'L', long = "logical")]
    logical: bool,

    /// avoid all symlinks
    #[arg(short = 'P', long = "physical", overrides_with = "logical")]
    physical: bool,
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let _args: Args = parse_args(&args)?;

    // The sandbox tracks a lexical working directory, so -L and -P agree.
    writeln!(ctx.stdout, "{}", ctx.fs.cwd().display())?;
    Ok(0)
}
