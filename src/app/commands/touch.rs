use super::quote;
use crate::core::dispatch::parse_args;
use crate::core::{Context, Result, WriteMode};
use crate::utils::error::{describe_io, UtilError};
use clap::Parser;
use std::ffi::OsString;
use std::path::Path;
use std::time::SystemTime;

pub const NAME: &str = "touch";
pub const ABOUT: &str = "Update the modification time of each FILE to the current time";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// do not create any files
    #[arg(short = 'c', long = "no-create")]
    no_create: bool,

    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    if args.files.is_empty() {
        return Err(UtilError::usage("missing file operand"));
    }

    let now = SystemTime::now();
    let mut status = 0;

    for file in &args.files {
        let path = Path::new(file);
        let outcome = if ctx.fs.exists(path) {
            ctx.fs.set_modified(path, now)
        } else if args.no_create {
            Ok(())
        } else {
            // Append mode creates the file without truncating a concurrent writer.
            ctx.fs.create(path, WriteMode::Append).map(|_| ())
        };

        if let Err(err) = outcome {
            tracing::debug!("touch {} failed: {:?}", file, err.kind());
            ctx.warn(NAME, &format!("cannot touch {}: {}", quote(file), describe_io(&err)));
            status = 1;
        }
    }
    Ok(status)
}
