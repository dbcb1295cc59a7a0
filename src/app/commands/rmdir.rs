use super::quote;
use crate::core::dispatch::parse_args;
use crate::core::{Context, FileSystem, Result};
use crate::utils::error::{describe_io, UtilError};
use clap::Parser;
use std::ffi::OsString;
use std::path::Path;

pub const NAME: &str = "rmdir";
pub const ABOUT: &str = "Remove the DIRECTORY(ies), if they are empty";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// ignore each failure that is solely because a directory is non-empty
    #[arg(long = "ignore-fail-on-non-empty")]
    ignore_fail_on_non_empty: bool,

    /// remove DIRECTORY and its ancestors
    #[arg(short = 'p', long = "parents")]
    parents: bool,

    /// output a diagnostic for every directory processed
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(value_name = "DIRECTORY")]
    dirs: Vec<String>,
}

fn is_non_empty_dir(fs: &dyn FileSystem, path: &Path) -> bool {
    fs.read_dir(path).map(|entries| !entries.is_empty()).unwrap_or(false)
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    if args.dirs.is_empty() {
        return Err(UtilError::usage("missing operand"));
    }

    let mut status = 0;
    'operands: for dir in &args.dirs {
        let mut current = Path::new(dir.trim_end_matches('/'));
        if current.as_os_str().is_empty() {
            current = Path::new("/");
        }

        loop {
            let shown = current.display().to_string();
            if args.verbose {
                writeln!(ctx.stdout, "{}: removing directory, {}", NAME, quote(&shown))?;
            }

            if let Err(err) = ctx.fs.remove_dir(current) {
                let ignored = args.ignore_fail_on_non_empty && is_non_empty_dir(ctx.fs, current);
                if !ignored {
                    ctx.warn(
                        NAME,
                        &format!("failed to remove {}: {}", quote(&shown), describe_io(&err)),
                    );
                    status = 1;
                }
                continue 'operands;
            }

            if !args.parents {
                break;
            }
            match current.parent() {
                Some(parent) if !parent.as_os_str().is_empty() && parent != Path::new("/") => {
                    current = parent;
                }
                _ => break,
            }
        }
    }
    Ok(status)
}
