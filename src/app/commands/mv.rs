use super::{absolute, quote, transfer_pairs};
use crate::core::dispatch::parse_args;
use crate::core::{Context, Result};
use crate::utils::error::describe_io;
use clap::Parser;
use std::ffi::OsString;
use std::path::Path;

pub const NAME: &str = "mv";
pub const ABOUT: &str = "Rename SOURCE to DEST, or move SOURCE(s) to DIRECTORY";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// do not prompt before overwriting
    #[arg(short = 'f', long = "force", overrides_with = "no_clobber")]
    force: bool,

    /// do not overwrite an existing file
    #[arg(short = 'n', long = "no-clobber", overrides_with = "force")]
    no_clobber: bool,

    /// explain what is being done
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(value_name = "SOURCE")]
    operands: Vec<String>,
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    let pairs = transfer_pairs(ctx.fs, &args.operands)?;

    let mut status = 0;
    for (source, target) in &pairs {
        let (source_path, target_path) = (Path::new(source), Path::new(target));

        let info = match ctx.fs.symlink_metadata(source_path) {
            Ok(info) => info,
            Err(err) => {
                ctx.warn(NAME, &format!("cannot stat {}: {}", quote(source), describe_io(&err)));
                status = 1;
                continue;
            }
        };

        let from = absolute(ctx.fs, source_path);
        let to = absolute(ctx.fs, target_path);
        if from == to {
            ctx.warn(
                NAME,
                &format!("{} and {} are the same file", quote(source), quote(target)),
            );
            status = 1;
            continue;
        }
        if info.is_dir() && to.starts_with(&from) {
            ctx.warn(
                NAME,
                &format!(
                    "cannot move {} to a subdirectory of itself, {}",
                    quote(source),
                    quote(target)
                ),
            );
            status = 1;
            continue;
        }

        if let Ok(existing) = ctx.fs.symlink_metadata(target_path) {
            if args.no_clobber {
                tracing::debug!("Not overwriting {}", target);
                continue;
            }
            if existing.is_dir() && !info.is_dir() {
                ctx.warn(
                    NAME,
                    &format!("cannot overwrite directory {} with non-directory", quote(target)),
                );
                status = 1;
                continue;
            }
        }

        match ctx.fs.rename(source_path, target_path) {
            Ok(()) => {
                if args.verbose {
                    writeln!(ctx.stdout, "renamed {} -> {}", quote(source), quote(target))?;
                }
            }
            Err(err) => {
                ctx.warn(
                    NAME,
                    &format!(
                        "cannot move {} to {}: {}",
                        quote(source),
                        quote(target),
                        describe_io(&err)
                    ),
                );
                status = 1;
            }
        }
    }
    Ok(status)
}
