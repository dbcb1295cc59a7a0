use super::quote;
use crate::core::dispatch::parse_args;
use crate::core::{Context, FileSystem, Result};
use crate::utils::error::{describe_io, UtilError};
use clap::Parser;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

pub const NAME: &str = "mkdir";
pub const ABOUT: &str = "Create the DIRECTORY(ies), if they do not already exist";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// no error if existing, make parent directories as needed
    #[arg(short = 'p', long = "parents")]
    parents: bool,

    /// print a message for each created directory
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(value_name = "DIRECTORY")]
    dirs: Vec<String>,
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    if args.dirs.is_empty() {
        return Err(UtilError::usage("missing operand"));
    }

    let mut status = 0;
    for dir in &args.dirs {
        let created = if args.parents {
            create_with_parents(ctx.fs, Path::new(dir))
        } else {
            ctx.fs.create_dir(Path::new(dir)).map(|()| vec![PathBuf::from(dir)])
        };

        match created {
            Ok(paths) => {
                if args.verbose {
                    for path in paths {
                        writeln!(
                            ctx.stdout,
                            "{}: created directory {}",
                            NAME,
                            quote(&path.display().to_string())
                        )?;
                    }
                }
            }
            Err(err) => {
                ctx.warn(
                    NAME,
                    &format!("cannot create directory {}: {}", quote(dir), describe_io(&err)),
                );
                status = 1;
            }
        }
    }
    Ok(status)
}

/// Creates `path` and any missing ancestors, returning what was created.
pub fn create_with_parents(fs: &dyn FileSystem, path: &Path) -> io::Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    let mut current = PathBuf::new();
    let mut components = path.components().peekable();

    while let Some(component) = components.next() {
        current.push(component);
        let last = components.peek().is_none();
        match fs.metadata(&current) {
            Ok(info) if info.is_dir() => {}
            Ok(_) => return Err(io::Error::from(io::ErrorKind::AlreadyExists)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs.create_dir(&current)?;
                created.push(current.clone());
            }
            // Ancestors above a preopen are invisible but need not exist.
            Err(_) if !last => {}
            Err(err) => return Err(err),
        }
    }
    Ok(created)
}
