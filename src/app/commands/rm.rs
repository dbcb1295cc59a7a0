use super::{absolute, quote};
use crate::core::dispatch::parse_args;
use crate::core::{Context, Result};
use crate::utils::error::{describe_io, UtilError};
use clap::Parser;
use std::ffi::OsString;
use std::io;
use std::path::Path;

pub const NAME: &str = "rm";
pub const ABOUT: &str = "Remove (unlink) the FILE(s)";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// ignore nonexistent files and arguments, never prompt
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// remove directories and their contents recursively
    #[arg(short = 'r', short_alias = 'R', long = "recursive")]
    recursive: bool,

    /// remove empty directories
    #[arg(short = 'd', long = "dir")]
    dir: bool,

    /// explain what is being done
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

struct Remover<'c, 'a> {
    ctx: &'c mut Context<'a>,
    verbose: bool,
}

impl Remover<'_, '_> {
    fn fail(&mut self, name: &str, err: &io::Error) -> bool {
        self.ctx.warn(
            NAME,
            &format!("cannot remove {}: {}", quote(name), describe_io(err)),
        );
        false
    }

    fn removed(&mut self, name: &str, dir: bool) -> io::Result<()> {
        if self.verbose {
            let what = if dir { "removed directory" } else { "removed" };
            writeln!(self.ctx.stdout, "{} {}", what, quote(name))?;
        }
        Ok(())
    }

    fn remove_file(&mut self, name: &str) -> io::Result<bool> {
        match self.ctx.fs.remove_file(Path::new(name)) {
            Ok(()) => self.removed(name, false).map(|()| true),
            Err(err) => Ok(self.fail(name, &err)),
        }
    }

    fn remove_empty_dir(&mut self, name: &str) -> io::Result<bool> {
        match self.ctx.fs.remove_dir(Path::new(name)) {
            Ok(()) => self.removed(name, true).map(|()| true),
            Err(err) => Ok(self.fail(name, &err)),
        }
    }

    /// Depth-first removal. Symlinks are removed, never followed.
    fn remove_tree(&mut self, name: &str) -> io::Result<bool> {
        let entries = match self.ctx.fs.read_dir(Path::new(name)) {
            Ok(entries) => entries,
            Err(err) => return Ok(self.fail(name, &err)),
        };

        let mut ok = true;
        for entry in entries {
            let child = Path::new(name).join(&entry.name).display().to_string();
            ok &= if entry.info.is_dir() {
                self.remove_tree(&child)?
            } else {
                self.remove_file(&child)?
            };
        }

        if ok {
            self.remove_empty_dir(name)
        } else {
            Ok(false)
        }
    }
}

fn is_dot_or_dotdot(name: &str) -> bool {
    matches!(name.trim_end_matches('/').rsplit('/').next(), Some(".") | Some(".."))
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    if args.files.is_empty() {
        if args.force {
            return Ok(0);
        }
        return Err(UtilError::usage("missing operand"));
    }

    let mut remover = Remover {
        ctx,
        verbose: args.verbose,
    };
    let mut status = 0;

    for file in &args.files {
        let path = Path::new(file);
        if is_dot_or_dotdot(file) {
            remover.ctx.warn(
                NAME,
                &format!("refusing to remove '.' or '..' directory: skipping {}", quote(file)),
            );
            status = 1;
            continue;
        }
        if args.recursive && absolute(remover.ctx.fs, path) == Path::new("/") {
            remover
                .ctx
                .warn(NAME, &format!("it is dangerous to operate recursively on {}", quote(file)));
            status = 1;
            continue;
        }

        let info = match remover.ctx.fs.symlink_metadata(path) {
            Ok(info) => info,
            Err(err) if args.force && err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                remover.fail(file, &err);
                status = 1;
                continue;
            }
        };

        let ok = if !info.is_dir() {
            remover.remove_file(file)?
        } else if args.recursive {
            tracing::debug!("Removing tree {}", file);
            remover.remove_tree(file)?
        } else if args.dir {
            remover.remove_empty_dir(file)?
        } else {
            remover.fail(file, &io::Error::other("Is a directory"))
        };
        if !ok {
            status = 1;
        }
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_operands_are_refused() {
        assert!(is_dot_or_dotdot("."));
        assert!(is_dot_or_dotdot("./"));
        assert!(is_dot_or_dotdot("a/.."));
        assert!(!is_dot_or_dotdot("/"));
        assert!(!is_dot_or_dotdot(".hidden"));
        assert!(!is_dot_or_dotdot("a/b"));
    }
}
