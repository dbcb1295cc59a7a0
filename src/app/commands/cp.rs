use super::{absolute, quote, transfer_pairs};
use crate::core::dispatch::parse_args;
use crate::core::{Context, FileSystem, Result, WriteMode};
use crate::utils::error::describe_io;
use clap::Parser;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;

pub const NAME: &str = "cp";
pub const ABOUT: &str = "Copy SOURCE to DEST, or multiple SOURCE(s) to DIRECTORY";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// if an existing destination file cannot be opened, remove it and try again
    #[arg(short = 'f', long = "force", overrides_with = "no_clobber")]
    force: bool,

    /// do not overwrite an existing file
    #[arg(short = 'n', long = "no-clobber", overrides_with = "force")]
    no_clobber: bool,

    /// copy directories recursively
    #[arg(short = 'r', short_alias = 'R', long = "recursive")]
    recursive: bool,

    /// explain what is being done
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(value_name = "SOURCE")]
    operands: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Options {
    force: bool,
    no_clobber: bool,
    verbose: bool,
}

/// Walks one source operand, reporting failures as it goes. Symlinks in
/// the source are followed.
struct Copier<'c, 'a> {
    ctx: &'c mut Context<'a>,
    options: Options,
    failed: bool,
}

impl Copier<'_, '_> {
    fn fail(&mut self, message: String) {
        self.ctx.warn(NAME, &message);
        self.failed = true;
    }

    fn copy_file(&mut self, source: &str, target: &str) -> io::Result<()> {
        let fs = self.ctx.fs;
        let target_path = Path::new(target);

        if let Ok(existing) = fs.metadata(target_path) {
            if self.options.no_clobber {
                return Ok(());
            }
            if existing.is_dir() {
                self.fail(format!(
                    "cannot overwrite directory {} with non-directory",
                    quote(target)
                ));
                return Ok(());
            }
        }

        let mut reader = match fs.open(Path::new(source)) {
            Ok(reader) => reader,
            Err(err) => {
                self.fail(format!("cannot open {} for reading: {}", quote(source), describe_io(&err)));
                return Ok(());
            }
        };

        let writer = match fs.create(target_path, WriteMode::Truncate) {
            Err(_) if self.options.force && fs.exists(target_path) => fs
                .remove_file(target_path)
                .and_then(|()| fs.create(target_path, WriteMode::Truncate)),
            other => other,
        };
        let mut writer = match writer {
            Ok(writer) => writer,
            Err(err) => {
                self.fail(format!(
                    "cannot create regular file {}: {}",
                    quote(target),
                    describe_io(&err)
                ));
                return Ok(());
            }
        };

        if let Err(err) = io::copy(&mut reader, &mut writer).and_then(|_| writer.flush()) {
            self.fail(format!("error copying {}: {}", quote(source), describe_io(&err)));
            return Ok(());
        }
        self.copied(source, target)
    }

    fn copy_tree(&mut self, source: &str, target: &str) -> io::Result<()> {
        let fs = self.ctx.fs;
        let target_path = Path::new(target);

        match fs.metadata(target_path) {
            Ok(existing) if existing.is_dir() => {}
            Ok(_) => {
                self.fail(format!(
                    "cannot overwrite non-directory {} with directory {}",
                    quote(target),
                    quote(source)
                ));
                return Ok(());
            }
            Err(_) => {
                if let Err(err) = fs.create_dir(target_path) {
                    self.fail(format!(
                        "cannot create directory {}: {}",
                        quote(target),
                        describe_io(&err)
                    ));
                    return Ok(());
                }
                self.copied(source, target)?;
            }
        }

        let mut entries = match fs.read_dir(Path::new(source)) {
            Ok(entries) => entries,
            Err(err) => {
                self.fail(format!("cannot access {}: {}", quote(source), describe_io(&err)));
                return Ok(());
            }
        };
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        for entry in entries {
            let child_source = Path::new(source).join(&entry.name).display().to_string();
            let child_target = target_path.join(&entry.name).display().to_string();
            self.copy_any(&child_source, &child_target)?;
        }
        Ok(())
    }

    fn copy_any(&mut self, source: &str, target: &str) -> io::Result<()> {
        match self.ctx.fs.metadata(Path::new(source)) {
            Ok(info) if info.is_dir() => self.copy_tree(source, target),
            Ok(_) => self.copy_file(source, target),
            Err(err) => {
                self.fail(format!("cannot stat {}: {}", quote(source), describe_io(&err)));
                Ok(())
            }
        }
    }

    fn copied(&mut self, source: &str, target: &str) -> io::Result<()> {
        if self.options.verbose {
            writeln!(self.ctx.stdout, "{} -> {}", quote(source), quote(target))?;
        }
        Ok(())
    }
}

/// True when the two paths name the same file, judged lexically.
fn same_file(fs: &dyn FileSystem, a: &Path, b: &Path) -> bool {
    absolute(fs, a) == absolute(fs, b)
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    let pairs = transfer_pairs(ctx.fs, &args.operands)?;

    let mut copier = Copier {
        ctx,
        options: Options {
            force: args.force,
            no_clobber: args.no_clobber,
            verbose: args.verbose,
        },
        failed: false,
    };

    for (source, target) in &pairs {
        let fs = copier.ctx.fs;
        let (source_path, target_path) = (Path::new(source), Path::new(target));

        let info = match fs.metadata(source_path) {
            Ok(info) => info,
            Err(err) => {
                copier.fail(format!("cannot stat {}: {}", quote(source), describe_io(&err)));
                continue;
            }
        };

        if info.is_dir() {
            if !args.recursive {
                copier.fail(format!("-r not specified; omitting directory {}", quote(source)));
                continue;
            }
            if absolute(fs, target_path).starts_with(absolute(fs, source_path)) {
                copier.fail(format!(
                    "cannot copy a directory, {}, into itself, {}",
                    quote(source),
                    quote(target)
                ));
                continue;
            }
            copier.copy_tree(source, target)?;
        } else if same_file(fs, source_path, target_path) {
            copier.fail(format!("{} and {} are the same file", quote(source), quote(target)));
        } else {
            copier.copy_file(source, target)?;
        }
    }

    Ok(if copier.failed { 1 } else { 0 })
}
