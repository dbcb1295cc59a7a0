use super::quote;
use crate::core::dispatch::parse_args;
use crate::core::{Context, FileInfo, FileKind, Result};
use crate::utils::error::describe_io;
use chrono::{DateTime, Duration, Local};
use clap::Parser;
use std::cmp::Ordering;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

pub const NAME: &str = "ls";
pub const ABOUT: &str = "List information about the FILEs (the current directory by default)";

/// Exit status when a command-line operand cannot be listed.
const SERIOUS_TROUBLE: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// do not ignore entries starting with .
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// do not list implied . and ..
    #[arg(short = 'A', long = "almost-all")]
    almost_all: bool,

    /// list directories themselves, not their contents
    #[arg(short = 'd', long = "directory")]
    directory: bool,

    /// append indicator (one of */=@|) to entries
    #[arg(short = 'F', long = "classify")]
    classify: bool,

    /// use a long listing format
    #[arg(short = 'l')]
    long: bool,

    /// reverse order while sorting
    #[arg(short = 'r', long = "reverse")]
    reverse: bool,

    /// list subdirectories recursively
    #[arg(short = 'R', long = "recursive")]
    recursive: bool,

    /// sort by file size, largest first
    #[arg(short = 'S', overrides_with = "time")]
    size: bool,

    /// sort by time, newest first
    #[arg(short = 't', overrides_with = "size")]
    time: bool,

    /// list one file per line
    #[arg(short = '1')]
    one_per_line: bool,

    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    path: PathBuf,
    info: FileInfo,
}

struct Lister<'c, 'a> {
    ctx: &'c mut Context<'a>,
    args: Args,
    status: i32,
    /// Whether anything has been printed yet; sections after the first
    /// are separated by a blank line.
    printed: bool,
}

impl Lister<'_, '_> {
    fn show_hidden(&self) -> bool {
        self.args.all || self.args.almost_all
    }

    fn sort(&self, entries: &mut [Entry]) {
        entries.sort_by(|a, b| {
            let primary = if self.args.size {
                b.info.len.cmp(&a.info.len)
            } else if self.args.time {
                b.info.modified.cmp(&a.info.modified)
            } else {
                Ordering::Equal
            };
            primary.then_with(|| a.name.cmp(&b.name))
        });
        if self.args.reverse {
            entries.reverse();
        }
    }

    fn indicator(&self, info: &FileInfo) -> &'static str {
        if !self.args.classify {
            return "";
        }
        match info.kind {
            FileKind::Directory => "/",
            FileKind::Symlink if !self.args.long => "@",
            FileKind::Fifo => "|",
            FileKind::Socket => "=",
            FileKind::File if info.mode.is_some_and(|m| m & 0o111 != 0) => "*",
            _ => "",
        }
    }

    fn write_entries(&mut self, entries: &[Entry]) -> io::Result<()> {
        let size_width = entries
            .iter()
            .map(|e| e.info.len.to_string().len())
            .max()
            .unwrap_or(1);
        let now = Local::now();

        for entry in entries {
            let suffix = self.indicator(&entry.info);
            if !self.args.long {
                writeln!(self.ctx.stdout, "{}{}", entry.name, suffix)?;
                continue;
            }

            let mut line = format!(
                "{} {:>width$} {} {}{}",
                entry.info.mode_string(),
                entry.info.len,
                format_time(&entry.info, now),
                entry.name,
                suffix,
                width = size_width
            );
            if entry.info.is_symlink() {
                if let Ok(target) = self.ctx.fs.read_link(&entry.path) {
                    line.push_str(&format!(" -> {}", target.display()));
                }
            }
            writeln!(self.ctx.stdout, "{}", line)?;
        }
        self.printed = self.printed || !entries.is_empty();
        Ok(())
    }

    fn read_entries(&mut self, dir: &Path, shown: &str) -> Option<Vec<Entry>> {
        let fs = self.ctx.fs;
        let listed = match fs.read_dir(dir) {
            Ok(listed) => listed,
            Err(err) => {
                self.ctx.warn(
                    NAME,
                    &format!("cannot open directory {}: {}", quote(shown), describe_io(&err)),
                );
                return None;
            }
        };

        let mut entries: Vec<Entry> = listed
            .into_iter()
            .filter(|e| self.show_hidden() || !e.name.starts_with('.'))
            .map(|e| Entry {
                path: dir.join(&e.name),
                name: e.name,
                info: e.info,
            })
            .collect();

        if self.args.all {
            if let Ok(info) = fs.metadata(dir) {
                let parent = fs.metadata(&dir.join("..")).unwrap_or_else(|_| info.clone());
                entries.push(Entry {
                    name: ".".to_string(),
                    path: dir.to_path_buf(),
                    info,
                });
                entries.push(Entry {
                    name: "..".to_string(),
                    path: dir.join(".."),
                    info: parent,
                });
            }
        }

        self.sort(&mut entries);
        Some(entries)
    }

    fn list_dir(&mut self, dir: &Path, heading: bool) -> io::Result<bool> {
        let shown = dir.display().to_string();
        let Some(entries) = self.read_entries(dir, &shown) else {
            return Ok(false);
        };

        if heading {
            if self.printed {
                writeln!(self.ctx.stdout)?;
            }
            writeln!(self.ctx.stdout, "{}:", shown)?;
            self.printed = true;
        }
        self.write_entries(&entries)?;

        if self.args.recursive {
            for entry in entries {
                if entry.info.is_dir() && entry.name != "." && entry.name != ".." {
                    if !self.list_dir(&entry.path, true)? {
                        self.status = self.status.max(1);
                    }
                }
            }
        }
        Ok(true)
    }
}

fn format_time(info: &FileInfo, now: DateTime<Local>) -> String {
    let Some(modified) = info.modified else {
        return format!("{:>12}", "?");
    };
    let modified: DateTime<Local> = modified.into();
    // Files touched while the listing runs are not in the future.
    let now = if modified > now { Local::now() } else { now };
    // Six months, as a Gregorian year / 2.
    let recent = modified <= now && now - modified < Duration::seconds(31_556_952 / 2);
    if recent {
        modified.format("%b %e %H:%M").to_string()
    } else {
        modified.format("%b %e  %Y").to_string()
    }
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    let explicit = !args.files.is_empty();
    let operands = if explicit {
        args.files.clone()
    } else {
        vec![".".to_string()]
    };

    let mut lister = Lister {
        ctx,
        args,
        status: 0,
        printed: false,
    };

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for operand in &operands {
        let path = Path::new(operand);
        let fs = lister.ctx.fs;
        let info = match fs.symlink_metadata(path) {
            // Operand symlinks are followed unless the link itself is asked for.
            Ok(info) if info.is_symlink() && !lister.args.long && !lister.args.directory => {
                fs.metadata(path).unwrap_or(info)
            }
            Ok(info) => info,
            Err(err) => {
                lister.ctx.warn(
                    NAME,
                    &format!("cannot access {}: {}", quote(operand), describe_io(&err)),
                );
                lister.status = SERIOUS_TROUBLE;
                continue;
            }
        };

        let entry = Entry {
            name: operand.clone(),
            path: path.to_path_buf(),
            info,
        };
        if entry.info.is_dir() && !lister.args.directory {
            dirs.push(entry);
        } else {
            files.push(entry);
        }
    }

    lister.sort(&mut files);
    lister.sort(&mut dirs);
    lister.write_entries(&files)?;

    let headings = lister.args.recursive || operands.len() > 1;
    for dir in dirs {
        if !lister.list_dir(&dir.path, headings)? {
            lister.status = SERIOUS_TROUBLE;
        }
    }

    tracing::debug!("ls listed {} operand(s), status {}", operands.len(), lister.status);
    Ok(lister.status)
}
