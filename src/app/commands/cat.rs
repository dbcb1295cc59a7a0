use crate::core::dispatch::parse_args;
use crate::core::{Context, FileKind, FileSystem, Result};
use crate::utils::error::UtilError;
use clap::Parser;
use std::ffi::OsString;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

pub const NAME: &str = "cat";
pub const ABOUT: &str = "Concatenate FILE(s), or standard input, to standard output";

const FAST_BUF_SIZE: usize = 64 * 1024;
const LINE_BUF_SIZE: usize = 31 * 1024;

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
#[command(after_help = "With no FILE, or when FILE is -, read standard input.")]
struct Args {
    /// equivalent to -vET
    #[arg(short = 'A', long = "show-all")]
    show_all: bool,

    /// number nonempty output lines, overrides -n
    #[arg(short = 'b', long = "number-nonblank")]
    number_nonblank: bool,

    /// equivalent to -vE
    #[arg(short = 'e')]
    e: bool,

    /// display $ at end of each line
    #[arg(short = 'E', long = "show-ends")]
    show_ends: bool,

    /// number all output lines
    #[arg(short = 'n', long = "number")]
    number: bool,

    /// suppress repeated empty output lines
    #[arg(short = 's', long = "squeeze-blank")]
    squeeze_blank: bool,

    /// equivalent to -vT
    #[arg(short = 't')]
    t: bool,

    /// display TAB characters as ^I
    #[arg(short = 'T', long = "show-tabs")]
    show_tabs: bool,

    /// use ^ and M- notation, except for LF and TAB
    #[arg(short = 'v', long = "show-nonprinting")]
    show_nonprinting: bool,

    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingMode {
    None,
    NonEmpty,
    All,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub number: NumberingMode,
    pub squeeze_blank: bool,
    pub show_tabs: bool,
    pub show_ends: bool,
    pub show_nonprint: bool,
}

impl OutputOptions {
    fn from_args(args: &Args) -> Self {
        let number = if args.number_nonblank {
            NumberingMode::NonEmpty
        } else if args.number {
            NumberingMode::All
        } else {
            NumberingMode::None
        };

        Self {
            number,
            squeeze_blank: args.squeeze_blank,
            show_tabs: args.show_all || args.t || args.show_tabs,
            show_ends: args.show_all || args.e || args.show_ends,
            show_nonprint: args.show_all || args.e || args.t || args.show_nonprinting,
        }
    }

    /// True when output equals input and bytes can be copied unchanged.
    fn is_plain(&self) -> bool {
        !(self.show_tabs
            || self.show_nonprint
            || self.show_ends
            || self.squeeze_blank
            || self.number != NumberingMode::None)
    }

    fn tab(&self) -> &'static [u8] {
        if self.show_tabs {
            b"^I"
        } else {
            b"\t"
        }
    }

    fn end_of_line(&self) -> &'static [u8] {
        if self.show_ends {
            b"$\n"
        } else {
            b"\n"
        }
    }
}

/// Carried across files so numbering and squeezing continue seamlessly.
#[derive(Debug)]
pub struct OutputState {
    pub line_number: usize,
    pub at_line_start: bool,
    pub one_blank_kept: bool,
}

impl Default for OutputState {
    fn default() -> Self {
        Self {
            line_number: 1,
            at_line_start: true,
            one_blank_kept: false,
        }
    }
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    let options = OutputOptions::from_args(&args);

    let mut files = args.files;
    if files.is_empty() {
        files.push("-".to_string());
    }

    let mut state = OutputState::default();
    let mut error_count = 0;

    for file in &files {
        if let Err(err) = cat_one(ctx, file, &options, &mut state) {
            if err.is_broken_pipe() {
                return Err(err);
            }
            ctx.report(NAME, &err);
            error_count += 1;
        }
    }

    if error_count > 0 {
        tracing::debug!("{}", UtilError::EncounteredErrors(error_count));
        return Ok(1);
    }
    Ok(0)
}

fn cat_one(
    ctx: &mut Context<'_>,
    file: &str,
    options: &OutputOptions,
    state: &mut OutputState,
) -> Result<()> {
    let interactive = file == "-" && ctx.interactive;
    let mut reader: Box<dyn Read + '_> = if file == "-" {
        Box::new(&mut *ctx.stdin)
    } else {
        open_file(ctx.fs, file)?
    };

    let read_error = |e: io::Error| UtilError::io(file, e);

    if options.is_plain() {
        write_fast(&mut reader, &mut *ctx.stdout, interactive, read_error)
    } else {
        let mut writer = BufWriter::with_capacity(FAST_BUF_SIZE, &mut *ctx.stdout);
        write_lines(&mut reader, &mut writer, options, state, interactive, read_error)?;
        writer.flush()?;
        Ok(())
    }
}

/// Opens a named operand, rejecting directories. Unclassifiable files are
/// rejected only on Unix hosts, where every real file type has a kind; other
/// targets cannot tell devices and FIFOs apart and read them as streams.
fn open_file(fs: &dyn FileSystem, file: &str) -> Result<Box<dyn Read>> {
    let path = Path::new(file);
    let info = fs.metadata(path).map_err(|e| UtilError::io(file, e))?;

    check_kind(info.kind, file)?;
    fs.open(path).map_err(|e| UtilError::io(file, e))
}

fn check_kind(kind: FileKind, file: &str) -> Result<()> {
    match kind {
        FileKind::Directory => Err(UtilError::IsDirectory(file.to_string())),
        FileKind::Unknown if cfg!(unix) => Err(UtilError::UnknownFiletype(file.to_string())),
        _ => Ok(()),
    }
}

/// Plain copy. Interactive input is flushed after every read so a terminal
/// sees each line as it is typed.
fn write_fast<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    interactive: bool,
    read_error: impl Fn(io::Error) -> UtilError,
) -> Result<()> {
    let mut in_buf = vec![0u8; FAST_BUF_SIZE];
    loop {
        let n = match reader.read(&mut in_buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(e)),
        };
        writer.write_all(&in_buf[..n])?;
        if interactive {
            writer.flush()?;
        }
    }
}

/// Formatting path: walks the input line by line, applying numbering,
/// squeezing and character notation.
pub fn write_lines<R: Read + ?Sized, W: Write>(
    reader: &mut R,
    writer: &mut W,
    options: &OutputOptions,
    state: &mut OutputState,
    interactive: bool,
    read_error: impl Fn(io::Error) -> UtilError,
) -> Result<()> {
    let mut in_buf = vec![0u8; LINE_BUF_SIZE];
    let eol = options.end_of_line();

    loop {
        let n = match reader.read(&mut in_buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(e)),
        };
        let in_buf = &in_buf[..n];
        let mut pos = 0;

        while pos < n {
            if in_buf[pos] == b'\n' {
                if !state.at_line_start {
                    // Closes a line whose text ended the previous read.
                    writer.write_all(eol)?;
                } else if !options.squeeze_blank || !state.one_blank_kept {
                    state.one_blank_kept = true;
                    if options.number == NumberingMode::All {
                        write!(writer, "{0:6}\t", state.line_number)?;
                        state.line_number += 1;
                    }
                    writer.write_all(eol)?;
                }
                if interactive {
                    writer.flush()?;
                }
                state.at_line_start = true;
                pos += 1;
                continue;
            }

            state.one_blank_kept = false;
            if state.at_line_start && options.number != NumberingMode::None {
                write!(writer, "{0:6}\t", state.line_number)?;
                state.line_number += 1;
            }

            let offset = if options.show_nonprint {
                write_nonprint_to_end(&in_buf[pos..], writer, options.tab())?
            } else if options.show_tabs {
                write_tab_to_end(&in_buf[pos..], writer)?
            } else {
                write_to_end(&in_buf[pos..], writer)?
            };

            if offset == 0 {
                state.at_line_start = false;
                break;
            }

            writer.write_all(eol)?;
            if interactive {
                writer.flush()?;
            }
            state.at_line_start = true;
            pos += offset;
        }
    }
}

// The *_to_end writers emit bytes up to the next newline or the end of the
// buffer. They return the consumed length including the newline, or 0 when
// the buffer ran out first.

fn write_to_end<W: Write>(in_buf: &[u8], writer: &mut W) -> io::Result<usize> {
    match in_buf.iter().position(|c| *c == b'\n') {
        Some(p) => {
            writer.write_all(&in_buf[..p])?;
            Ok(p + 1)
        }
        None => {
            writer.write_all(in_buf)?;
            Ok(0)
        }
    }
}

fn write_tab_to_end<W: Write>(mut in_buf: &[u8], writer: &mut W) -> io::Result<usize> {
    let mut count = 0;
    loop {
        match in_buf.iter().position(|c| *c == b'\n' || *c == b'\t') {
            Some(p) => {
                writer.write_all(&in_buf[..p])?;
                if in_buf[p] == b'\n' {
                    return Ok(count + p + 1);
                }
                writer.write_all(b"^I")?;
                in_buf = &in_buf[p + 1..];
                count += p + 1;
            }
            None => {
                writer.write_all(in_buf)?;
                return Ok(0);
            }
        }
    }
}

fn write_nonprint_to_end<W: Write>(in_buf: &[u8], writer: &mut W, tab: &[u8]) -> io::Result<usize> {
    let mut count = 0;

    for &byte in in_buf {
        if byte == b'\n' {
            break;
        }
        match byte {
            9 => writer.write_all(tab),
            0..=8 | 10..=31 => writer.write_all(&[b'^', byte + 64]),
            32..=126 => writer.write_all(&[byte]),
            127 => writer.write_all(b"^?"),
            128..=159 => writer.write_all(&[b'M', b'-', b'^', byte - 64]),
            160..=254 => writer.write_all(&[b'M', b'-', byte - 128]),
            255 => writer.write_all(b"M-^?"),
        }?;
        count += 1;
    }

    if count != in_buf.len() {
        Ok(count + 1)
    } else {
        Ok(0)
    }
}
