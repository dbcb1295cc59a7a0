use super::{
    clamp_count, copy_to_end, expand_legacy_count, open_input, parse_count, read_chunk, read_line, write_header,
};
use crate::core::context::report;
use crate::core::dispatch::parse_args;
use crate::core::{Context, Result};
use crate::utils::error::UtilError;
use clap::Parser;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufReader, Read, Write};

pub const NAME: &str = "head";
pub const ABOUT: &str = "Print the first 10 lines of each FILE to standard output";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// print the first NUM bytes; with a leading '-', all but the last NUM bytes
    #[arg(short = 'c', long = "bytes", value_name = "[-]NUM", allow_hyphen_values = true)]
    bytes: Option<String>,

    /// print the first NUM lines; with a leading '-', all but the last NUM lines
    #[arg(short = 'n', long = "lines", value_name = "[-]NUM", allow_hyphen_values = true)]
    lines: Option<String>,

    /// never print headers giving file names
    #[arg(short = 'q', long = "quiet", visible_alias = "silent")]
    quiet: bool,

    /// always print headers giving file names
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    FirstLines(u64),
    AllButLastLines(u64),
    FirstBytes(u64),
    AllButLastBytes(u64),
}

fn parse_mode(args: &Args) -> Result<Mode> {
    let (text, bytes) = match (&args.bytes, &args.lines) {
        (Some(c), _) => (c.as_str(), true),
        (None, Some(n)) => (n.as_str(), false),
        (None, None) => return Ok(Mode::FirstLines(10)),
    };

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let count = parse_count(digits).ok_or_else(|| {
        let what = if bytes { "bytes" } else { "lines" };
        UtilError::usage(format!("invalid number of {}: '{}'", what, text))
    })?;

    Ok(match (bytes, negative) {
        (false, false) => Mode::FirstLines(count),
        (false, true) => Mode::AllButLastLines(count),
        (true, false) => Mode::FirstBytes(count),
        (true, true) => Mode::AllButLastBytes(count),
    })
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&expand_legacy_count(args))?;
    let mode = parse_mode(&args)?;

    let mut files = args.files;
    if files.is_empty() {
        files.push("-".to_string());
    }
    let headers = args.verbose || (files.len() > 1 && !args.quiet);

    let mut status = 0;
    let mut first = true;
    for file in &files {
        let mut reader = match open_input(&mut *ctx.stdin, ctx.fs, file) {
            Ok(reader) => reader,
            Err(err) => {
                report(&mut *ctx.stderr, NAME, &err);
                status = 1;
                continue;
            }
        };

        if headers {
            write_header(&mut *ctx.stdout, file, first)?;
        }
        first = false;

        if let Err(err) = head(&mut reader, &mut *ctx.stdout, mode, file) {
            if err.is_broken_pipe() {
                return Err(err);
            }
            report(&mut *ctx.stderr, NAME, &err);
            status = 1;
        }
    }
    Ok(status)
}

/// Streams one input. The "all but the last" modes hold back only the
/// trailing lines or bytes still in question.
pub fn head<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    mode: Mode,
    name: &str,
) -> Result<()> {
    match mode {
        Mode::FirstLines(count) => {
            let mut reader = BufReader::new(reader);
            let mut line = Vec::new();
            for _ in 0..count {
                if !read_line(&mut reader, &mut line, name)? {
                    break;
                }
                writer.write_all(&line)?;
            }
        }
        Mode::FirstBytes(count) => {
            let mut limited = reader.take(count);
            copy_to_end(&mut limited, writer, name)?;
        }
        Mode::AllButLastLines(count) => {
            let hold = clamp_count(count);
            let mut reader = BufReader::new(reader);
            let mut pending: VecDeque<Vec<u8>> = VecDeque::new();
            let mut line = Vec::new();
            while read_line(&mut reader, &mut line, name)? {
                pending.push_back(std::mem::take(&mut line));
                if pending.len() > hold {
                    if let Some(ready) = pending.pop_front() {
                        writer.write_all(&ready)?;
                        line = ready;
                    }
                }
            }
        }
        Mode::AllButLastBytes(count) => {
            let hold = clamp_count(count);
            let mut window: VecDeque<u8> = VecDeque::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = read_chunk(reader, &mut buf, name)?;
                if n == 0 {
                    break;
                }
                window.extend(&buf[..n]);
                let excess = window.len().saturating_sub(hold);
                if excess > 0 {
                    let (front, back) = window.as_slices();
                    let from_front = excess.min(front.len());
                    writer.write_all(&front[..from_front])?;
                    writer.write_all(&back[..excess - from_front])?;
                    window.drain(..excess);
                }
            }
        }
    }
    Ok(())
}
