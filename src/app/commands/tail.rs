use super::{
    clamp_count, copy_to_end, expand_legacy_count, open_input, parse_count, read_chunk, read_line, skip_bytes,
    skip_lines, write_header,
};
use crate::core::context::report;
use crate::core::dispatch::parse_args;
use crate::core::{Context, Result};
use crate::utils::error::UtilError;
use clap::Parser;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufReader, Read, Write};

pub const NAME: &str = "tail";
pub const ABOUT: &str = "Print the last 10 lines of each FILE to standard output";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// output the last NUM bytes; or use -c +NUM to output starting with byte NUM
    #[arg(short = 'c', long = "bytes", value_name = "[+]NUM", allow_hyphen_values = true)]
    bytes: Option<String>,

    /// output the last NUM lines; or use -n +NUM to output starting with line NUM
    #[arg(short = 'n', long = "lines", value_name = "[+]NUM", allow_hyphen_values = true)]
    lines: Option<String>,

    /// never output headers giving file names
    #[arg(short = 'q', long = "quiet", visible_alias = "silent")]
    quiet: bool,

    /// always output headers giving file names
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    LastLines(u64),
    FromLine(u64),
    LastBytes(u64),
    FromByte(u64),
}

fn parse_mode(args: &Args) -> Result<Mode> {
    let (text, bytes) = match (&args.bytes, &args.lines) {
        (Some(c), _) => (c.as_str(), true),
        (None, Some(n)) => (n.as_str(), false),
        (None, None) => return Ok(Mode::LastLines(10)),
    };

    let (from_start, digits) = if let Some(rest) = text.strip_prefix('+') {
        (true, rest)
    } else {
        (false, text.strip_prefix('-').unwrap_or(text))
    };
    let count = parse_count(digits).ok_or_else(|| {
        let what = if bytes { "bytes" } else { "lines" };
        UtilError::usage(format!("invalid number of {}: '{}'", what, text))
    })?;

    Ok(match (bytes, from_start) {
        (false, false) => Mode::LastLines(count),
        (false, true) => Mode::FromLine(count),
        (true, false) => Mode::LastBytes(count),
        (true, true) => Mode::FromByte(count),
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

        if let Err(err) = tail(&mut reader, &mut *ctx.stdout, mode, file) {
            if err.is_broken_pipe() {
                return Err(err);
            }
            report(&mut *ctx.stderr, NAME, &err);
            status = 1;
        }
    }
    Ok(status)
}

/// Streams one input, keeping at most the requested tail in memory.
pub fn tail<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    mode: Mode,
    name: &str,
) -> Result<()> {
    match mode {
        Mode::LastLines(count) => {
            let keep = clamp_count(count);
            if keep == 0 {
                return Ok(());
            }
            let mut reader = BufReader::new(reader);
            let mut ring: VecDeque<Vec<u8>> = VecDeque::new();
            let mut line = Vec::new();
            while read_line(&mut reader, &mut line, name)? {
                let recycled = if ring.len() == keep {
                    ring.pop_front().unwrap_or_default()
                } else {
                    Vec::new()
                };
                ring.push_back(std::mem::replace(&mut line, recycled));
            }
            for line in &ring {
                writer.write_all(line)?;
            }
        }
        Mode::LastBytes(count) => {
            let keep = clamp_count(count);
            let mut window: VecDeque<u8> = VecDeque::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = read_chunk(reader, &mut buf, name)?;
                if n == 0 {
                    break;
                }
                window.extend(&buf[..n]);
                let excess = window.len().saturating_sub(keep);
                window.drain(..excess);
            }
            let (front, back) = window.as_slices();
            writer.write_all(front)?;
            writer.write_all(back)?;
        }
        // +0 and +1 both mean "from the beginning".
        Mode::FromLine(count) => {
            let mut reader = BufReader::new(reader);
            skip_lines(&mut reader, count.saturating_sub(1), name)?;
            copy_to_end(&mut reader, writer, name)?;
        }
        Mode::FromByte(count) => {
            skip_bytes(reader, count.saturating_sub(1), name)?;
            copy_to_end(reader, writer, name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_tail(input: &[u8], mode: Mode) -> Vec<u8> {
        let mut out = Vec::new();
        let mut reader = input;
        tail(&mut reader, &mut out, mode, "-").unwrap();
        out
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(run_tail(b"1\n2\n3\n", Mode::LastLines(2)), b"2\n3\n");
        assert_eq!(run_tail(b"1\n2\n3", Mode::LastLines(1)), b"3");
        assert_eq!(run_tail(b"1\n2\n", Mode::LastLines(10)), b"1\n2\n");
        assert_eq!(run_tail(b"1\n2\n", Mode::LastLines(0)), b"");
    }

    #[test]
    fn test_from_line() {
        assert_eq!(run_tail(b"1\n2\n3\n", Mode::FromLine(2)), b"2\n3\n");
        assert_eq!(run_tail(b"1\n2\n3\n", Mode::FromLine(1)), b"1\n2\n3\n");
        assert_eq!(run_tail(b"1\n2\n3\n", Mode::FromLine(9)), b"");
    }

    /// Hands out one byte per `read`, so every mode crosses buffer edges.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((&b, rest)), Some(slot)) => {
                    *slot = b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    fn run_tail_trickled(input: &[u8], mode: Mode) -> Vec<u8> {
        let mut out = Vec::new();
        tail(&mut Trickle(input), &mut out, mode, "-").unwrap();
        out
    }

    #[test]
    fn test_modes_with_tiny_reads() {
        let input: &[u8] = b"alpha\nbeta\ngamma\ndelta";
        assert_eq!(run_tail_trickled(input, Mode::LastLines(2)), b"gamma\ndelta");
        assert_eq!(run_tail_trickled(input, Mode::FromLine(3)), b"gamma\ndelta");
        assert_eq!(run_tail_trickled(input, Mode::LastBytes(5)), b"delta");
        assert_eq!(run_tail_trickled(input, Mode::FromByte(18)), b"delta");
    }

    #[test]
    fn test_huge_counts_do_not_wrap() {
        assert_eq!(run_tail(b"1\n2\n", Mode::LastLines(u64::MAX)), b"1\n2\n");
        assert_eq!(run_tail(b"abc", Mode::LastBytes(u64::MAX)), b"abc");
        assert_eq!(run_tail(b"abc", Mode::FromByte(u64::MAX)), b"");
        assert_eq!(run_tail(b"1\n2\n", Mode::FromLine(u64::MAX)), b"");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(run_tail(b"abcdef", Mode::LastBytes(2)), b"ef");
        assert_eq!(run_tail(b"abcdef", Mode::FromByte(3)), b"cdef");
        assert_eq!(run_tail(b"abc", Mode::FromByte(10)), b"");
    }
}
