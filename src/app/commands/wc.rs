use super::open_input;
use crate::core::dispatch::parse_args;
use crate::core::{Context, Result};
use crate::utils::error::UtilError;
use clap::Parser;
use std::ffi::OsString;
use std::io::{self, Read, Write};

pub const NAME: &str = "wc";
pub const ABOUT: &str = "Print newline, word, and byte counts for each FILE";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// print the byte counts
    #[arg(short = 'c', long = "bytes")]
    bytes: bool,

    /// print the character counts
    #[arg(short = 'm', long = "chars")]
    chars: bool,

    /// print the newline counts
    #[arg(short = 'l', long = "lines")]
    lines: bool,

    /// print the maximum display width
    #[arg(short = 'L', long = "max-line-length")]
    max_line_length: bool,

    /// print the word counts
    #[arg(short = 'w', long = "words")]
    words: bool,

    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub lines: u64,
    pub words: u64,
    pub chars: u64,
    pub bytes: u64,
    pub max_line_length: u64,
}

impl Counts {
    fn add(&mut self, other: &Counts) {
        self.lines += other.lines;
        self.words += other.words;
        self.chars += other.chars;
        self.bytes += other.bytes;
        self.max_line_length = self.max_line_length.max(other.max_line_length);
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    lines: bool,
    words: bool,
    chars: bool,
    bytes: bool,
    max_line_length: bool,
}

impl Columns {
    fn from_args(args: &Args) -> Self {
        if !(args.lines || args.words || args.chars || args.bytes || args.max_line_length) {
            return Self {
                lines: true,
                words: true,
                chars: false,
                bytes: true,
                max_line_length: false,
            };
        }
        Self {
            lines: args.lines,
            words: args.words,
            chars: args.chars,
            bytes: args.bytes,
            max_line_length: args.max_line_length,
        }
    }

    fn select(&self, counts: &Counts) -> Vec<u64> {
        let mut values = Vec::with_capacity(5);
        if self.lines {
            values.push(counts.lines);
        }
        if self.words {
            values.push(counts.words);
        }
        if self.chars {
            values.push(counts.chars);
        }
        if self.bytes {
            values.push(counts.bytes);
        }
        if self.max_line_length {
            values.push(counts.max_line_length);
        }
        values
    }
}

/// Streaming counter; state survives chunk boundaries.
#[derive(Debug, Default)]
pub struct Counter {
    counts: Counts,
    in_word: bool,
    line_width: u64,
}

impl Counter {
    pub fn update(&mut self, chunk: &[u8]) {
        self.counts.bytes += chunk.len() as u64;

        for &byte in chunk {
            // UTF-8 continuation bytes do not start a character.
            let starts_char = byte & 0xC0 != 0x80;
            if starts_char {
                self.counts.chars += 1;
            }

            match byte {
                b'\n' => {
                    self.counts.lines += 1;
                    self.finish_line();
                    self.in_word = false;
                }
                b'\t' => {
                    self.line_width += 8 - self.line_width % 8;
                    self.in_word = false;
                }
                b' ' | b'\r' | 0x0b | 0x0c => {
                    if byte == b' ' {
                        self.line_width += 1;
                    } else if byte == b'\r' {
                        self.line_width = 0;
                    }
                    self.in_word = false;
                }
                _ => {
                    if starts_char && !byte.is_ascii_control() {
                        self.line_width += 1;
                    }
                    if !self.in_word {
                        self.counts.words += 1;
                        self.in_word = true;
                    }
                }
            }
        }
    }

    fn finish_line(&mut self) {
        self.counts.max_line_length = self.counts.max_line_length.max(self.line_width);
        self.line_width = 0;
    }

    pub fn finish(mut self) -> Counts {
        self.finish_line();
        self.counts
    }
}

pub fn count<R: Read + ?Sized>(reader: &mut R, name: &str) -> Result<Counts> {
    let mut counter = Counter::default();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => counter.update(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(UtilError::io(name, e)),
        }
    }
    Ok(counter.finish())
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;
    let columns = Columns::from_args(&args);

    // Without operands stdin is read and no name is printed.
    let named = !args.files.is_empty();
    let files = if named {
        args.files.clone()
    } else {
        vec!["-".to_string()]
    };

    let mut status = 0;
    let mut results: Vec<(String, Counts)> = Vec::with_capacity(files.len());
    let mut total = Counts::default();

    for file in &files {
        let outcome = open_input(&mut *ctx.stdin, ctx.fs, file)
            .and_then(|mut reader| count(&mut reader, file));
        match outcome {
            Ok(counts) => {
                total.add(&counts);
                let label = if named { file.clone() } else { String::new() };
                results.push((label, counts));
            }
            Err(err) => {
                ctx.report(NAME, &err);
                status = 1;
            }
        }
    }

    let show_total = files.len() > 1;
    let single_value = columns.select(&total).len() == 1 && !show_total;
    let width = if single_value {
        1
    } else {
        let widest = columns
            .select(&total)
            .into_iter()
            .chain(results.iter().flat_map(|(_, c)| columns.select(c)))
            .max()
            .unwrap_or(0);
        let digits = widest.to_string().len();
        if files.iter().any(|f| f == "-") {
            digits.max(7)
        } else {
            digits
        }
    };

    for (label, counts) in &results {
        write_row(&mut *ctx.stdout, &columns.select(counts), label, width)?;
    }
    if show_total {
        write_row(&mut *ctx.stdout, &columns.select(&total), "total", width)?;
    }

    Ok(status)
}

fn write_row<W: Write + ?Sized>(writer: &mut W, values: &[u64], label: &str, width: usize) -> io::Result<()> {
    let row = values
        .iter()
        .map(|v| format!("{:>width$}", v, width = width))
        .collect::<Vec<_>>()
        .join(" ");
    if label.is_empty() {
        writeln!(writer, "{}", row)
    } else {
        writeln!(writer, "{} {}", row, label)
    }
}
