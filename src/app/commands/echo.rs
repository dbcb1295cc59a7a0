use crate::core::{Context, Result};
use std::ffi::OsString;

pub const NAME: &str = "echo";
pub const ABOUT: &str = "Display a line of text";

const HELP: &str = "\
Usage: echo [SHORT-OPTION]... [STRING]...
Echo the STRING(s) to standard output.

  -n     do not output the trailing newline
  -e     enable interpretation of backslash escapes
  -E     disable interpretation of backslash escapes (default)
";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Flags {
    no_newline: bool,
    escapes: bool,
}

/// Leading arguments are options only when every character after the
/// dash is one of `n`, `e`, `E`; anything else starts the text.
fn split_options(args: &[String]) -> (Flags, &[String]) {
    let mut flags = Flags::default();
    let mut idx = 0;

    while let Some(arg) = args.get(idx) {
        let Some(letters) = arg.strip_prefix('-') else {
            break;
        };
        if letters.is_empty() || !letters.chars().all(|c| matches!(c, 'n' | 'e' | 'E')) {
            break;
        }
        for c in letters.chars() {
            match c {
                'n' => flags.no_newline = true,
                'e' => flags.escapes = true,
                _ => flags.escapes = false,
            }
        }
        idx += 1;
    }

    (flags, &args[idx..])
}

/// Expands backslash escapes. Returns `false` when `\c` cut the output.
pub fn expand_escapes(input: &str, out: &mut Vec<u8>) -> bool {
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'\\' || i + 1 == bytes.len() {
            out.push(byte);
            i += 1;
            continue;
        }

        i += 1;
        match bytes[i] {
            b'\\' => out.push(b'\\'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'c' => return false,
            b'e' => out.push(0x1b),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'0' => {
                let (value, used) = parse_radix(&bytes[i + 1..], 8, 3);
                out.push(value);
                i += used;
            }
            b'x' => {
                let (value, used) = parse_radix(&bytes[i + 1..], 16, 2);
                if used == 0 {
                    out.extend_from_slice(b"\\x");
                } else {
                    out.push(value);
                    i += used;
                }
            }
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
        i += 1;
    }
    true
}

fn parse_radix(bytes: &[u8], radix: u32, max_digits: usize) -> (u8, usize) {
    let mut value: u32 = 0;
    let mut used = 0;
    for &b in bytes.iter().take(max_digits) {
        match (b as char).to_digit(radix) {
            Some(d) => {
                value = value * radix + d;
                used += 1;
            }
            None => break,
        }
    }
    ((value & 0xff) as u8, used)
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Vec<String> = args
        .iter()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    if args.len() == 1 {
        match args[0].as_str() {
            "--help" => {
                ctx.stdout.write_all(HELP.as_bytes())?;
                return Ok(0);
            }
            "--version" => {
                writeln!(ctx.stdout, "{} {}", NAME, env!("CARGO_PKG_VERSION"))?;
                return Ok(0);
            }
            _ => {}
        }
    }

    let (flags, words) = split_options(&args);

    let mut out = Vec::new();
    let mut newline = !flags.no_newline;
    for (idx, word) in words.iter().enumerate() {
        if idx > 0 {
            out.push(b' ');
        }
        if flags.escapes {
            if !expand_escapes(word, &mut out) {
                newline = false;
                break;
            }
        } else {
            out.extend_from_slice(word.as_bytes());
        }
    }
    if newline {
        out.push(b'\n');
    }

    ctx.stdout.write_all(&out)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn expand(input: &str) -> (Vec<u8>, bool) {
        let mut out = Vec::new();
        let keep_going = expand_escapes(input, &mut out);
        (out, keep_going)
    }

    #[test]
    fn test_split_options() {
        let args = strings(&["-n", "-eE", "-x", "text"]);
        let (flags, rest) = split_options(&args);
        assert!(flags.no_newline);
        assert!(!flags.escapes);
        assert_eq!(rest, &args[2..]);
    }

    #[test]
    fn test_lone_dash_is_text() {
        let args = strings(&["-", "a"]);
        let (flags, rest) = split_options(&args);
        assert_eq!(flags, Flags::default());
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn test_expand_escapes() {
        assert_eq!(expand(r"a\tb\n"), (b"a\tb\n".to_vec(), true));
        assert_eq!(expand(r"\0101\x41"), (b"AA".to_vec(), true));
        assert_eq!(expand(r"\q"), (b"\\q".to_vec(), true));
        assert_eq!(expand(r"trailing\"), (b"trailing\\".to_vec(), true));
        assert_eq!(expand(r"\xZZ"), (b"\\xZZ".to_vec(), true));
    }

    #[test]
    fn test_backslash_c_stops_output() {
        assert_eq!(expand(r"abc\cdef"), (b"abc".to_vec(), false));
    }
}
