pub mod basename;
pub mod cat;
pub mod cp;
pub mod dirname;
pub mod echo;
pub mod env;
pub mod head;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod pwd;
pub mod rm;
pub mod rmdir;
pub mod tail;
pub mod touch;
pub mod truefalse;
pub mod wc;

use crate::core::dispatch::Utility;
use crate::core::{FileKind, FileSystem, Result};
use crate::domain::model::normalize;
use crate::utils::error::UtilError;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

macro_rules! utility {
    ($module:ident) => {
        Utility {
            name: $module::NAME,
            about: $module::ABOUT,
            main: $module::run,
        }
    };
}

pub fn all() -> Vec<Utility> {
    vec![
        utility!(basename),
        utility!(cat),
        utility!(cp),
        utility!(dirname),
        utility!(echo),
        utility!(env),
        utility!(head),
        utility!(ls),
        utility!(mkdir),
        utility!(mv),
        utility!(pwd),
        utility!(rm),
        utility!(rmdir),
        utility!(tail),
        utility!(touch),
        Utility {
            name: truefalse::TRUE_NAME,
            about: truefalse::TRUE_ABOUT,
            main: truefalse::run_true,
        },
        Utility {
            name: truefalse::FALSE_NAME,
            about: truefalse::FALSE_ABOUT,
            main: truefalse::run_false,
        },
        utility!(wc),
    ]
}

/// Opens an input operand; `-` reads the caller's stdin.
pub(crate) fn open_input<'b, R: Read + ?Sized>(
    stdin: &'b mut R,
    fs: &dyn FileSystem,
    operand: &str,
) -> Result<Box<dyn Read + 'b>> {
    if operand == "-" {
        return Ok(Box::new(stdin));
    }

    let path = Path::new(operand);
    let info = fs.metadata(path).map_err(|e| UtilError::io(operand, e))?;
    if info.kind == FileKind::Directory {
        return Err(UtilError::IsDirectory(operand.to_string()));
    }
    fs.open(path).map_err(|e| UtilError::io(operand, e))
}

/// Converts a count from the command line into an in-memory length. Counts
/// the host cannot address saturate instead of wrapping.
pub(crate) fn clamp_count(count: u64) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// One `read` call that retries on `Interrupted`. Returns 0 at end of input.
pub(crate) fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8], operand: &str) -> Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(UtilError::io(operand, e)),
        }
    }
}

/// Reads the next line, terminator included, into `line`. Returns false at
/// end of input.
pub(crate) fn read_line<R: BufRead + ?Sized>(reader: &mut R, line: &mut Vec<u8>, operand: &str) -> Result<bool> {
    line.clear();
    let n = reader
        .read_until(b'\n', line)
        .map_err(|e| UtilError::io(operand, e))?;
    Ok(n > 0)
}

/// Copies the rest of `reader` to `writer`.
pub(crate) fn copy_to_end<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    operand: &str,
) -> Result<()> {
    let mut buf = [0u8; 8192];
    loop {
        let n = read_chunk(reader, &mut buf, operand)?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n])?;
    }
}

/// Discards the next `count` lines without holding them in memory.
pub(crate) fn skip_lines<R: BufRead + ?Sized>(reader: &mut R, mut count: u64, operand: &str) -> Result<()> {
    while count > 0 {
        let (ended_line, used) = {
            let buf = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(UtilError::io(operand, e)),
            };
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(p) => (true, p + 1),
                None => (false, buf.len()),
            }
        };
        reader.consume(used);
        if ended_line {
            count -= 1;
        }
    }
    Ok(())
}

/// Discards the next `count` bytes.
pub(crate) fn skip_bytes<R: Read + ?Sized>(reader: &mut R, count: u64, operand: &str) -> Result<()> {
    let mut limited = reader.take(count);
    io::copy(&mut limited, &mut io::sink()).map_err(|e| UtilError::io(operand, e))?;
    Ok(())
}

/// Absolute, lexically normalised form of a guest path.
pub(crate) fn absolute(fs: &dyn FileSystem, path: &Path) -> PathBuf {
    normalize(&fs.cwd().join(path))
}

/// Splits `SOURCE... DEST` operands into `(source, target)` pairs. When
/// DEST is an existing directory every source lands inside it.
pub(crate) fn transfer_pairs(fs: &dyn FileSystem, operands: &[String]) -> Result<Vec<(String, String)>> {
    let (dest, sources) = match operands.split_last() {
        None => return Err(UtilError::usage("missing file operand")),
        Some((only, [])) => {
            return Err(UtilError::usage(format!(
                "missing destination file operand after {}",
                quote(only)
            )))
        }
        Some(split) => split,
    };

    let into_dir = fs
        .metadata(Path::new(dest))
        .map(|info| info.is_dir())
        .unwrap_or(false);
    if sources.len() > 1 && !into_dir {
        return Err(UtilError::TargetNotDirectory(dest.clone()));
    }

    Ok(sources
        .iter()
        .map(|source| {
            let target = if into_dir {
                match Path::new(source).file_name() {
                    Some(name) => Path::new(dest).join(name).display().to_string(),
                    None => dest.clone(),
                }
            } else {
                dest.clone()
            };
            (source.clone(), target)
        })
        .collect())
}

/// Quotes a name for diagnostics the way coreutils does with `'...'`.
pub(crate) fn quote(name: &str) -> String {
    format!("'{}'", name)
}

/// Parses a count such as `10`, `2K` or `1MB` as used by head and tail.
pub(crate) fn parse_count(text: &str) -> Option<u64> {
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, suffix) = text.split_at(split);
    if digits.is_empty() {
        return None;
    }

    let multiplier: u64 = match suffix {
        "" => 1,
        "b" => 512,
        "K" | "KiB" => 1024,
        "kB" | "KB" => 1000,
        "M" | "MiB" => 1024 * 1024,
        "MB" => 1000 * 1000,
        "G" | "GiB" => 1024 * 1024 * 1024,
        "GB" => 1000 * 1000 * 1000,
        _ => return None,
    };

    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Rewrites the historical `-NUM` shorthand into `-n NUM`.
pub(crate) fn expand_legacy_count(args: Vec<std::ffi::OsString>) -> Vec<std::ffi::OsString> {
    let mut out = Vec::with_capacity(args.len() + 1);
    let mut options_done = false;
    let mut expects_value = false;

    for (idx, arg) in args.into_iter().enumerate() {
        let text = arg.to_string_lossy();
        let is_value = std::mem::replace(
            &mut expects_value,
            matches!(text.as_ref(), "-n" | "-c" | "--lines" | "--bytes"),
        );
        if idx > 0 && !options_done && !is_value {
            if text == "--" {
                options_done = true;
            } else if text.len() > 1
                && text.starts_with('-')
                && text[1..].chars().all(|c| c.is_ascii_digit())
            {
                out.push("-n".into());
                out.push(text[1..].to_string().into());
                continue;
            }
        }
        out.push(arg);
    }
    out
}

/// Writes the `==> NAME <==` banner used by head and tail.
pub(crate) fn write_header<W: Write + ?Sized>(writer: &mut W, name: &str, first: bool) -> io::Result<()> {
    let display = if name == "-" { "standard input" } else { name };
    if !first {
        writer.write_all(b"\n")?;
    }
    writeln!(writer, "==> {} <==", display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("10"), Some(10));
        assert_eq!(parse_count("2K"), Some(2048));
        assert_eq!(parse_count("1kB"), Some(1000));
        assert_eq!(parse_count("3b"), Some(1536));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("K"), None);
        assert_eq!(parse_count("5X"), None);
    }

    #[test]
    fn test_expand_legacy_count() {
        let args: Vec<OsString> = ["head", "-5", "-n", "-2", "file", "--", "-3"]
            .iter()
            .map(OsString::from)
            .collect();
        let expanded: Vec<String> = expand_legacy_count(args)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(expanded, vec!["head", "-n", "5", "-n", "-2", "file", "--", "-3"]);
    }

    #[test]
    fn test_clamp_count_saturates() {
        assert_eq!(clamp_count(0), 0);
        assert_eq!(clamp_count(42), 42);
        assert_eq!(clamp_count(u64::MAX), usize::MAX);
    }

    #[test]
    fn test_skip_lines_across_small_buffers() {
        let data: &[u8] = b"one\ntwo\nthree\nfour";
        let mut reader = std::io::BufReader::with_capacity(2, data);
        skip_lines(&mut reader, 2, "-").unwrap();
        let mut rest = Vec::new();
        copy_to_end(&mut reader, &mut rest, "-").unwrap();
        assert_eq!(rest, b"three\nfour");

        let mut reader = std::io::BufReader::with_capacity(2, data);
        skip_lines(&mut reader, 10, "-").unwrap();
        let mut rest = Vec::new();
        copy_to_end(&mut reader, &mut rest, "-").unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn test_skip_bytes() {
        let mut reader: &[u8] = b"abcdef";
        skip_bytes(&mut reader, 4, "-").unwrap();
        assert_eq!(reader, b"ef");
    }

    #[test]
    fn test_every_utility_is_registered_once() {
        let utilities = all();
        let mut names: Vec<_> = utilities.iter().map(|u| u.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), utilities.len());
    }
}
