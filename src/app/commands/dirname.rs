use crate::core::dispatch::parse_args;
use crate::core::{Context, Result};
use crate::utils::error::UtilError;
use clap::Parser;
use std::ffi::OsString;

pub const NAME: &str = "dirname";
pub const ABOUT: &str = "Output each NAME with its last non-slash component and trailing slashes removed";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
struct Args {
    /// end each output line with NUL, not newline
    #[arg(short = 'z', long = "zero")]
    zero: bool,

    #[arg(value_name = "NAME")]
    names: Vec<String>,
}

pub fn dirname(name: &str) -> String {
    let trimmed = name.trim_end_matches('/');
    if trimmed.is_empty() {
        return if name.starts_with('/') { "/" } else { "." }.to_string();
    }

    match trimmed.rfind('/') {
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches('/');
            if parent.is_empty() {
                "/".to_string()
            } else {
                parent.to_string()
            }
        }
        None => ".".to_string(),
    }
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;

    if args.names.is_empty() {
        return Err(UtilError::usage("missing operand"));
    }

    let terminator: &[u8] = if args.zero { b"\0" } else { b"\n" };
    for name in &args.names {
        ctx.stdout.write_all(dirname(name).as_bytes())?;
        ctx.stdout.write_all(terminator)?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("/usr/bin/"), "/usr");
        assert_eq!(dirname("dir1/str"), "dir1");
        assert_eq!(dirname("stdio.h"), ".");
        assert_eq!(dirname("/etc"), "/");
        assert_eq!(dirname("//"), "/");
        assert_eq!(dirname("a//b"), "a");
        assert_eq!(dirname(""), ".");
    }
}
