use crate::core::dispatch::parse_args;
use crate::core::{Context, Result};
use crate::utils::error::UtilError;
use clap::Parser;
use std::ffi::OsString;

pub const NAME: &str = "basename";
pub const ABOUT: &str = "Print NAME with any leading directory components removed";

#[derive(Debug, Parser)]
#[command(name = NAME, version, about = ABOUT)]
#[command(override_usage = "basename NAME [SUFFIX]\n       basename OPTION... NAME...")]
struct Args {
    /// support multiple arguments and treat each as a NAME
    #[arg(short = 'a', long = "multiple")]
    multiple: bool,

    /// remove a trailing SUFFIX; implies -a
    #[arg(short = 's', long = "suffix", value_name = "SUFFIX")]
    suffix: Option<String>,

    /// end each output line with NUL, not newline
    #[arg(short = 'z', long = "zero")]
    zero: bool,

    #[arg(value_name = "NAME")]
    names: Vec<String>,
}

/// Last path component of `name`, minus `suffix` when it is a proper suffix.
pub fn basename(name: &str, suffix: Option<&str>) -> String {
    if name.is_empty() {
        return String::new();
    }

    let trimmed = name.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let base = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };

    match suffix {
        Some(suffix) if !suffix.is_empty() && base != suffix => {
            base.strip_suffix(suffix).unwrap_or(base).to_string()
        }
        _ => base.to_string(),
    }
}

pub fn run(ctx: &mut Context<'_>, args: Vec<OsString>) -> Result<i32> {
    let args: Args = parse_args(&args)?;

    if args.names.is_empty() {
        return Err(UtilError::usage("missing operand"));
    }

    let multiple = args.multiple || args.suffix.is_some();
    let (names, suffix): (&[String], Option<&str>) = if multiple {
        (&args.names, args.suffix.as_deref())
    } else {
        match args.names.len() {
            1 => (&args.names[..1], None),
            2 => (&args.names[..1], Some(args.names[1].as_str())),
            _ => {
                return Err(UtilError::usage(format!(
                    "extra operand '{}'",
                    args.names[2]
                )))
            }
        }
    };

    let terminator: &[u8] = if args.zero { b"\0" } else { b"\n" };
    for name in names {
        ctx.stdout.write_all(basename(name, suffix).as_bytes())?;
        ctx.stdout.write_all(terminator)?;
    }
    Ok(0)
}
