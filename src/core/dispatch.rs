use crate::config::MulticallCli;
use crate::core::context::Context;
use crate::utils::error::{Result, UtilError};
use clap::Parser;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Name of the multicall binary itself.
pub const MULTICALL_NAME: &str = "coreutils";

/// Entry point of a utility. `args[0]` is the utility name.
pub type UtilMain = fn(&mut Context<'_>, Vec<OsString>) -> Result<i32>;

#[derive(Clone, Copy)]
pub struct Utility {
    pub name: &'static str,
    pub about: &'static str,
    pub main: UtilMain,
}

impl fmt::Debug for Utility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utility")
            .field("name", &self.name)
            .field("about", &self.about)
            .finish_non_exhaustive()
    }
}

/// A utility run requested on the process command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub utility: String,
    /// Arguments for the utility, starting with its name.
    pub args: Vec<OsString>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// What the process command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Request),
    /// `coreutils --list`
    List,
    /// The multicall name without a utility.
    Usage,
}

#[derive(Debug)]
pub struct Registry {
    utilities: Vec<Utility>,
}

impl Registry {
    pub fn new(mut utilities: Vec<Utility>) -> Self {
        utilities.sort_by_key(|u| u.name);
        utilities.dedup_by_key(|u| u.name);
        Self { utilities }
    }

    /// Registry holding every utility this crate ships.
    pub fn builtin() -> Self {
        Self::new(crate::app::commands::all())
    }

    pub fn lookup(&self, name: &str) -> Option<&Utility> {
        self.utilities
            .binary_search_by(|u| u.name.cmp(name))
            .ok()
            .map(|idx| &self.utilities[idx])
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.utilities.iter().map(|u| u.name)
    }

    pub fn utilities(&self) -> &[Utility] {
        &self.utilities
    }

    /// Resolves argv[0] first. Only when it is not a utility name does the
    /// multicall front end parse the arguments.
    pub fn resolve(&self, argv: Vec<OsString>) -> std::result::Result<Invocation, clap::Error> {
        let argv0 = argv
            .first()
            .cloned()
            .unwrap_or_else(|| OsString::from(MULTICALL_NAME));
        let name = invoked_name(&argv0);

        if self.lookup(&name).is_some() {
            return Ok(Invocation::Run(Request {
                utility: name,
                args: argv,
                config: None,
                verbose: false,
            }));
        }

        let cli = MulticallCli::try_parse_from(&argv)?;
        if cli.list {
            return Ok(Invocation::List);
        }
        let Some(utility) = cli.utility else {
            return Ok(Invocation::Usage);
        };

        let mut args = vec![OsString::from(&utility)];
        args.extend(cli.args);
        Ok(Invocation::Run(Request {
            utility,
            args,
            config: cli.config,
            verbose: cli.verbose,
        }))
    }

    /// Prints one utility name per line. A reader that goes away early is
    /// not an error.
    pub fn write_list<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let written = self
            .names()
            .try_for_each(|name| writeln!(out, "{}", name))
            .and_then(|()| out.flush());
        match written {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }

    /// Runs `name` and turns its outcome into an exit status, printing
    /// whatever diagnostic the outcome calls for.
    pub fn run(&self, ctx: &mut Context<'_>, name: &str, mut args: Vec<OsString>) -> i32 {
        let Some(utility) = self.lookup(name) else {
            tracing::warn!("Unknown utility requested: {}", name);
            ctx.report(MULTICALL_NAME, &UtilError::UnknownUtility(name.to_string()));
            return 1;
        };

        if args.is_empty() {
            args.push(OsString::from(name));
        }
        tracing::debug!("Dispatching {} with {} argument(s)", name, args.len() - 1);

        let code = match (utility.main)(ctx, args) {
            Ok(code) => code,
            Err(UtilError::Clap(err)) => {
                let rendered = err.render().to_string();
                let sink = if err.use_stderr() {
                    &mut *ctx.stderr
                } else {
                    &mut *ctx.stdout
                };
                let _ = sink.write_all(rendered.as_bytes());
                UtilError::Clap(err).exit_code()
            }
            Err(err) if err.is_broken_pipe() => {
                tracing::debug!("{}: stdout closed early", name);
                1
            }
            Err(err) => {
                tracing::debug!("{} failed ({:?}): {}", name, err.category(), err);
                let code = err.exit_code();
                ctx.report(name, &err);
                if matches!(err, UtilError::Usage(_)) {
                    let _ = writeln!(ctx.stderr, "Try '{} --help' for more information.", name);
                }
                code
            }
        };

        match ctx.stdout.flush() {
            Ok(()) => code,
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => code,
            Err(err) => {
                ctx.warn(name, &format!("write error: {}", crate::utils::error::describe_io(&err)));
                1
            }
        }
    }
}

/// Utility name implied by argv[0]: its file stem, so `/bin/cat.wasm`
/// and `cat.exe` both select `cat`.
pub fn invoked_name(argv0: &OsStr) -> String {
    let path = Path::new(argv0);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    for suffix in [".wasm", ".exe"] {
        if let Some(stem) = file_name.strip_suffix(suffix) {
            return stem.to_string();
        }
    }
    file_name
}

/// Parses utility arguments with clap, keeping help/version requests and
/// usage errors as `UtilError::Clap` so the dispatcher can render them.
pub fn parse_args<P: Parser>(args: &[OsString]) -> Result<P> {
    P::try_parse_from(args).map_err(UtilError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoked_name_strips_directories_and_suffixes() {
        assert_eq!(invoked_name(OsStr::new("/usr/bin/cat")), "cat");
        assert_eq!(invoked_name(OsStr::new("ls.wasm")), "ls");
        assert_eq!(invoked_name(OsStr::new("./bin/coreutils.exe")), "coreutils");
        assert_eq!(invoked_name(OsStr::new("coreutils")), "coreutils");
    }

    #[test]
    fn test_builtin_registry_is_sorted_and_searchable() {
        let registry = Registry::builtin();
        let names: Vec<_> = registry.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);

        for name in names {
            assert_eq!(registry.lookup(name).map(|u| u.name), Some(name));
        }
        assert!(registry.lookup("coreutils").is_none());
    }

    fn argv(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_resolve_by_invoked_name() {
        let registry = Registry::builtin();
        let invocation = registry.resolve(argv(&["/bin/cat.wasm", "-n", "file"])).unwrap();
        assert_eq!(
            invocation,
            Invocation::Run(Request {
                utility: "cat".to_string(),
                args: argv(&["/bin/cat.wasm", "-n", "file"]),
                config: None,
                verbose: false,
            })
        );
    }

    #[test]
    fn test_resolve_through_multicall_name() {
        let registry = Registry::builtin();
        let invocation = registry
            .resolve(argv(&["coreutils.wasm", "--verbose", "--config", "c.toml", "head", "-5"]))
            .unwrap();
        assert_eq!(
            invocation,
            Invocation::Run(Request {
                utility: "head".to_string(),
                args: argv(&["head", "-5"]),
                config: Some(PathBuf::from("c.toml")),
                verbose: true,
            })
        );
    }

    #[test]
    fn test_resolve_list_and_bare_multicall_name() {
        let registry = Registry::builtin();
        assert_eq!(registry.resolve(argv(&["coreutils", "--list"])).unwrap(), Invocation::List);
        assert_eq!(registry.resolve(argv(&["coreutils"])).unwrap(), Invocation::Usage);
        assert_eq!(registry.resolve(Vec::new()).unwrap(), Invocation::Usage);
        assert!(registry.resolve(argv(&["coreutils", "--bogus"])).is_err());
    }

    #[test]
    fn test_resolve_passes_unknown_utility_through() {
        let registry = Registry::builtin();
        match registry.resolve(argv(&["coreutils", "frobnicate", "x"])).unwrap() {
            Invocation::Run(request) => {
                assert_eq!(request.utility, "frobnicate");
                assert_eq!(request.args, argv(&["frobnicate", "x"]));
            }
            other => panic!("unexpected invocation: {:?}", other),
        }
    }

    #[test]
    fn test_write_list_is_sorted() {
        let registry = Registry::builtin();
        let mut out = Vec::new();
        registry.write_list(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let listed: Vec<&str> = text.lines().collect();
        let mut sorted = listed.clone();
        sorted.sort_unstable();
        assert_eq!(listed, sorted);
        assert_eq!(listed.len(), registry.utilities().len());
        assert!(listed.contains(&"cat"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_list_ignores_closed_reader() {
        let registry = Registry::builtin();
        assert!(registry.write_list(&mut ClosedPipe).is_ok());
    }
}
