mod common;

use common::Harness;
use coreutils::{Context, Registry};
use std::ffi::OsString;
use std::io::{self, Write};

#[test]
fn test_every_utility_dispatches() {
    let h = Harness::new();
    let names: Vec<&str> = h.registry.names().collect();
    assert!(names.len() >= 18);

    for name in names {
        let out = h.run(&[name, "--version"]);
        match name {
            "true" => assert_eq!(out.code, 0),
            "false" => assert_eq!(out.code, 1),
            _ => {
                assert_eq!(out.code, 0, "{} --version", name);
                assert!(out.stdout_str().starts_with(name), "{}", out.stdout_str());
            }
        }
    }
}

#[test]
fn test_help_goes_to_stdout() {
    let h = Harness::new();

    let out = h.run(&["cat", "--help"]);

    assert_eq!(out.code, 0);
    assert!(out.stdout_str().contains("Usage: cat"));
    assert!(out.stderr.is_empty());
}

#[test]
fn test_usage_errors_go_to_stderr() {
    let h = Harness::new();

    let out = h.run(&["cat", "--no-such-flag"]);

    assert_eq!(out.code, 1);
    assert!(out.stdout.is_empty());
    assert!(out.stderr_str().contains("--no-such-flag"));
}

#[test]
fn test_missing_operand_names_the_utility_in_help_hint() {
    let h = Harness::new();

    let out = h.run(&["rm"]);
    assert_eq!(out.code, 1);
    assert_eq!(
        out.stderr_str(),
        "rm: missing operand\nTry 'rm --help' for more information.\n"
    );

    let out = h.run(&["mv", "a"]);
    assert_eq!(
        out.stderr_str(),
        "mv: missing destination file operand after 'a'\nTry 'mv --help' for more information.\n"
    );
}

#[test]
fn test_unknown_utility() {
    let h = Harness::new();

    let out = h.run(&["frobnicate"]);

    assert_eq!(out.code, 1);
    assert_eq!(out.stderr_str(), "coreutils: unknown utility 'frobnicate'\n");
}

#[test]
fn test_true_and_false_ignore_arguments() {
    let h = Harness::new();

    assert_eq!(h.run(&["true", "--bogus", "x"]).code, 0);
    assert_eq!(h.run(&["false", "--bogus", "x"]).code, 1);
}

#[test]
fn test_env_prints_environment() {
    let h = Harness::new();

    assert_eq!(h.run(&["env"]).stdout_str(), "HOME=/home/guest\nLANG=C\n");
    assert_eq!(h.run(&["env", "-u", "HOME"]).stdout_str(), "LANG=C\n");
    assert_eq!(h.run(&["env", "-i", "A=1", "B=x=y"]).stdout_str(), "A=1\nB=x=y\n");
    assert_eq!(h.run(&["env", "-", "C=3"]).stdout_str(), "C=3\n");
}

#[test]
fn test_env_runs_utility_in_process() {
    let h = Harness::new();
    h.write("f.txt", b"one\ntwo\n");

    let out = h.run(&["env", "LANG=fr", "head", "-n", "1", "f.txt"]);
    assert_eq!(out.code, 0);
    assert_eq!(out.stdout_str(), "one\n");

    let out = h.run(&["env", "-i", "X=1", "env"]);
    assert_eq!(out.stdout_str(), "X=1\n");

    let out = h.run(&["env", "false"]);
    assert_eq!(out.code, 1);
}

#[test]
fn test_env_unknown_utility_exits_127() {
    let h = Harness::new();

    let out = h.run(&["env", "A=1", "no-such-tool"]);

    assert_eq!(out.code, 127);
    assert_eq!(out.stderr_str(), "env: 'no-such-tool': No such file or directory\n");
}

/// Stdout whose reader has gone away.
struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_broken_pipe_exits_quietly() {
    let h = Harness::new();
    h.write("f.txt", b"data\n");
    let registry = Registry::builtin();

    let mut stdin: &[u8] = b"";
    let mut stdout = ClosedPipe;
    let mut stderr = Vec::new();
    let mut ctx = Context {
        stdin: &mut stdin,
        stdout: &mut stdout,
        stderr: &mut stderr,
        fs: &h.sandbox,
        env: &h.env,
        registry: &registry,
        interactive: false,
    };

    let args = vec![OsString::from("cat"), OsString::from("f.txt")];
    let code = registry.run(&mut ctx, "cat", args);

    assert_eq!(code, 1);
    assert!(stderr.is_empty());
}
