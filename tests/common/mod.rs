#![allow(dead_code)]

use coreutils::{Context, Environment, Preopen, Registry, Sandbox};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Captured result of one utility run.
pub struct Output {
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Output {
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// A temporary directory exposed as the only preopen, with the sandbox
/// working directory at its root.
pub struct Harness {
    pub dir: TempDir,
    pub sandbox: Sandbox,
    pub env: Environment,
    pub registry: Registry,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_read_only(false)
    }

    pub fn with_read_only(read_only: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let sandbox = Sandbox::new(&root)
            .with_preopen(Preopen::new(&root, &root))
            .read_only(read_only);

        Self {
            dir,
            sandbox,
            env: [("HOME", "/home/guest"), ("LANG", "C")].into_iter().collect(),
            registry: Registry::builtin(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn mkdir(&self, relative: &str) {
        std::fs::create_dir_all(self.path(relative)).unwrap();
    }

    pub fn read(&self, relative: &str) -> Vec<u8> {
        std::fs::read(self.path(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).symlink_metadata().is_ok()
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.run_with_stdin(args, b"")
    }

    pub fn run_with_stdin(&self, args: &[&str], stdin: &[u8]) -> Output {
        let mut input = stdin;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let args: Vec<OsString> = args.iter().map(OsString::from).collect();
        let name = args[0].to_string_lossy().into_owned();

        let mut ctx = Context {
            stdin: &mut input,
            stdout: &mut stdout,
            stderr: &mut stderr,
            fs: &self.sandbox,
            env: &self.env,
            registry: &self.registry,
            interactive: false,
        };
        let code = self.registry.run(&mut ctx, &name, args);

        Output {
            code,
            stdout,
            stderr,
        }
    }
}
