use crate::core::dispatch::Registry;
use crate::domain::ports::FileSystem;
use crate::utils::error::UtilError;
use std::io::{Read, Write};

/// Environment variables visible to utilities, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: Vec<(String, String)>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process environment. An empty allowlist keeps
    /// every variable.
    pub fn capture(allow: &[String]) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .filter(|(name, _)| allow.is_empty() || allow.iter().any(|a| a == name))
            .collect();
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.vars.retain(|(n, _)| n != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut env = Environment::new();
        for (name, value) in iter {
            env.set(name, value);
        }
        env
    }
}

/// Everything a utility may touch during one invocation.
pub struct Context<'a> {
    pub stdin: &'a mut dyn Read,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
    pub fs: &'a dyn FileSystem,
    pub env: &'a Environment,
    pub registry: &'a Registry,
    /// Whether stdin is an interactive terminal.
    pub interactive: bool,
}

impl Context<'_> {
    /// Prints a non-fatal diagnostic as `UTIL: MESSAGE`.
    pub fn report(&mut self, util: &str, err: &UtilError) {
        report(&mut *self.stderr, util, err);
    }

    /// Prints a free-form diagnostic as `UTIL: MESSAGE`.
    pub fn warn(&mut self, util: &str, message: &str) {
        warn(&mut *self.stderr, util, message);
    }
}

/// Same as [`Context::report`], for callers that hold a borrow of another
/// context field such as stdin.
pub fn report(stderr: &mut dyn Write, util: &str, err: &UtilError) {
    tracing::debug!("{} reported error: {:?}", util, err);
    let _ = writeln!(stderr, "{}: {}", util, err);
}

pub fn warn(stderr: &mut dyn Write, util: &str, message: &str) {
    let _ = writeln!(stderr, "{}: {}", util, message);
}
