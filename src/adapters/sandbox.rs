//! Capability-checked host filesystem.
//!
//! Utilities see guest paths. A guest path is usable only when it lies
//! beneath one of the sandbox's preopens, mirroring how a WASI runtime
//! grants directory handles at start-up. Resolution is lexical: `.` and
//! `..` are folded before the preopen check, so `..` can never climb out
//! of a preopen.

use crate::config::toml_config::SandboxConfig;
use crate::domain::model::{normalize, DirEntry, FileInfo, WriteMode};
use crate::domain::ports::FileSystem;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    /// Same wording WASI libc uses for ENOTCAPABLE.
    #[error("Capabilities insufficient")]
    NotCapable { path: PathBuf },

    #[error("Read-only file system")]
    ReadOnly { path: PathBuf },
}

impl From<SandboxError> for io::Error {
    fn from(err: SandboxError) -> Self {
        io::Error::new(io::ErrorKind::PermissionDenied, err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preopen {
    pub guest: PathBuf,
    pub host: PathBuf,
}

impl Preopen {
    pub fn new(guest: impl Into<PathBuf>, host: impl Into<PathBuf>) -> Self {
        Self {
            guest: normalize(&guest.into()),
            host: host.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    cwd: PathBuf,
    preopens: Vec<Preopen>,
    read_only: bool,
}

impl Sandbox {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: normalize(&cwd.into()),
            preopens: Vec::new(),
            read_only: false,
        }
    }

    pub fn with_preopen(mut self, preopen: Preopen) -> Self {
        self.preopens.push(preopen);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Builds a sandbox from the `[sandbox]` config section. Without
    /// configured preopens the whole guest tree maps onto the host root.
    pub fn from_config(config: &SandboxConfig, default_cwd: PathBuf) -> Self {
        let cwd = config
            .cwd
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or(default_cwd);

        let mut sandbox = Sandbox::new(cwd).read_only(config.is_read_only());

        if config.preopens.is_empty() {
            sandbox = sandbox.with_preopen(Preopen::new("/", "/"));
        } else {
            for preopen in &config.preopens {
                let host = preopen.host.as_deref().unwrap_or(&preopen.guest);
                sandbox = sandbox.with_preopen(Preopen::new(&preopen.guest, host));
            }
        }

        tracing::debug!(
            "Sandbox ready: cwd={}, preopens={}, read_only={}",
            sandbox.cwd.display(),
            sandbox.preopens.len(),
            sandbox.read_only
        );
        sandbox
    }

    pub fn preopens(&self) -> &[Preopen] {
        &self.preopens
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Maps a guest path to the host path it names.
    pub fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.cwd.join(path))
        };

        let preopen = self
            .preopens
            .iter()
            .filter(|p| absolute.starts_with(&p.guest))
            .max_by_key(|p| p.guest.components().count());

        match preopen {
            Some(preopen) => {
                let rest = absolute.strip_prefix(&preopen.guest).unwrap_or(Path::new(""));
                if rest.as_os_str().is_empty() {
                    Ok(preopen.host.clone())
                } else {
                    Ok(preopen.host.join(rest))
                }
            }
            None => {
                tracing::debug!("Sandbox denied access to {}", absolute.display());
                Err(SandboxError::NotCapable { path: absolute }.into())
            }
        }
    }

    fn resolve_mut(&self, path: &Path) -> io::Result<PathBuf> {
        let host = self.resolve(path)?;
        if self.read_only {
            tracing::debug!("Sandbox rejected write to {}", path.display());
            return Err(SandboxError::ReadOnly {
                path: path.to_path_buf(),
            }
            .into());
        }
        Ok(host)
    }
}

impl FileSystem for Sandbox {
    fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn metadata(&self, path: &Path) -> io::Result<FileInfo> {
        let meta = fs::metadata(self.resolve(path)?)?;
        Ok(FileInfo::from_metadata(&meta))
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<FileInfo> {
        let meta = fs::symlink_metadata(self.resolve(path)?)?;
        Ok(FileInfo::from_metadata(&meta))
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(self.resolve(path)?)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        let file = File::open(self.resolve(path)?)?;
        Ok(Box::new(file))
    }

    fn create(&self, path: &Path, mode: WriteMode) -> io::Result<Box<dyn Write>> {
        let host = self.resolve_mut(path)?;
        let mut options = OpenOptions::new();
        match mode {
            WriteMode::Truncate => options.write(true).create(true).truncate(true),
            WriteMode::Append => options.append(true).create(true),
            WriteMode::CreateNew => options.write(true).create_new(true),
        };
        Ok(Box::new(options.open(host)?))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.resolve(path)?)? {
            let entry = entry?;
            let info = FileInfo::from_metadata(&entry.metadata()?);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                info,
            });
        }
        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(self.resolve_mut(path)?)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(self.resolve_mut(path)?)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(self.resolve_mut(path)?)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(self.resolve_mut(from)?, self.resolve_mut(to)?)
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        let host = self.resolve_mut(path)?;
        let file = if fs::metadata(&host)?.is_dir() {
            File::open(&host)?
        } else {
            OpenOptions::new().write(true).open(&host)?
        };
        file.set_modified(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::PreopenConfig;

    fn sandbox() -> Sandbox {
        Sandbox::new("/work/project")
            .with_preopen(Preopen::new("/work", "/srv/guest-work"))
            .with_preopen(Preopen::new("/work/shared", "/mnt/shared"))
    }

    #[test]
    fn test_normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../../etc")), PathBuf::from("/etc"));
        assert_eq!(normalize(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn test_resolve_relative_to_cwd() {
        let host = sandbox().resolve(Path::new("src/main.rs")).unwrap();
        assert_eq!(host, PathBuf::from("/srv/guest-work/project/src/main.rs"));
    }

    #[test]
    fn test_resolve_prefers_longest_preopen() {
        let host = sandbox().resolve(Path::new("/work/shared/data.txt")).unwrap();
        assert_eq!(host, PathBuf::from("/mnt/shared/data.txt"));
    }

    #[test]
    fn test_resolve_preopen_root() {
        let host = sandbox().resolve(Path::new("/work")).unwrap();
        assert_eq!(host, PathBuf::from("/srv/guest-work"));
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let err = sandbox().resolve(Path::new("../../etc/passwd")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(err.to_string(), "Capabilities insufficient");
    }

    #[test]
    fn test_read_only_blocks_mutation() {
        let sandbox = sandbox().read_only(true);
        let err = sandbox.create_dir(Path::new("new-dir")).unwrap_err();
        assert_eq!(err.to_string(), "Read-only file system");
    }

    #[test]
    fn test_from_config_defaults_to_host_root() {
        let config = SandboxConfig::default();
        let sandbox = Sandbox::from_config(&config, PathBuf::from("/home/user"));
        assert_eq!(sandbox.preopens(), &[Preopen::new("/", "/")]);
        assert_eq!(sandbox.cwd(), Path::new("/home/user"));
        assert!(!sandbox.is_read_only());
    }

    #[test]
    fn test_from_config_applies_section() {
        let config = SandboxConfig {
            cwd: Some("/data".to_string()),
            read_only: Some(true),
            env_allow: Vec::new(),
            preopens: vec![PreopenConfig {
                guest: "/data".to_string(),
                host: Some("/srv/data".to_string()),
            }],
        };
        let sandbox = Sandbox::from_config(&config, PathBuf::from("/ignored"));
        assert!(sandbox.is_read_only());
        assert_eq!(sandbox.cwd(), Path::new("/data"));
        assert_eq!(sandbox.preopens(), &[Preopen::new("/data", "/srv/data")]);
        let err = sandbox.remove_file(Path::new("x")).unwrap_err();
        assert_eq!(err.to_string(), "Read-only file system");
    }
}
