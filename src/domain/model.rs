use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Unknown,
}

impl FileKind {
    pub fn from_file_type(ft: fs::FileType) -> Self {
        if ft.is_symlink() {
            return FileKind::Symlink;
        }
        if ft.is_dir() {
            return FileKind::Directory;
        }
        if ft.is_file() {
            return FileKind::File;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;

            if ft.is_block_device() {
                return FileKind::BlockDevice;
            }
            if ft.is_char_device() {
                return FileKind::CharDevice;
            }
            if ft.is_fifo() {
                return FileKind::Fifo;
            }
            if ft.is_socket() {
                return FileKind::Socket;
            }
        }

        FileKind::Unknown
    }

    /// Leading character of an `ls -l` mode string.
    pub fn type_char(self) -> char {
        match self {
            FileKind::File | FileKind::Unknown => '-',
            FileKind::Directory => 'd',
            FileKind::Symlink => 'l',
            FileKind::BlockDevice => 'b',
            FileKind::CharDevice => 'c',
            FileKind::Fifo => 'p',
            FileKind::Socket => 's',
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub kind: FileKind,
    pub len: u64,
    pub modified: Option<SystemTime>,
    pub readonly: bool,
    /// Permission bits when the platform exposes them.
    pub mode: Option<u32>,
}

impl FileInfo {
    pub fn from_metadata(meta: &fs::Metadata) -> Self {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(meta.permissions().mode())
        };
        #[cfg(not(unix))]
        let mode = None;

        Self {
            kind: FileKind::from_file_type(meta.file_type()),
            len: meta.len(),
            modified: meta.modified().ok(),
            readonly: meta.permissions().readonly(),
            mode,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// `drwxr-xr-x` style mode string. Without real permission bits the
    /// string is derived from the read-only flag.
    pub fn mode_string(&self) -> String {
        let mut out = String::with_capacity(10);
        out.push(self.kind.type_char());

        let bits = match self.mode {
            Some(mode) => mode & 0o777,
            None => match (self.kind, self.readonly) {
                (FileKind::Directory, false) => 0o755,
                (FileKind::Directory, true) => 0o555,
                (_, false) => 0o644,
                (_, true) => 0o444,
            },
        };

        for shift in [6, 3, 0] {
            let triple = (bits >> shift) & 0o7;
            out.push(if triple & 0o4 != 0 { 'r' } else { '-' });
            out.push(if triple & 0o2 != 0 { 'w' } else { '-' });
            out.push(if triple & 0o1 != 0 { 'x' } else { '-' });
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub info: FileInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
    CreateNew,
}

/// Folds `.` and `..` without touching the filesystem. The result is
/// always absolute; `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
