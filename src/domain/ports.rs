use crate::domain::model::{DirEntry, FileInfo, WriteMode};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Filesystem access as seen by a utility. Paths are guest paths; the
/// implementation decides whether and where they exist on the host.
pub trait FileSystem {
    /// Working directory that relative paths are resolved against.
    fn cwd(&self) -> &Path;

    fn metadata(&self, path: &Path) -> io::Result<FileInfo>;
    fn symlink_metadata(&self, path: &Path) -> io::Result<FileInfo>;
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>>;
    fn create(&self, path: &Path, mode: WriteMode) -> io::Result<Box<dyn Write>>;

    /// Entries of a directory, excluding `.` and `..`, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;
    fn create_dir(&self, path: &Path) -> io::Result<()>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool {
        self.symlink_metadata(path).is_ok()
    }
}
