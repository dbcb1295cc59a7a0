pub mod context;
pub mod dispatch;

pub use crate::domain::model::{DirEntry, FileInfo, FileKind, WriteMode};
pub use crate::domain::ports::FileSystem;
pub use crate::utils::error::Result;
pub use context::{Context, Environment};
pub use dispatch::{Registry, Utility};
