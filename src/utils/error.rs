use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UtilError {
    #[error("{path}: {}", describe_io(.source))]
    Io { path: String, source: io::Error },

    #[error("{}", describe_io(.0))]
    Output(io::Error),

    #[error("{0}: Is a directory")]
    IsDirectory(String),

    #[error("{0}: unknown filetype")]
    UnknownFiletype(String),

    /// Printed with a `Try 'NAME --help'` hint by the dispatcher.
    #[error("{0}")]
    Usage(String),

    #[error("target '{0}' is not a directory")]
    TargetNotDirectory(String),

    #[error("{0}")]
    Clap(#[from] clap::Error),

    #[error("unknown utility '{0}'")]
    UnknownUtility(String),

    #[error("encountered {0} errors")]
    EncounteredErrors(usize),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    Input,
    Output,
    Dispatch,
    Config,
}

impl UtilError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        UtilError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        UtilError::Usage(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            UtilError::Io { .. }
            | UtilError::IsDirectory(_)
            | UtilError::UnknownFiletype(_)
            | UtilError::EncounteredErrors(_) => ErrorCategory::Input,
            UtilError::Output(_) => ErrorCategory::Output,
            UtilError::Usage(_) | UtilError::TargetNotDirectory(_) | UtilError::Clap(_) => {
                ErrorCategory::Usage
            }
            UtilError::UnknownUtility(_) => ErrorCategory::Dispatch,
            UtilError::ConfigError { .. }
            | UtilError::InvalidConfigValueError { .. } => ErrorCategory::Config,
        }
    }

    /// Exit status reported to the caller when this error ends a utility.
    pub fn exit_code(&self) -> i32 {
        match self {
            UtilError::Clap(e) if !e.use_stderr() => 0,
            _ => 1,
        }
    }

    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, UtilError::Output(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

impl From<io::Error> for UtilError {
    fn from(err: io::Error) -> Self {
        UtilError::Output(err)
    }
}

/// Renders an I/O error the way coreutils prints it: the strerror text
/// without Rust's `(os error N)` suffix.
pub fn describe_io(err: &io::Error) -> String {
    use io::ErrorKind::*;

    if err.raw_os_error().is_none() {
        if let Some(inner) = err.get_ref() {
            return inner.to_string();
        }
    }

    match err.kind() {
        NotFound => "No such file or directory".to_string(),
        PermissionDenied => "Permission denied".to_string(),
        AlreadyExists => "File exists".to_string(),
        BrokenPipe => "Broken pipe".to_string(),
        _ => {
            let text = err.to_string();
            match text.find(" (os error ") {
                Some(idx) => text[..idx].to_string(),
                None => text,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, UtilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_io_strips_os_error_suffix() {
        let err = io::Error::from_raw_os_error(2);
        assert_eq!(describe_io(&err), "No such file or directory");
    }

    #[test]
    fn test_describe_io_uses_custom_message() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "Capabilities insufficient");
        assert_eq!(describe_io(&err), "Capabilities insufficient");
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = UtilError::io("missing.txt", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.to_string(), "missing.txt: No such file or directory");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_usage_errors_are_categorised() {
        let err = UtilError::usage("missing operand");
        assert_eq!(err.to_string(), "missing operand");
        assert_eq!(err.category(), ErrorCategory::Usage);

        let err = UtilError::TargetNotDirectory("dest".to_string());
        assert_eq!(err.to_string(), "target 'dest' is not a directory");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_broken_pipe_detection() {
        let err = UtilError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(err.is_broken_pipe());
        assert_eq!(err.category(), ErrorCategory::Output);
    }
}
