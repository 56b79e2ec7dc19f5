use std::path::PathBuf;

use thiserror::Error;

use crate::event::MessageId;

#[derive(Error, Debug)]
pub enum SplitpackError {
    #[error("no input file or directory selected")]
    InputMissing,

    #[error("output directory does not exist: {}", path.display())]
    OutputDirectoryMissing { path: PathBuf },

    /// Stat or walk failure. `partial_bytes` is what was counted before it.
    #[error("cannot size {}: {source}", path.display())]
    SizeProbe {
        path: PathBuf,
        partial_bytes: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("archiver failed on {} (exit {}): {diagnostic}", path.display(), code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    ArchiveInvocation {
        path: PathBuf,
        code: Option<i32>,
        diagnostic: String,
    },

    #[error("cannot start archiver {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write manifest {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read manifest {}: {reason}", path.display())]
    ManifestRead { path: PathBuf, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SplitpackError {
    /// Message that reports this error to the user.
    pub fn message_id(&self) -> MessageId {
        match self {
            Self::InputMissing => MessageId::SelectInput,
            Self::OutputDirectoryMissing { .. } => MessageId::OutputDirMissing,
            Self::ArchiveInvocation { .. } | Self::Spawn { .. } => MessageId::FailedCompress,
            _ => MessageId::FailedCopy,
        }
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, SplitpackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_errors_report_as_failed_compress() {
        let e = SplitpackError::ArchiveInvocation {
            path: PathBuf::from("/data/a"),
            code: Some(2),
            diagnostic: "disk full".into(),
        };
        assert_eq!(e.message_id(), MessageId::FailedCompress);
        let text = e.to_string();
        assert!(text.contains("exit 2"));
        assert!(text.contains("disk full"));
    }

    #[test]
    fn killed_archiver_has_no_exit_code() {
        let e = SplitpackError::ArchiveInvocation {
            path: PathBuf::from("a"),
            code: None,
            diagnostic: String::new(),
        };
        assert!(e.to_string().contains("exit signal"));
    }

    #[test]
    fn manifest_failures_report_as_failed_copy() {
        let e = SplitpackError::ManifestWrite {
            path: PathBuf::from("info.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(e.message_id(), MessageId::FailedCopy);
        assert_eq!(SplitpackError::InputMissing.message_id(), MessageId::SelectInput);
    }
}
