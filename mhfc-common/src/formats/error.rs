use std::io;

/// Failures while encoding an MHFC document
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("string {0:?} contains an embedded NUL byte")]
    EmbeddedNul(String),

    #[error("unknown {kind} version {version:?}")]
    UnknownVersion { kind: &'static str, version: String },

    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}
