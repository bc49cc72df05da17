//! Export errors
//!
//! Every error aborts the document being exported. [`ExportError::kind`] tells
//! apart input the caller has to fix, broken codec invariants and I/O failures.

use std::io;
use std::path::PathBuf;

use mhfc_common::{FormatError, LocationError};

pub type ExportResult<T> = Result<T, ExportError>;

/// Who is responsible for an [`ExportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input can't be exported as given
    Data,
    /// An invariant of the codec itself broke
    Internal,
    /// Reading or writing a file failed
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("too many parts: {0} (maximum is 255)")]
    TooManyParts(usize),

    #[error("too many bones: {0} (maximum is 255)")]
    TooManyBones(usize),

    #[error("too many materials: {0} (maximum is 255)")]
    TooManyMaterials(usize),

    #[error("too many points in part '{part}': {count} (maximum is 65535)")]
    TooManyPoints { part: String, count: usize },

    #[error("too many triangles in part '{part}': {count} (maximum is 65535)")]
    TooManyTriangles { part: String, count: usize },

    #[error("too many keyframes in curve '{curve}': {count} (maximum is 65535)")]
    TooManyKeyframes { curve: String, count: usize },

    #[error("unknown interpolation mode '{mode}' in curve '{curve}'")]
    UnknownInterpolation { curve: String, mode: String },

    #[error("unknown extrapolation mode '{mode}' in curve '{curve}'")]
    UnknownExtrapolation { curve: String, mode: String },

    #[error("keyframe {keyframe} of curve '{curve}' has no {side} handle")]
    MissingHandle {
        curve: String,
        keyframe: usize,
        side: &'static str,
    },

    #[error("mesh has no UV layer")]
    MissingUvLayer,

    #[error("face {face} has {corners} corners, at least 3 are needed")]
    DegenerateFace { face: usize, corners: usize },

    #[error("render group '{0}' has the same name as the default group")]
    DuplicateGroupName(String),

    #[error("invalid material reference: {0}")]
    InvalidMaterial(String),

    #[error("bone name '{0}' is used more than once")]
    DuplicateBone(String),

    #[error("bone '{bone}' has parent '{parent}' which is not in the armature")]
    UnknownParent { bone: String, parent: String },

    #[error("bone '{bone}': bind pose of '{matrix}' is singular")]
    SingularBindPose { bone: String, matrix: String },

    #[error("bone '{0}' is its own ancestor")]
    CyclicHierarchy(String),

    #[error("scene has no {0}")]
    MissingInput(&'static str),

    #[error("action '{0}' not found in scene")]
    UnknownAction(String),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("internal exporter error: {0}")]
    Internal(String),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::Internal(_) => ErrorKind::Internal,
            ExportError::Io { .. } | ExportError::Format(FormatError::Io(_)) => ErrorKind::Io,
            _ => ErrorKind::Data,
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        ExportError::Internal(message.into())
    }
}
