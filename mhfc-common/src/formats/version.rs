//! Body format versions
//!
//! Versions are resolved while a document is being set up, so an unknown
//! version fails before any byte is written.

use std::fmt;
use std::str::FromStr;

use super::FormatError;

/// Parse "V2", "v2" or "2"
fn parse_version_number(s: &str) -> Option<u32> {
    let digits = s
        .strip_prefix('V')
        .or_else(|| s.strip_prefix('v'))
        .unwrap_or(s);
    digits.parse().ok()
}

fn unknown(kind: &'static str, version: impl fmt::Display) -> FormatError {
    FormatError::UnknownVersion {
        kind,
        version: version.to_string(),
    }
}

/// Model body layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelVersion {
    /// Parts reference their texture inline, bones are embedded
    V1,
    /// Parts reference an interned material table, no bones
    #[default]
    V2,
}

impl ModelVersion {
    pub const fn number(self) -> u32 {
        match self {
            ModelVersion::V1 => 1,
            ModelVersion::V2 => 2,
        }
    }

    pub fn from_number(number: u32) -> Result<Self, FormatError> {
        match number {
            1 => Ok(ModelVersion::V1),
            2 => Ok(ModelVersion::V2),
            other => Err(unknown("model", other)),
        }
    }
}

impl FromStr for ModelVersion {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version_number(s)
            .ok_or_else(|| unknown("model", s))
            .and_then(Self::from_number)
            .map_err(|_| unknown("model", s))
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.number())
    }
}

/// Skeleton body layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkeletonVersion {
    #[default]
    V1,
}

impl SkeletonVersion {
    pub const fn number(self) -> u32 {
        match self {
            SkeletonVersion::V1 => 1,
        }
    }
}

impl FromStr for SkeletonVersion {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_version_number(s) {
            Some(1) => Ok(SkeletonVersion::V1),
            _ => Err(unknown("skeleton", s)),
        }
    }
}

/// Animation body layout (stored as u8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationVersion {
    #[default]
    V1,
}

impl AnimationVersion {
    pub const fn number(self) -> u8 {
        match self {
            AnimationVersion::V1 => 1,
        }
    }
}

impl FromStr for AnimationVersion {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_version_number(s) {
            Some(1) => Ok(AnimationVersion::V1),
            _ => Err(unknown("animation", s)),
        }
    }
}
