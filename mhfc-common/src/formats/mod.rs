//! Binary format definitions for MHFC asset files
//!
//! All three documents share one shape:
//!
//! ```text
//! magic    [u8; 8]   "MHFC MDL" | "MHFC SKL" | "MHFC ANM"
//! uuid     [u32; 4]  model and skeleton only
//! artist   string    UTF-8 + NUL
//! version  u32       u8 for animations
//! body               dispatched on version
//! ```
//!
//! Every integer and float is big-endian.

mod error;
mod header;
mod version;
mod writer;

pub use error::FormatError;
pub use header::{mask_uuid, DocumentHeader};
pub use version::{AnimationVersion, ModelVersion, SkeletonVersion};
pub use writer::BinaryWriter;

pub const MODEL_MAGIC: &[u8; 8] = b"MHFC MDL";
pub const SKELETON_MAGIC: &[u8; 8] = b"MHFC SKL";
pub const ANIMATION_MAGIC: &[u8; 8] = b"MHFC ANM";

pub const MODEL_EXT: &str = "mcmd";
pub const SKELETON_EXT: &str = "mcskl";
pub const ANIMATION_EXT: &str = "mcanm";

/// Part count is stored as u8
pub const MAX_PARTS: usize = u8::MAX as usize;
/// Bone count is stored as u8, 0xFF is reserved for "no parent"
pub const MAX_BONES: usize = u8::MAX as usize;
/// Material ordinals are stored as u8
pub const MAX_MATERIALS: usize = u8::MAX as usize;
/// Point count per part is stored as u16
pub const MAX_POINTS: usize = u16::MAX as usize;
/// Triangle count per part is stored as u16
pub const MAX_TRIANGLES: usize = u16::MAX as usize;
/// Keyframe count per curve is stored as u16
pub const MAX_KEYFRAMES: usize = u16::MAX as usize;
/// Bindings written per point
pub const MAX_BINDINGS: usize = 4;

/// Parent index of a root bone
pub const NO_PARENT: u8 = 0xFF;
/// Terminates a binding list shorter than [`MAX_BINDINGS`]
pub const BINDING_END: u8 = 0xFF;

/// Lead-in code written before the first segment of every curve
pub const TUNE_IN_LINEAR: u8 = 0;
pub const INTERPOLATION_CONSTANT: u8 = 8;
pub const INTERPOLATION_LINEAR: u8 = 9;
pub const INTERPOLATION_BEZIER: u8 = 10;
pub const EXTRAPOLATION_CONSTANT: u8 = 16;
pub const EXTRAPOLATION_LINEAR: u8 = 17;
