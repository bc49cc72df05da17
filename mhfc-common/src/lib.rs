//! Shared types for the MHFC asset formats
//!
//! Holds everything the model, skeleton and animation writers agree on: the
//! big-endian [`BinaryWriter`], magic tags, hard caps, body versions and the
//! asset-location conventions used to name files and textures.

pub mod formats;
pub mod location;

pub use formats::*;
pub use location::{asset_to_dir, format_template, image_stem, LocationError, DEFAULT_MOD_ID};
