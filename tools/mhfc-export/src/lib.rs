//! mhfc-export library
//!
//! Converts editor scene snapshots to MHFC model, skeleton and animation files.

pub mod animation;
pub mod error;
pub mod manifest;
pub mod mesh;
pub mod output;
pub mod report;
pub mod scene;
pub mod skeleton;

// Re-export format definitions from mhfc-common
pub use mhfc_common::{
    AnimationVersion, ModelVersion, SkeletonVersion, ANIMATION_EXT, MODEL_EXT, SKELETON_EXT,
};

pub use error::{ErrorKind, ExportError, ExportResult};
pub use report::ExportReport;
pub use scene::SceneSnapshot;

// Re-export conversion entry points
pub use animation::{convert_animation_to_memory, AnimationOptions, ConvertedAnimation};
pub use mesh::{convert_model_to_memory, ConvertedModel, ModelOptions, TextureLocator};
pub use skeleton::{convert_skeleton_to_memory, ConvertedSkeleton, SkeletonOptions};
