//! Model export (mesh -> .mcmd)

mod material;
mod model;
mod part;
mod point;

pub use material::{Material, MaterialRegistry, TextureLocator};
pub use model::{
    build_model, convert_model, convert_model_to_memory, ConvertedModel, Model, ModelBody,
    ModelOptions,
};
pub use part::{MaterialRef, Part};
pub use point::{Binding, Corner, NoSkin, Point, SkinLookup, POINT_EPSILON};
