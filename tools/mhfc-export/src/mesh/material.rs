//! Material table of V2 models

use hashbrown::HashMap;
use std::io::Write;

use mhfc_common::{format_template, image_stem, BinaryWriter, FormatError, MAX_MATERIALS};

use crate::error::{ExportError, ExportResult};

/// Turns an image stem into the resource location the runtime loads
#[derive(Debug, Clone)]
pub struct TextureLocator {
    template: String,
    mod_id: String,
    model_name: String,
}

impl TextureLocator {
    /// Placeholders: `{modid}`, `{modelname}`, `{texname}`
    pub fn new(
        template: impl Into<String>,
        mod_id: impl Into<String>,
        model_name: impl Into<String>,
    ) -> ExportResult<Self> {
        let locator = Self {
            template: template.into(),
            mod_id: mod_id.into(),
            model_name: model_name.into(),
        };
        // surface template mistakes before anything is built
        locator.locate("texture")?;
        Ok(locator)
    }

    pub fn locate(&self, stem: &str) -> ExportResult<String> {
        Ok(format_template(
            &self.template,
            &[
                ("modid", self.mod_id.as_str()),
                ("modelname", self.model_name.as_str()),
                ("texname", stem),
            ],
        )?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub stem: String,
    pub location: String,
}

/// Interns image paths into dense ordinals, first seen first
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    ordinals: HashMap<String, u8>,
    materials: Vec<Material>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordinal of the material for `image_path`, registering it if unseen
    pub fn intern(&mut self, image_path: &str, locator: &TextureLocator) -> ExportResult<u8> {
        let stem = image_stem(image_path);
        if stem.is_empty() {
            return Err(ExportError::InvalidMaterial(format!(
                "image path {image_path:?} has no file name"
            )));
        }
        if let Some(&ordinal) = self.ordinals.get(stem) {
            return Ok(ordinal);
        }
        if self.materials.len() >= MAX_MATERIALS {
            return Err(ExportError::TooManyMaterials(self.materials.len() + 1));
        }

        let ordinal = self.materials.len() as u8;
        self.materials.push(Material {
            stem: stem.to_string(),
            location: locator.locate(stem)?,
        });
        self.ordinals.insert(stem.to_string(), ordinal);
        Ok(ordinal)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Locations in ordinal order
    pub fn write_to<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<(), FormatError> {
        for material in &self.materials {
            w.write_string(&material.location)?;
        }
        Ok(())
    }
}
