//! Model assembly and the versioned `.mcmd` body

use hashbrown::HashMap;
use std::io::Write;
use std::path::Path;

use mhfc_common::{image_stem, BinaryWriter, DocumentHeader, ModelVersion, MAX_PARTS};

use super::material::{MaterialRegistry, TextureLocator};
use super::part::{MaterialRef, Part};
use super::point::{NoSkin, SkinLookup};
use crate::error::{ExportError, ExportResult};
use crate::output::write_document;
use crate::report::ExportReport;
use crate::scene::{MeshSnapshot, SceneSnapshot, VertexGroupWeights};
use crate::skeleton::Skeleton;

/// Settings of a model export
#[derive(Debug, Clone)]
pub struct ModelOptions {
    pub version: ModelVersion,
    pub uuid: [u32; 4],
    pub artist: String,
    /// Part name for faces outside every render group
    pub default_group: String,
    /// Image used by the default group and by groups with a bad image
    pub default_image: String,
    pub textures: TextureLocator,
}

/// Version-specific trailer of a model
#[derive(Debug, Clone)]
pub enum ModelBody {
    V1 { skeleton: Skeleton },
    V2 { materials: MaterialRegistry },
}

#[derive(Debug, Clone)]
pub struct Model {
    parts: Vec<Part>,
    body: ModelBody,
}

impl Model {
    pub fn version(&self) -> ModelVersion {
        match self.body {
            ModelBody::V1 { .. } => ModelVersion::V1,
            ModelBody::V2 { .. } => ModelVersion::V2,
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn bone_count(&self) -> usize {
        match &self.body {
            ModelBody::V1 { skeleton } => skeleton.len(),
            ModelBody::V2 { .. } => 0,
        }
    }

    pub fn material_count(&self) -> usize {
        match &self.body {
            ModelBody::V1 { .. } => 0,
            ModelBody::V2 { materials } => materials.len(),
        }
    }

    /// Body after the document header
    ///
    /// ```text
    /// V1: version u32 = 1, parts u8, bones u8, parts, bones, parents
    /// V2: version u32 = 2, parts u8, materials u8, parts, material strings
    /// ```
    pub fn write_body<W: Write>(&self, w: &mut BinaryWriter<W>) -> ExportResult<()> {
        let part_count = count_u8(self.parts.len(), ExportError::TooManyParts)?;
        w.write_u32(self.version().number())?;
        w.write_u8(part_count)?;

        match &self.body {
            ModelBody::V1 { skeleton } => {
                w.write_u8(count_u8(skeleton.len(), ExportError::TooManyBones)?)?;
                for part in &self.parts {
                    part.write_to(w)?;
                }
                skeleton.write_bones(w)?;
                skeleton.write_parents(w)?;
            }
            ModelBody::V2 { materials } => {
                w.write_u8(count_u8(materials.len(), ExportError::TooManyMaterials)?)?;
                for part in &self.parts {
                    part.write_to(w)?;
                }
                materials.write_to(w)?;
            }
        }
        Ok(())
    }
}

fn count_u8(count: usize, too_many: fn(usize) -> ExportError) -> ExportResult<u8> {
    u8::try_from(count).map_err(|_| too_many(count))
}

/// Bucket the scene's faces into parts and resolve their materials
pub fn build_model(
    scene: &SceneSnapshot,
    options: &ModelOptions,
    report: &mut ExportReport,
) -> ExportResult<Model> {
    let mesh = scene.mesh()?;
    if mesh.uv_layer.is_none() {
        return Err(ExportError::MissingUvLayer);
    }
    if let Some(group) = mesh
        .render_groups
        .iter()
        .find(|g| g.name == options.default_group)
    {
        return Err(ExportError::DuplicateGroupName(group.name.clone()));
    }

    // bindings index the sorted bone list for both versions
    let skeleton = match &scene.armature {
        Some(armature) => Skeleton::from_armature(armature)?,
        None => Skeleton::default(),
    };

    let mut builder = PartBuilder {
        scene,
        mesh,
        options,
        materials: MaterialRegistry::new(),
        parts: Vec::new(),
        slots: HashMap::new(),
    };
    if skeleton.is_empty() {
        builder.add_faces(&NoSkin, report)?;
    } else {
        let skin = VertexGroupWeights::new(mesh, skeleton.bone_names());
        builder.add_faces(&skin, report)?;
    }

    for part in &builder.parts {
        tracing::debug!(
            "Part '{}': {} points, {} triangles",
            part.name(),
            part.points().len(),
            part.triangle_count()
        );
    }

    let body = match options.version {
        ModelVersion::V1 => ModelBody::V1 { skeleton },
        ModelVersion::V2 => ModelBody::V2 {
            materials: builder.materials,
        },
    };
    Ok(Model {
        parts: builder.parts,
        body,
    })
}

struct PartBuilder<'a> {
    scene: &'a SceneSnapshot,
    mesh: &'a MeshSnapshot,
    options: &'a ModelOptions,
    materials: MaterialRegistry,
    parts: Vec<Part>,
    /// render group (`None` = default group) -> index into `parts`
    slots: HashMap<Option<usize>, usize>,
}

impl<'a> PartBuilder<'a> {
    fn add_faces(&mut self, skin: &impl SkinLookup, report: &mut ExportReport) -> ExportResult<()> {
        let mesh = self.mesh;
        for (face_idx, face) in mesh.faces.iter().enumerate() {
            let group = face.group.filter(|&g| g < mesh.render_groups.len());
            let slot = self.part_for(group, report)?;
            for triangle in face.triangles(face_idx)? {
                self.parts[slot].append_face(&triangle, skin)?;
            }
        }
        Ok(())
    }

    fn part_for(&mut self, group: Option<usize>, report: &mut ExportReport) -> ExportResult<usize> {
        if let Some(&slot) = self.slots.get(&group) {
            return Ok(slot);
        }
        if self.parts.len() >= MAX_PARTS {
            return Err(ExportError::TooManyParts(self.parts.len() + 1));
        }

        let (mesh, options) = (self.mesh, self.options);
        let (name, image) = match group {
            Some(g) => {
                let group = &mesh.render_groups[g];
                (group.name.as_str(), self.group_image(g, report))
            }
            None => (
                options.default_group.as_str(),
                options.default_image.as_str(),
            ),
        };
        let material = self.material_ref(image)?;

        let slot = self.parts.len();
        self.parts.push(Part::new(name, material));
        self.slots.insert(group, slot);
        Ok(slot)
    }

    fn group_image(&self, g: usize, report: &mut ExportReport) -> &'a str {
        let (mesh, options) = (self.mesh, self.options);
        let group = &mesh.render_groups[g];
        match group.image.as_deref() {
            Some(image) if !image.is_empty() && self.scene.has_image(image) => image,
            Some(image) if !image.is_empty() => {
                report.warn(format!(
                    "Render group '{}' uses unknown image '{}', using '{}'",
                    group.name, image, options.default_image
                ));
                &options.default_image
            }
            _ => {
                report.warn(format!(
                    "Render group '{}' has no image, using '{}'",
                    group.name, options.default_image
                ));
                &options.default_image
            }
        }
    }

    fn material_ref(&mut self, image: &str) -> ExportResult<MaterialRef> {
        let textures = &self.options.textures;
        match self.options.version {
            ModelVersion::V1 => {
                let stem = image_stem(image);
                if stem.is_empty() {
                    return Err(ExportError::InvalidMaterial(format!(
                        "image path {image:?} has no file name"
                    )));
                }
                Ok(MaterialRef::Location(textures.locate(stem)?))
            }
            ModelVersion::V2 => Ok(MaterialRef::Ordinal(self.materials.intern(image, textures)?)),
        }
    }
}

/// Result of in-memory model conversion
#[derive(Debug, Clone)]
pub struct ConvertedModel {
    pub version: ModelVersion,
    pub part_count: u8,
    pub bone_count: u8,
    pub material_count: u8,
    /// Complete file contents
    pub data: Vec<u8>,
}

/// Build and encode a model document
pub fn convert_model_to_memory(
    scene: &SceneSnapshot,
    options: &ModelOptions,
    report: &mut ExportReport,
) -> ExportResult<ConvertedModel> {
    let model = build_model(scene, options, report)?;

    let header = DocumentHeader::model(options.uuid, &options.artist);
    let mut w = BinaryWriter::new(Vec::with_capacity(header.size()));
    header.write_to(&mut w)?;
    model.write_body(&mut w)?;

    report.info(format!(
        "Exported model ({}): {} parts, {} bones, {} materials",
        model.version(),
        model.parts().len(),
        model.bone_count(),
        model.material_count()
    ));

    // counts were range checked by write_body
    Ok(ConvertedModel {
        version: model.version(),
        part_count: model.parts().len() as u8,
        bone_count: model.bone_count() as u8,
        material_count: model.material_count() as u8,
        data: w.into_inner(),
    })
}

/// Export the scene's mesh to a model file
pub fn convert_model(
    scene: &SceneSnapshot,
    output: &Path,
    options: &ModelOptions,
    report: &mut ExportReport,
) -> ExportResult<()> {
    let converted = convert_model_to_memory(scene, options, report)?;
    write_document(output, &converted.data)?;
    tracing::info!(
        "Wrote model {:?} ({}): {} parts, {} bytes",
        output,
        converted.version,
        converted.part_count,
        converted.data.len()
    );
    Ok(())
}
