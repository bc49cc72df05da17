//! Skeleton export (armature -> .mcskl)
//!
//! Bones are sorted by name so independent exports of the same rig agree on
//! bone indices. Each bone stores its bind pose relative to its parent.

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;
use std::io::Write;
use std::path::Path;

use mhfc_common::{BinaryWriter, DocumentHeader, FormatError, SkeletonVersion, MAX_BONES, NO_PARENT};

use crate::error::{ExportError, ExportResult};
use crate::output::write_document;
use crate::report::ExportReport;
use crate::scene::{ArmatureSnapshot, SceneSnapshot};

const SINGULAR_EPSILON: f32 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Bone {
    /// Parent-relative transform from armature-space bind poses
    ///
    /// The child matrix is pre-multiplied with the inverted parent matrix.
    /// A parent that can't be inverted, or a result with no rotation, is a
    /// data error naming the bone whose matrix is at fault.
    pub fn from_matrices(
        name: impl Into<String>,
        matrix: Mat4,
        parent: Option<(&str, Mat4)>,
    ) -> ExportResult<Self> {
        let name = name.into();
        let local = match parent {
            Some((parent_name, parent)) => {
                if parent.determinant().abs() <= SINGULAR_EPSILON || !parent.is_finite() {
                    return Err(ExportError::SingularBindPose {
                        bone: name,
                        matrix: parent_name.to_string(),
                    });
                }
                parent.inverse() * matrix
            }
            None => matrix,
        };
        let (_scale, rotation, translation) = local.to_scale_rotation_translation();
        if !rotation.is_finite() || !translation.is_finite() {
            return Err(ExportError::SingularBindPose {
                matrix: name.clone(),
                bone: name,
            });
        }
        Ok(Self {
            name,
            rotation,
            translation,
        })
    }

    /// name string, rotation xyzw, translation xyz
    pub fn write_to<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<(), FormatError> {
        let q = self.rotation;
        let t = self.translation;
        w.write_string(&self.name)?;
        w.write_f32s(&[q.x, q.y, q.z, q.w, t.x, t.y, t.z])
    }
}

/// Name-sorted bones with parent back-references
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    parents: Vec<u8>,
}

impl Skeleton {
    pub fn from_armature(armature: &ArmatureSnapshot) -> ExportResult<Self> {
        let source = &armature.bones;
        if source.len() > MAX_BONES {
            return Err(ExportError::TooManyBones(source.len()));
        }

        let mut order: Vec<usize> = (0..source.len()).collect();
        order.sort_by(|&a, &b| source[a].name.cmp(&source[b].name));

        let mut sorted_index: HashMap<&str, usize> = HashMap::with_capacity(source.len());
        for (pos, &i) in order.iter().enumerate() {
            if sorted_index.insert(source[i].name.as_str(), pos).is_some() {
                return Err(ExportError::DuplicateBone(source[i].name.clone()));
            }
        }

        let mut bones = Vec::with_capacity(source.len());
        let mut parents = Vec::with_capacity(source.len());
        for &i in &order {
            let bone = &source[i];
            let parent = match &bone.parent {
                None => None,
                Some(parent) => {
                    let pos = *sorted_index.get(parent.as_str()).ok_or_else(|| {
                        ExportError::UnknownParent {
                            bone: bone.name.clone(),
                            parent: parent.clone(),
                        }
                    })?;
                    Some(pos)
                }
            };

            let parent_pose = parent.map(|pos| {
                let parent = &source[order[pos]];
                (parent.name.as_str(), parent.matrix())
            });
            bones.push(Bone::from_matrices(&bone.name, bone.matrix(), parent_pose)?);
            parents.push(match parent {
                Some(pos) => pos as u8,
                None => NO_PARENT,
            });
        }

        let skeleton = Self { bones, parents };
        skeleton.check_acyclic()?;
        Ok(skeleton)
    }

    /// Every parent chain must reach a root within `len` steps
    fn check_acyclic(&self) -> ExportResult<()> {
        for (start, bone) in self.bones.iter().enumerate() {
            let mut current = start;
            let mut steps = 0;
            while self.parents[current] != NO_PARENT {
                current = self.parents[current] as usize;
                steps += 1;
                if current == start || steps > self.bones.len() {
                    return Err(ExportError::CyclicHierarchy(bone.name.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Position of each bone's parent in [`Self::bones`], or [`NO_PARENT`]
    pub fn parents(&self) -> &[u8] {
        &self.parents
    }

    pub fn bone_names(&self) -> impl Iterator<Item = &str> {
        self.bones.iter().map(|b| b.name.as_str())
    }

    pub fn write_bones<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<(), FormatError> {
        for bone in &self.bones {
            bone.write_to(w)?;
        }
        Ok(())
    }

    pub fn write_parents<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<(), FormatError> {
        w.write_u8s(&self.parents)
    }
}

/// Settings of a skeleton export
#[derive(Debug, Clone)]
pub struct SkeletonOptions {
    pub version: SkeletonVersion,
    pub uuid: [u32; 4],
    pub artist: String,
}

/// Result of in-memory skeleton conversion
#[derive(Debug, Clone)]
pub struct ConvertedSkeleton {
    pub bone_count: u8,
    /// Complete file contents
    pub data: Vec<u8>,
}

/// Encode a skeleton document
///
/// ```text
/// "MHFC SKL", uuid, artist
/// version u32 = 1
/// bone count u8, bones, parent indices u8 × count
/// ```
pub fn convert_skeleton_to_memory(
    armature: &ArmatureSnapshot,
    options: &SkeletonOptions,
    report: &mut ExportReport,
) -> ExportResult<ConvertedSkeleton> {
    let skeleton = Skeleton::from_armature(armature)?;
    let bone_count = skeleton.len() as u8;

    let header = DocumentHeader::skeleton(options.uuid, &options.artist);
    let mut w = BinaryWriter::new(Vec::new());
    header.write_to(&mut w)?;
    match options.version {
        SkeletonVersion::V1 => {
            w.write_u32(options.version.number())?;
            w.write_u8(bone_count)?;
            skeleton.write_bones(&mut w)?;
            skeleton.write_parents(&mut w)?;
        }
    }

    report.info(format!("Exported skeleton: {} bones", skeleton.len()));
    Ok(ConvertedSkeleton {
        bone_count,
        data: w.into_inner(),
    })
}

/// Export the scene's armature to a skeleton file
pub fn convert_skeleton(
    scene: &SceneSnapshot,
    output: &Path,
    options: &SkeletonOptions,
    report: &mut ExportReport,
) -> ExportResult<()> {
    let converted = convert_skeleton_to_memory(scene.armature()?, options, report)?;
    write_document(output, &converted.data)?;
    tracing::info!(
        "Wrote skeleton {:?}: {} bones, {} bytes",
        output,
        converted.bone_count,
        converted.data.len()
    );
    Ok(())
}
