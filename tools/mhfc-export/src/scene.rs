//! Scene snapshots handed over by the editor
//!
//! A snapshot is read once at the start of an export. Everything the codec
//! consumes - faces, vertex weights, bones, F-curves - comes from here.

use anyhow::{Context, Result};
use glam::Mat4;
use hashbrown::HashMap;
use serde::Deserialize;
use smallvec::SmallVec;
use std::path::Path;

use crate::error::{ExportError, ExportResult};
use crate::mesh::{Corner, SkinLookup};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneSnapshot {
    /// Names of the images known to the editor
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub mesh: Option<MeshSnapshot>,
    #[serde(default)]
    pub armature: Option<ArmatureSnapshot>,
    #[serde(default)]
    pub actions: Vec<ActionSnapshot>,
}

impl SceneSnapshot {
    /// Load a JSON snapshot from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {:?}", path))?;
        let scene: SceneSnapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scene: {:?}", path))?;
        Ok(scene)
    }

    pub fn mesh(&self) -> ExportResult<&MeshSnapshot> {
        self.mesh.as_ref().ok_or(ExportError::MissingInput("mesh"))
    }

    pub fn armature(&self) -> ExportResult<&ArmatureSnapshot> {
        self.armature
            .as_ref()
            .ok_or(ExportError::MissingInput("armature"))
    }

    /// Select an action by name, or the first one
    pub fn action(&self, name: Option<&str>) -> ExportResult<&ActionSnapshot> {
        match name {
            Some(name) => self
                .actions
                .iter()
                .find(|a| a.name == name)
                .ok_or_else(|| ExportError::UnknownAction(name.to_string())),
            None => self
                .actions
                .first()
                .ok_or(ExportError::MissingInput("action")),
        }
    }

    pub(crate) fn has_image(&self, name: &str) -> bool {
        self.images.iter().any(|i| i == name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeshSnapshot {
    /// Name of the UV layer the corner UVs were taken from
    #[serde(default)]
    pub uv_layer: Option<String>,
    /// Vertex group names of the object, in group index order
    #[serde(default)]
    pub vertex_groups: Vec<String>,
    /// vertex id -> vertex group index -> weight
    #[serde(default)]
    pub weights: HashMap<u32, HashMap<usize, f32>>,
    #[serde(default)]
    pub render_groups: Vec<RenderGroup>,
    #[serde(default)]
    pub faces: Vec<FaceSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderGroup {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceSnapshot {
    /// Index into [`MeshSnapshot::render_groups`], `None` for the default group
    #[serde(default)]
    pub group: Option<usize>,
    pub corners: Vec<Corner>,
}

impl FaceSnapshot {
    /// Split the face into triangles
    ///
    /// Fan triangulation, so faces are expected to be convex.
    pub fn triangles(&self, face: usize) -> ExportResult<SmallVec<[[Corner; 3]; 2]>> {
        let corners = &self.corners;
        if corners.len() < 3 {
            return Err(ExportError::DegenerateFace {
                face,
                corners: corners.len(),
            });
        }
        Ok((1..corners.len() - 1)
            .map(|i| [corners[0], corners[i], corners[i + 1]])
            .collect())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArmatureSnapshot {
    pub bones: Vec<BoneSnapshot>,
}

impl ArmatureSnapshot {
    pub fn bone(&self, name: &str) -> Option<&BoneSnapshot> {
        self.bones.iter().find(|b| b.name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoneSnapshot {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Connected bones have their head locked to the parent's tail
    #[serde(default)]
    pub use_connect: bool,
    /// Bind pose in armature space, column-major
    #[serde(default = "identity_matrix")]
    pub matrix: [f32; 16],
}

impl BoneSnapshot {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array(&self.matrix)
    }
}

fn identity_matrix() -> [f32; 16] {
    Mat4::IDENTITY.to_cols_array()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionSnapshot {
    pub name: String,
    #[serde(default)]
    pub fcurves: Vec<FCurveSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FCurveSnapshot {
    /// e.g. `pose.bones["arm"].location`
    pub data_path: String,
    #[serde(default)]
    pub array_index: usize,
    #[serde(default = "default_extrapolation")]
    pub extrapolation: String,
    #[serde(default)]
    pub keyframes: Vec<KeyframeSnapshot>,
}

fn default_extrapolation() -> String {
    "CONSTANT".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyframeSnapshot {
    /// (time, value)
    pub co: [f32; 2],
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
    #[serde(default)]
    pub handle_left: Option<[f32; 2]>,
    #[serde(default)]
    pub handle_right: Option<[f32; 2]>,
}

fn default_interpolation() -> String {
    "BEZIER".to_string()
}

/// Skin weights of a mesh, looked up by position in the sorted bone list
pub struct VertexGroupWeights<'a> {
    weights: &'a HashMap<u32, HashMap<usize, f32>>,
    /// sorted bone index -> vertex group index
    bone_groups: Vec<Option<usize>>,
}

impl<'a> VertexGroupWeights<'a> {
    pub fn new<'n>(mesh: &'a MeshSnapshot, bone_names: impl IntoIterator<Item = &'n str>) -> Self {
        let bone_groups = bone_names
            .into_iter()
            .map(|name| mesh.vertex_groups.iter().position(|g| g == name))
            .collect();
        Self {
            weights: &mesh.weights,
            bone_groups,
        }
    }
}

impl SkinLookup for VertexGroupWeights<'_> {
    fn bone_count(&self) -> usize {
        self.bone_groups.len()
    }

    fn weight(&self, vertex: u32, bone: usize) -> Option<f32> {
        let group = (*self.bone_groups.get(bone)?)?;
        self.weights.get(&vertex)?.get(&group).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(vertex: u32) -> Corner {
        Corner {
            vertex,
            position: [vertex as f32, 0.0, 0.0],
            normal: [0.0, 1.0, 0.0],
            uv: [0.0, 0.0],
        }
    }

    #[test]
    fn test_parse_snapshot() {
        let json = r#"{
            "images": ["body.png"],
            "mesh": {
                "uv_layer": "UVMap",
                "vertex_groups": ["arm"],
                "weights": { "0": { "0": 0.75 } },
                "render_groups": [{ "name": "body", "image": "body.png" }],
                "faces": [{
                    "group": 0,
                    "corners": [
                        { "vertex": 0, "position": [0, 0, 0], "normal": [0, 0, 1], "uv": [0, 0] },
                        { "vertex": 1, "position": [1, 0, 0], "normal": [0, 0, 1], "uv": [1, 0] },
                        { "vertex": 2, "position": [0, 1, 0], "normal": [0, 0, 1], "uv": [0, 1] }
                    ]
                }]
            },
            "armature": { "bones": [{ "name": "arm" }] },
            "actions": [{
                "name": "walk",
                "fcurves": [{
                    "data_path": "pose.bones[\"arm\"].location",
                    "keyframes": [{ "co": [1, 0], "interpolation": "LINEAR" }]
                }]
            }]
        }"#;
        let scene: SceneSnapshot = serde_json::from_str(json).unwrap();
        let mesh = scene.mesh().unwrap();
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.weights[&0][&0], 0.75);
        assert!(scene.has_image("body.png"));

        let armature = scene.armature().unwrap();
        assert_eq!(armature.bones[0].matrix(), Mat4::IDENTITY);

        let action = scene.action(None).unwrap();
        assert_eq!(action.fcurves[0].extrapolation, "CONSTANT");
        assert!(scene.action(Some("run")).is_err());
    }

    #[test]
    fn test_missing_parts_of_scene() {
        let scene = SceneSnapshot::default();
        assert!(matches!(scene.mesh(), Err(ExportError::MissingInput("mesh"))));
        assert!(matches!(
            scene.action(None),
            Err(ExportError::MissingInput("action"))
        ));
    }

    #[test]
    fn test_fan_triangulation() {
        let quad = FaceSnapshot {
            group: None,
            corners: (0..4).map(corner).collect(),
        };
        let tris = quad.triangles(0).unwrap();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0].map(|c| c.vertex), [0, 1, 2]);
        assert_eq!(tris[1].map(|c| c.vertex), [0, 2, 3]);

        let line = FaceSnapshot {
            group: None,
            corners: vec![corner(0), corner(1)],
        };
        assert!(matches!(
            line.triangles(7),
            Err(ExportError::DegenerateFace { face: 7, corners: 2 })
        ));
    }

    #[test]
    fn test_vertex_group_lookup() {
        let mut mesh = MeshSnapshot {
            vertex_groups: vec!["body".into(), "arm".into()],
            ..Default::default()
        };
        mesh.weights.insert(3, [(1, 0.5)].into_iter().collect());

        // sorted bones: arm, leg (leg has no vertex group)
        let skin = VertexGroupWeights::new(&mesh, ["arm", "leg"]);
        assert_eq!(skin.bone_count(), 2);
        assert_eq!(skin.weight(3, 0), Some(0.5));
        assert_eq!(skin.weight(3, 1), None);
        assert_eq!(skin.weight(4, 0), None);
        assert_eq!(skin.weight(3, 9), None);
    }
}
