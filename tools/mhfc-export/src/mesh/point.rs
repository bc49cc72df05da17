//! Deduplicatable vertex records

use glam::{Vec2, Vec3};
use serde::Deserialize;
use smallvec::SmallVec;
use std::io::Write;

use mhfc_common::{BinaryWriter, FormatError, BINDING_END, MAX_BINDINGS, MAX_BONES};

use crate::error::{ExportError, ExportResult};

/// Points closer than this in position, normal and UV are merged
pub const POINT_EPSILON: f32 = 0.001;

/// One face corner as handed over by the editor
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Corner {
    /// Source vertex the corner belongs to
    pub vertex: u32,
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Skin weights of the mesh being exported
///
/// Bones are addressed by their index in the name-sorted bone list.
pub trait SkinLookup {
    fn bone_count(&self) -> usize;

    fn weight(&self, vertex: u32, bone: usize) -> Option<f32>;
}

/// Lookup for meshes exported without an armature
pub struct NoSkin;

impl SkinLookup for NoSkin {
    fn bone_count(&self) -> usize {
        0
    }

    fn weight(&self, _vertex: u32, _bone: usize) -> Option<f32> {
        None
    }
}

/// How strongly a point follows one bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    pub bone: u8,
    pub weight: f32,
}

#[derive(Debug, Clone)]
pub struct Point {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Bindings in bone order, positive weights only
    pub bindings: SmallVec<[Binding; MAX_BINDINGS]>,
}

impl Point {
    pub fn new(corner: &Corner, skin: &impl SkinLookup) -> ExportResult<Self> {
        let bone_count = skin.bone_count();
        if bone_count > MAX_BONES {
            return Err(ExportError::TooManyBones(bone_count));
        }

        let mut bindings = SmallVec::new();
        for bone in 0..bone_count {
            let Some(weight) = skin.weight(corner.vertex, bone) else {
                continue;
            };
            if weight > 0.0 {
                let bone = u8::try_from(bone)
                    .map_err(|_| ExportError::internal(format!("bone index {bone} exceeds u8")))?;
                bindings.push(Binding { bone, weight });
            }
        }

        Ok(Self {
            position: Vec3::from_array(corner.position),
            normal: Vec3::from_array(corner.normal),
            uv: Vec2::from_array(corner.uv),
            bindings,
        })
    }

    /// Structural equality used for deduplication
    pub fn matches(&self, other: &Point) -> bool {
        self.bindings == other.bindings
            && self.uv.distance(other.uv) < POINT_EPSILON
            && self.position.distance(other.position) < POINT_EPSILON
            && self.normal.distance(other.normal) < POINT_EPSILON
    }

    /// Up to four bindings, heaviest first
    ///
    /// Ties keep bone order.
    pub fn strongest_bindings(&self) -> SmallVec<[Binding; MAX_BINDINGS]> {
        let mut sorted = self.bindings.clone();
        sorted.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        sorted.truncate(MAX_BINDINGS);
        sorted
    }

    /// Write the point; the V coordinate is flipped for the runtime
    ///
    /// ```text
    /// position 3×f32, normal 3×f32, uv 2×f32
    /// (bone u8, weight f32) × n, n <= 4
    /// 0xFF if n < 4
    /// ```
    pub fn write_to<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<(), FormatError> {
        w.write_f32s(&self.position.to_array())?;
        w.write_f32s(&self.normal.to_array())?;
        w.write_f32(self.uv.x)?;
        w.write_f32(1.0 - self.uv.y)?;

        let bindings = self.strongest_bindings();
        for binding in &bindings {
            w.write_u8(binding.bone)?;
            w.write_f32(binding.weight)?;
        }
        if bindings.len() < MAX_BINDINGS {
            w.write_u8(BINDING_END)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed weights per bone for every vertex
    struct Weights(Vec<Option<f32>>);

    impl SkinLookup for Weights {
        fn bone_count(&self) -> usize {
            self.0.len()
        }

        fn weight(&self, _vertex: u32, bone: usize) -> Option<f32> {
            self.0[bone]
        }
    }

    fn corner() -> Corner {
        Corner {
            vertex: 0,
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 0.0, 1.0],
            uv: [0.25, 0.25],
        }
    }

    fn encode(point: &Point) -> Vec<u8> {
        let mut w = BinaryWriter::new(Vec::new());
        point.write_to(&mut w).unwrap();
        w.into_inner()
    }

    #[test]
    fn test_bindings_keep_positive_weights() {
        let skin = Weights(vec![Some(0.5), None, Some(0.0), Some(-1.0), Some(0.25)]);
        let point = Point::new(&corner(), &skin).unwrap();
        assert_eq!(
            point.bindings.as_slice(),
            &[
                Binding { bone: 0, weight: 0.5 },
                Binding { bone: 4, weight: 0.25 }
            ]
        );
    }

    #[test]
    fn test_unskinned_point_layout() {
        let point = Point::new(&corner(), &NoSkin).unwrap();
        let bytes = encode(&point);

        // 8 floats + sentinel
        assert_eq!(bytes.len(), 33);
        assert_eq!(&bytes[0..4], &1.0f32.to_be_bytes());
        assert_eq!(&bytes[24..28], &0.25f32.to_be_bytes());
        assert_eq!(&bytes[28..32], &0.75f32.to_be_bytes());
        assert_eq!(bytes[32], BINDING_END);
    }

    #[test]
    fn test_more_than_four_bindings_keeps_heaviest() {
        let skin = Weights(vec![
            Some(0.1),
            Some(0.6),
            Some(0.05),
            Some(0.3),
            Some(0.4),
            Some(0.2),
        ]);
        let point = Point::new(&corner(), &skin).unwrap();
        let kept: Vec<u8> = point.strongest_bindings().iter().map(|b| b.bone).collect();
        assert_eq!(kept, [1, 4, 3, 5]);

        // 4 pairs and no sentinel
        let bytes = encode(&point);
        assert_eq!(bytes.len(), 32 + 4 * 5);
        assert_eq!(bytes[32], 1);
        assert_eq!(&bytes[33..37], &0.6f32.to_be_bytes());
    }

    #[test]
    fn test_exactly_four_bindings_has_no_sentinel() {
        let skin = Weights(vec![Some(0.25); 4]);
        let bytes = encode(&Point::new(&corner(), &skin).unwrap());
        assert_eq!(bytes.len(), 32 + 4 * 5);
    }

    #[test]
    fn test_few_bindings_single_sentinel() {
        let skin = Weights(vec![Some(1.0), Some(0.5)]);
        let bytes = encode(&Point::new(&corner(), &skin).unwrap());
        assert_eq!(bytes.len(), 32 + 2 * 5 + 1);
        // heaviest first
        assert_eq!(bytes[32], 0);
        assert_eq!(bytes[37], 1);
        assert_eq!(*bytes.last().unwrap(), BINDING_END);
    }

    #[test]
    fn test_matches_within_epsilon() {
        let a = Point::new(&corner(), &NoSkin).unwrap();
        let mut near = corner();
        near.position[0] += 0.0005;
        near.uv[1] += 0.0005;
        assert!(a.matches(&Point::new(&near, &NoSkin).unwrap()));

        let mut far = corner();
        far.normal = [0.0, 0.01, 1.0];
        assert!(!a.matches(&Point::new(&far, &NoSkin).unwrap()));
    }

    #[test]
    fn test_matches_requires_equal_bindings() {
        let a = Point::new(&corner(), &Weights(vec![Some(1.0)])).unwrap();
        let b = Point::new(&corner(), &Weights(vec![Some(0.5)])).unwrap();
        let c = Point::new(&corner(), &Weights(vec![Some(1.0)])).unwrap();
        assert!(!a.matches(&b));
        assert!(a.matches(&c));
    }
}
