//! Triangle groups sharing one material

use hashbrown::HashMap;
use smallvec::SmallVec;
use std::io::Write;

use mhfc_common::{BinaryWriter, MAX_POINTS, MAX_TRIANGLES};

use super::point::{Corner, Point, SkinLookup};
use crate::error::{ExportError, ExportResult};

/// How a part names its texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialRef {
    /// V1: resource location written inline
    Location(String),
    /// V2: ordinal into the model's material table
    Ordinal(u8),
}

#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    material: MaterialRef,
    points: Vec<Point>,
    indices: Vec<u16>,
    /// source vertex -> indices of the points registered for it
    point_map: HashMap<u32, SmallVec<[u16; 6]>>,
}

impl Part {
    pub fn new(name: impl Into<String>, material: MaterialRef) -> Self {
        Self {
            name: name.into(),
            material,
            points: Vec::new(),
            indices: Vec::new(),
            point_map: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn material(&self) -> &MaterialRef {
        &self.material
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Add one triangle, reusing matching points of the same source vertex
    pub fn append_face(&mut self, corners: &[Corner; 3], skin: &impl SkinLookup) -> ExportResult<()> {
        if self.triangle_count() >= MAX_TRIANGLES {
            return Err(ExportError::TooManyTriangles {
                part: self.name.clone(),
                count: self.triangle_count() + 1,
            });
        }

        let mut resolved = [0u16; 3];
        for (slot, corner) in resolved.iter_mut().zip(corners) {
            let candidate = Point::new(corner, skin)?;
            let known = self.point_map.entry(corner.vertex).or_default();

            let existing = known
                .iter()
                .copied()
                .find(|&idx| self.points[idx as usize].matches(&candidate));

            *slot = match existing {
                Some(idx) => idx,
                None => {
                    if self.points.len() >= MAX_POINTS {
                        return Err(ExportError::TooManyPoints {
                            part: self.name.clone(),
                            count: self.points.len() + 1,
                        });
                    }
                    let idx = self.points.len() as u16;
                    self.points.push(candidate);
                    known.push(idx);
                    idx
                }
            };
        }

        self.indices.extend_from_slice(&resolved);
        Ok(())
    }

    /// ```text
    /// point count u16, triangle count u16
    /// name string
    /// material string (V1) | u8 ordinal (V2)
    /// points
    /// indices u16 × 3 × triangles
    /// ```
    pub fn write_to<W: Write>(&self, w: &mut BinaryWriter<W>) -> ExportResult<()> {
        if self.indices.len() % 3 != 0 {
            return Err(ExportError::internal(format!(
                "part '{}' has {} indices, not a multiple of 3",
                self.name,
                self.indices.len()
            )));
        }
        let point_count = u16::try_from(self.points.len())
            .map_err(|_| ExportError::internal("point count exceeds u16 after dedup"))?;
        let triangle_count = u16::try_from(self.triangle_count())
            .map_err(|_| ExportError::internal("triangle count exceeds u16"))?;

        w.write_u16(point_count)?;
        w.write_u16(triangle_count)?;
        w.write_string(&self.name)?;
        match &self.material {
            MaterialRef::Location(location) => w.write_string(location)?,
            MaterialRef::Ordinal(ordinal) => w.write_u8(*ordinal)?,
        }
        for point in &self.points {
            point.write_to(w)?;
        }
        w.write_u16s(&self.indices)?;
        Ok(())
    }
}
