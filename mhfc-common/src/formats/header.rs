//! Leading fields shared by all MHFC documents

use std::io::Write;

use super::{BinaryWriter, FormatError, ANIMATION_MAGIC, MODEL_MAGIC, SKELETON_MAGIC};

/// Magic, optional UUID and artist of a document
///
/// Animations carry no UUID. The body version is written by the document
/// writer since its width differs between kinds.
#[derive(Debug, Clone, Copy)]
pub struct DocumentHeader<'a> {
    pub magic: &'static [u8; 8],
    pub uuid: Option<[u32; 4]>,
    pub artist: &'a str,
}

impl<'a> DocumentHeader<'a> {
    pub fn model(uuid: [u32; 4], artist: &'a str) -> Self {
        Self {
            magic: MODEL_MAGIC,
            uuid: Some(uuid),
            artist,
        }
    }

    pub fn skeleton(uuid: [u32; 4], artist: &'a str) -> Self {
        Self {
            magic: SKELETON_MAGIC,
            uuid: Some(uuid),
            artist,
        }
    }

    pub fn animation(artist: &'a str) -> Self {
        Self {
            magic: ANIMATION_MAGIC,
            uuid: None,
            artist,
        }
    }

    /// Encoded size in bytes
    pub fn size(&self) -> usize {
        let uuid = if self.uuid.is_some() { 16 } else { 0 };
        self.magic.len() + uuid + self.artist.len() + 1
    }

    pub fn write_to<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<(), FormatError> {
        w.write_bytes(self.magic)?;
        if let Some(uuid) = self.uuid {
            w.write_u32s(&uuid)?;
        }
        w.write_string(self.artist)
    }
}

/// Truncate each UUID component to its low 32 bits
///
/// Editors hand UUIDs out as signed integers, the file stores them unsigned.
pub fn mask_uuid(raw: [i64; 4]) -> [u32; 4] {
    raw.map(|v| (v & 0xFFFF_FFFF) as u32)
}
