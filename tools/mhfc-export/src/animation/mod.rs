//! Animation export (action -> .mcanm)

mod action;
mod curve;

pub use action::{build_action, parse_data_path, BoneAction, Channel, CHANNEL_COUNT};
pub use curve::{Extrapolation, Interpolation, Keyframe, KeyframeCurve};

use std::path::Path;

use mhfc_common::{AnimationVersion, BinaryWriter, DocumentHeader};

use crate::error::ExportResult;
use crate::output::write_document;
use crate::report::ExportReport;
use crate::scene::SceneSnapshot;

/// Settings of an animation export
#[derive(Debug, Clone)]
pub struct AnimationOptions {
    pub version: AnimationVersion,
    pub artist: String,
    /// Action to export, the scene's first action when `None`
    pub action: Option<String>,
    /// Frame subtracted from every keyframe time
    pub offset: f32,
}

/// Result of in-memory animation conversion
#[derive(Debug, Clone)]
pub struct ConvertedAnimation {
    pub action: String,
    pub bone_count: u8,
    /// Complete file contents
    pub data: Vec<u8>,
}

/// Encode an animation document
///
/// ```text
/// "MHFC ANM", artist
/// version u8 = 1
/// bone action count u8, bone actions
/// ```
pub fn convert_animation_to_memory(
    scene: &SceneSnapshot,
    options: &AnimationOptions,
    report: &mut ExportReport,
) -> ExportResult<ConvertedAnimation> {
    let action = scene.action(options.action.as_deref())?;
    let armature = scene.armature()?;
    // bounded to MAX_BONES by build_action
    let bones = build_action(action, armature, options.offset, report)?;

    let header = DocumentHeader::animation(&options.artist);
    let mut w = BinaryWriter::new(Vec::with_capacity(header.size()));
    header.write_to(&mut w)?;
    match options.version {
        AnimationVersion::V1 => {
            w.write_u8(options.version.number())?;
            w.write_u8(bones.len() as u8)?;
            for bone in &bones {
                bone.write_to(&mut w)?;
            }
        }
    }

    report.info(format!(
        "Exported animation '{}': {} animated bones",
        action.name,
        bones.len()
    ));
    Ok(ConvertedAnimation {
        action: action.name.clone(),
        bone_count: bones.len() as u8,
        data: w.into_inner(),
    })
}

/// Export one of the scene's actions to an animation file
pub fn convert_animation(
    scene: &SceneSnapshot,
    output: &Path,
    options: &AnimationOptions,
    report: &mut ExportReport,
) -> ExportResult<()> {
    let converted = convert_animation_to_memory(scene, options, report)?;
    write_document(output, &converted.data)?;
    tracing::info!(
        "Wrote animation {:?} ('{}'): {} bones, {} bytes",
        output,
        converted.action,
        converted.bone_count,
        converted.data.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;

    fn scene() -> SceneSnapshot {
        serde_json::from_str(
            r#"{
                "armature": { "bones": [{ "name": "neck" }, { "name": "horn", "parent": "neck" }] },
                "actions": [
                    { "name": "idle", "fcurves": [] },
                    { "name": "charge", "fcurves": [{
                        "data_path": "pose.bones[\"horn\"].scale",
                        "array_index": 1,
                        "keyframes": [{ "co": [4, 1], "interpolation": "LINEAR" }]
                    }] }
                ]
            }"#,
        )
        .unwrap()
    }

    fn options(action: Option<&str>) -> AnimationOptions {
        AnimationOptions {
            version: AnimationVersion::V1,
            artist: "anim".into(),
            action: action.map(str::to_string),
            offset: 4.0,
        }
    }

    #[test]
    fn test_animation_document_layout() {
        let mut report = ExportReport::new();
        let converted =
            convert_animation_to_memory(&scene(), &options(Some("charge")), &mut report).unwrap();
        let data = &converted.data;

        assert_eq!(&data[0..8], b"MHFC ANM");
        // no UUID in animation headers
        assert_eq!(&data[8..13], b"anim\0");
        assert_eq!(data[13], 1); // version
        assert_eq!(data[14], 1); // bone actions
        assert_eq!(&data[15..20], b"horn\0");

        // 8 empty curves precede scale_y
        let scale_y = 20 + 8 * 2;
        assert_eq!(&data[scale_y..scale_y + 2], &[0, 1]);
        assert_eq!(&data[scale_y + 2..scale_y + 6], &0.0f32.to_be_bytes());
        assert_eq!(converted.bone_count, 1);
    }

    #[test]
    fn test_action_selection() {
        let mut report = ExportReport::new();
        let first = convert_animation_to_memory(&scene(), &options(None), &mut report).unwrap();
        assert_eq!(first.action, "idle");
        assert_eq!(first.data[14], 0);

        let missing = convert_animation_to_memory(&scene(), &options(Some("sleep")), &mut report);
        assert!(matches!(missing, Err(ExportError::UnknownAction(ref n)) if n == "sleep"));
    }
}
