//! Bone actions: the ten transform curves of one bone

use std::collections::BTreeMap;
use std::io::Write;

use mhfc_common::{BinaryWriter, FormatError, MAX_BONES};

use super::curve::KeyframeCurve;
use crate::error::{ExportError, ExportResult};
use crate::report::ExportReport;
use crate::scene::{ActionSnapshot, ArmatureSnapshot};

/// Transform channel, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    LocX,
    LocY,
    LocZ,
    RotX,
    RotY,
    RotZ,
    RotW,
    ScaleX,
    ScaleY,
    ScaleZ,
}

pub const CHANNEL_COUNT: usize = 10;

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::LocX,
        Channel::LocY,
        Channel::LocZ,
        Channel::RotX,
        Channel::RotY,
        Channel::RotZ,
        Channel::RotW,
        Channel::ScaleX,
        Channel::ScaleY,
        Channel::ScaleZ,
    ];

    /// Channel of a pose bone property
    ///
    /// Quaternion components are indexed w, x, y, z.
    pub fn from_property(property: &str, index: usize) -> Option<Self> {
        let channel = match (property, index) {
            ("location", 0) => Channel::LocX,
            ("location", 1) => Channel::LocY,
            ("location", 2) => Channel::LocZ,
            ("rotation_quaternion", 0) => Channel::RotW,
            ("rotation_quaternion", 1) => Channel::RotX,
            ("rotation_quaternion", 2) => Channel::RotY,
            ("rotation_quaternion", 3) => Channel::RotZ,
            ("scale", 0) => Channel::ScaleX,
            ("scale", 1) => Channel::ScaleY,
            ("scale", 2) => Channel::ScaleZ,
            _ => return None,
        };
        Some(channel)
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_location(self) -> bool {
        matches!(self, Channel::LocX | Channel::LocY | Channel::LocZ)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::LocX => "loc_x",
            Channel::LocY => "loc_y",
            Channel::LocZ => "loc_z",
            Channel::RotX => "rot_x",
            Channel::RotY => "rot_y",
            Channel::RotZ => "rot_z",
            Channel::RotW => "rot_w",
            Channel::ScaleX => "scale_x",
            Channel::ScaleY => "scale_y",
            Channel::ScaleZ => "scale_z",
        }
    }
}

/// Split `pose.bones["<bone>"].<property>`
pub fn parse_data_path(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix("pose.bones[\"")?;
    let (bone, property) = rest.split_once("\"].")?;
    if bone.is_empty() || property.is_empty() {
        return None;
    }
    Some((bone, property))
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneAction {
    name: String,
    curves: [KeyframeCurve; CHANNEL_COUNT],
}

impl BoneAction {
    pub fn new(name: impl Into<String>, offset: f32) -> Self {
        Self {
            name: name.into(),
            curves: std::array::from_fn(|_| KeyframeCurve::empty(offset)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn curve(&self, channel: Channel) -> &KeyframeCurve {
        &self.curves[channel.index()]
    }

    pub fn set_curve(&mut self, channel: Channel, curve: KeyframeCurve) {
        self.curves[channel.index()] = curve;
    }

    /// name string, then the curves in [`Channel::ALL`] order
    pub fn write_to<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<(), FormatError> {
        w.write_string(&self.name)?;
        for curve in &self.curves {
            curve.write_to(w)?;
        }
        Ok(())
    }
}

/// Route an action's curves to bone actions, sorted by bone name
///
/// Curves for bones outside the armature, for unknown properties and for the
/// location of connected bones are skipped.
pub fn build_action(
    action: &ActionSnapshot,
    armature: &ArmatureSnapshot,
    offset: f32,
    report: &mut ExportReport,
) -> ExportResult<Vec<BoneAction>> {
    let mut bones: BTreeMap<&str, BoneAction> = BTreeMap::new();
    let mut skipped = 0usize;

    for fcurve in &action.fcurves {
        let Some((bone_name, property)) = parse_data_path(&fcurve.data_path) else {
            tracing::debug!("Skipping curve {}: not a pose bone", fcurve.data_path);
            skipped += 1;
            continue;
        };
        let Some(bone) = armature.bone(bone_name) else {
            tracing::debug!("Skipping curve {}: bone not in armature", fcurve.data_path);
            skipped += 1;
            continue;
        };
        let Some(channel) = Channel::from_property(property, fcurve.array_index) else {
            tracing::debug!(
                "Skipping curve {}[{}]: unsupported property",
                fcurve.data_path,
                fcurve.array_index
            );
            skipped += 1;
            continue;
        };
        if channel.is_location() && bone.use_connect {
            skipped += 1;
            continue;
        }

        let curve_name = format!("{}.{}", bone.name, channel.name());
        let curve = KeyframeCurve::from_fcurve(&curve_name, fcurve, offset)?;
        let entry = bones
            .entry(bone.name.as_str())
            .or_insert_with(|| BoneAction::new(bone.name.as_str(), offset));
        if !entry.curve(channel).is_empty() {
            report.warn(format!(
                "Action '{}' animates {} more than once, keeping the last curve",
                action.name, curve_name
            ));
        }
        entry.set_curve(channel, curve);
    }

    if bones.len() > MAX_BONES {
        return Err(ExportError::TooManyBones(bones.len()));
    }
    if skipped > 0 {
        report.info(format!(
            "Action '{}': skipped {} curves",
            action.name, skipped
        ));
    }
    Ok(bones.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BoneSnapshot, FCurveSnapshot, KeyframeSnapshot};
    use glam::Mat4;

    fn armature() -> ArmatureSnapshot {
        let bone = |name: &str, connected: bool| BoneSnapshot {
            name: name.into(),
            parent: None,
            use_connect: connected,
            matrix: Mat4::IDENTITY.to_cols_array(),
        };
        ArmatureSnapshot {
            bones: vec![bone("tail", false), bone("head", false), bone("jaw", true)],
        }
    }

    fn fcurve(path: &str, index: usize) -> FCurveSnapshot {
        FCurveSnapshot {
            data_path: path.into(),
            array_index: index,
            extrapolation: "CONSTANT".into(),
            keyframes: vec![KeyframeSnapshot {
                co: [0.0, 1.0],
                interpolation: "LINEAR".into(),
                handle_left: None,
                handle_right: None,
            }],
        }
    }

    fn action(fcurves: Vec<FCurveSnapshot>) -> ActionSnapshot {
        ActionSnapshot {
            name: "roar".into(),
            fcurves,
        }
    }

    #[test]
    fn test_parse_data_path() {
        assert_eq!(
            parse_data_path("pose.bones[\"upper arm.L\"].rotation_quaternion"),
            Some(("upper arm.L", "rotation_quaternion"))
        );
        assert_eq!(parse_data_path("location"), None);
        assert_eq!(parse_data_path("pose.bones[\"\"].scale"), None);
    }

    #[test]
    fn test_quaternion_index_order() {
        assert_eq!(Channel::from_property("rotation_quaternion", 0), Some(Channel::RotW));
        assert_eq!(Channel::from_property("rotation_quaternion", 1), Some(Channel::RotX));
        assert_eq!(Channel::from_property("rotation_euler", 0), None);
        assert_eq!(Channel::from_property("scale", 3), None);
        // w is written after x, y, z
        assert_eq!(Channel::RotW.index(), 6);
    }

    #[test]
    fn test_routing_and_order() {
        let mut report = ExportReport::new();
        let bones = build_action(
            &action(vec![
                fcurve("pose.bones[\"tail\"].rotation_quaternion", 0),
                fcurve("pose.bones[\"head\"].location", 2),
                fcurve("pose.bones[\"ghost\"].location", 0),
                fcurve("pose.bones[\"jaw\"].location", 0),
                fcurve("pose.bones[\"jaw\"].scale", 1),
                fcurve("location", 0),
            ]),
            &armature(),
            0.0,
            &mut report,
        )
        .unwrap();

        let names: Vec<&str> = bones.iter().map(BoneAction::name).collect();
        assert_eq!(names, ["head", "jaw", "tail"]);
        assert_eq!(bones[0].curve(Channel::LocZ).len(), 1);
        assert!(bones[0].curve(Channel::LocX).is_empty());
        // connected bones ignore location curves
        assert!(bones[1].curve(Channel::LocX).is_empty());
        assert_eq!(bones[1].curve(Channel::ScaleY).len(), 1);
        assert_eq!(bones[2].curve(Channel::RotW).len(), 1);
        assert_eq!(report.infos().count(), 1);
    }

    #[test]
    fn test_duplicate_channel_warns() {
        let mut report = ExportReport::new();
        let bones = build_action(
            &action(vec![
                fcurve("pose.bones[\"head\"].scale", 0),
                fcurve("pose.bones[\"head\"].scale", 0),
            ]),
            &armature(),
            0.0,
            &mut report,
        )
        .unwrap();
        assert_eq!(bones.len(), 1);
        assert!(report.warnings().next().is_some());
    }

    #[test]
    fn test_bone_action_layout() {
        let mut bone = BoneAction::new("a", 0.0);
        let curve = KeyframeCurve::from_fcurve("a.rot_w", &fcurve("", 0), 0.0).unwrap();
        bone.set_curve(Channel::RotW, curve);

        let mut w = BinaryWriter::new(Vec::new());
        bone.write_to(&mut w).unwrap();
        let bytes = w.into_inner();

        // name, six empty curves, the w curve, three empty curves
        let w_curve = 2 + 8 + 1 + 1;
        assert_eq!(bytes.len(), 2 + 9 * 2 + w_curve);
        assert_eq!(&bytes[0..2], b"a\0");
        assert_eq!(&bytes[2..14], &[0u8; 12]);
        assert_eq!(&bytes[14..16], &[0, 1]);
    }
}
