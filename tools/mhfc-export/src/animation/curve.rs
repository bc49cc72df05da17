//! Keyframe curves
//!
//! A curve is stored as a start point, a self-describing segment for every
//! following keyframe, and a tune-out block, so the runtime can rebuild it
//! reading front to back.

use glam::Vec2;
use std::io::Write;

use mhfc_common::{
    BinaryWriter, FormatError, EXTRAPOLATION_CONSTANT, EXTRAPOLATION_LINEAR, INTERPOLATION_BEZIER,
    INTERPOLATION_CONSTANT, INTERPOLATION_LINEAR, MAX_KEYFRAMES, TUNE_IN_LINEAR,
};

use crate::error::{ExportError, ExportResult};
use crate::scene::{FCurveSnapshot, KeyframeSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Constant,
    Linear,
    Bezier,
}

impl Interpolation {
    pub fn parse(curve: &str, mode: &str) -> ExportResult<Self> {
        match mode {
            "CONSTANT" => Ok(Self::Constant),
            "LINEAR" => Ok(Self::Linear),
            "BEZIER" => Ok(Self::Bezier),
            _ => Err(ExportError::UnknownInterpolation {
                curve: curve.to_string(),
                mode: mode.to_string(),
            }),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Constant => INTERPOLATION_CONSTANT,
            Self::Linear => INTERPOLATION_LINEAR,
            Self::Bezier => INTERPOLATION_BEZIER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    #[default]
    Constant,
    Linear,
}

impl Extrapolation {
    pub fn parse(curve: &str, mode: &str) -> ExportResult<Self> {
        match mode {
            "CONSTANT" => Ok(Self::Constant),
            "LINEAR" => Ok(Self::Linear),
            _ => Err(ExportError::UnknownExtrapolation {
                curve: curve.to_string(),
                mode: mode.to_string(),
            }),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Constant => EXTRAPOLATION_CONSTANT,
            Self::Linear => EXTRAPOLATION_LINEAR,
        }
    }
}

/// A validated keyframe; handles the curve never reads sit on the keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// (time, value)
    pub co: Vec2,
    /// Interpolation of the segment ending at this keyframe
    pub interpolation: Interpolation,
    pub handle_left: Vec2,
    pub handle_right: Vec2,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyframeCurve {
    keyframes: Vec<Keyframe>,
    extrapolation: Extrapolation,
    /// Subtracted from every time coordinate on write
    offset: f32,
}

impl KeyframeCurve {
    pub fn empty(offset: f32) -> Self {
        Self {
            offset,
            ..Default::default()
        }
    }

    /// Validate an editor curve
    ///
    /// `name` identifies the curve in errors.
    pub fn from_fcurve(name: &str, fcurve: &FCurveSnapshot, offset: f32) -> ExportResult<Self> {
        let source = &fcurve.keyframes;
        if source.len() > MAX_KEYFRAMES {
            return Err(ExportError::TooManyKeyframes {
                curve: name.to_string(),
                count: source.len(),
            });
        }
        let extrapolation = Extrapolation::parse(name, &fcurve.extrapolation)?;

        let mut keyframes = Vec::with_capacity(source.len());
        for (i, key) in source.iter().enumerate() {
            // the lead-in segment is fixed, the first keyframe's mode is unused
            let interpolation = if i == 0 {
                Interpolation::Linear
            } else {
                Interpolation::parse(name, &key.interpolation)?
            };
            if interpolation == Interpolation::Bezier {
                require_handle(name, i - 1, &source[i - 1], Side::Right)?;
                require_handle(name, i, key, Side::Left)?;
            }

            let co = Vec2::from_array(key.co);
            keyframes.push(Keyframe {
                co,
                interpolation,
                handle_left: key.handle_left.map_or(co, Vec2::from_array),
                handle_right: key.handle_right.map_or(co, Vec2::from_array),
            });
        }

        if extrapolation == Extrapolation::Linear {
            if let Some(last) = source.last() {
                require_handle(name, source.len() - 1, last, Side::Right)?;
            }
        }

        Ok(Self {
            keyframes,
            extrapolation,
            offset,
        })
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    /// ```text
    /// count u16; nothing else when 0
    /// start (t, v), tune-in u8
    /// per segment: (t, v), code u8 [, left.handle_right, right.handle_left]
    /// tune-out u8 [, last.handle_right]
    /// ```
    pub fn write_to<W: Write>(&self, w: &mut BinaryWriter<W>) -> Result<(), FormatError> {
        // keyframe count was bounded by from_fcurve
        w.write_u16(self.keyframes.len() as u16)?;
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return Ok(());
        };

        self.write_pair(w, first.co)?;
        w.write_u8(TUNE_IN_LINEAR)?;

        for pair in self.keyframes.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            self.write_pair(w, right.co)?;
            w.write_u8(right.interpolation.code())?;
            if right.interpolation == Interpolation::Bezier {
                self.write_pair(w, left.handle_right)?;
                self.write_pair(w, right.handle_left)?;
            }
        }

        w.write_u8(self.extrapolation.code())?;
        if self.extrapolation == Extrapolation::Linear {
            self.write_pair(w, last.handle_right)?;
        }
        Ok(())
    }

    fn write_pair<W: Write>(&self, w: &mut BinaryWriter<W>, point: Vec2) -> Result<(), FormatError> {
        w.write_f32(point.x - self.offset)?;
        w.write_f32(point.y)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

fn require_handle(curve: &str, index: usize, key: &KeyframeSnapshot, side: Side) -> ExportResult<()> {
    let (handle, side) = match side {
        Side::Left => (key.handle_left, "left"),
        Side::Right => (key.handle_right, "right"),
    };
    match handle {
        Some(_) => Ok(()),
        None => Err(ExportError::MissingHandle {
            curve: curve.to_string(),
            keyframe: index,
            side,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(co: [f32; 2], interpolation: &str) -> KeyframeSnapshot {
        KeyframeSnapshot {
            co,
            interpolation: interpolation.to_string(),
            handle_left: Some([co[0] - 1.0, co[1]]),
            handle_right: Some([co[0] + 1.0, co[1]]),
        }
    }

    fn fcurve(extrapolation: &str, keyframes: Vec<KeyframeSnapshot>) -> FCurveSnapshot {
        FCurveSnapshot {
            data_path: "pose.bones[\"a\"].location".into(),
            array_index: 0,
            extrapolation: extrapolation.into(),
            keyframes,
        }
    }

    fn encode(curve: &KeyframeCurve) -> Vec<u8> {
        let mut w = BinaryWriter::new(Vec::new());
        curve.write_to(&mut w).unwrap();
        w.into_inner()
    }

    fn pair(t: f32, v: f32) -> Vec<u8> {
        [t.to_be_bytes(), v.to_be_bytes()].concat()
    }

    #[test]
    fn test_empty_curve_is_count_only() {
        assert_eq!(encode(&KeyframeCurve::empty(0.0)), vec![0, 0]);

        let curve = KeyframeCurve::from_fcurve("c", &fcurve("LINEAR", vec![]), 0.0).unwrap();
        assert_eq!(encode(&curve), vec![0, 0]);
    }

    #[test]
    fn test_bezier_segment_layout() {
        let curve = KeyframeCurve::from_fcurve(
            "c",
            &fcurve("CONSTANT", vec![key([1.0, 0.0], "CONSTANT"), key([5.0, 2.0], "BEZIER")]),
            0.0,
        )
        .unwrap();

        let mut expected = vec![0, 2];
        expected.extend(pair(1.0, 0.0));
        expected.push(TUNE_IN_LINEAR);
        expected.extend(pair(5.0, 2.0));
        expected.push(INTERPOLATION_BEZIER);
        expected.extend(pair(2.0, 0.0)); // left keyframe's right handle
        expected.extend(pair(4.0, 2.0)); // right keyframe's left handle
        expected.push(EXTRAPOLATION_CONSTANT);
        assert_eq!(encode(&curve), expected);
    }

    #[test]
    fn test_offset_and_linear_tune_out() {
        let curve = KeyframeCurve::from_fcurve(
            "c",
            &fcurve(
                "LINEAR",
                vec![key([10.0, 1.0], "BEZIER"), key([12.0, 3.0], "LINEAR"), key([14.0, 0.0], "CONSTANT")],
            ),
            10.0,
        )
        .unwrap();

        let mut expected = vec![0, 3];
        expected.extend(pair(0.0, 1.0));
        expected.push(TUNE_IN_LINEAR);
        expected.extend(pair(2.0, 3.0));
        expected.push(INTERPOLATION_LINEAR);
        expected.extend(pair(4.0, 0.0));
        expected.push(INTERPOLATION_CONSTANT);
        expected.push(EXTRAPOLATION_LINEAR);
        expected.extend(pair(5.0, 0.0));
        assert_eq!(encode(&curve), expected);
    }

    #[test]
    fn test_first_keyframe_mode_is_ignored() {
        let curve =
            KeyframeCurve::from_fcurve("c", &fcurve("CONSTANT", vec![key([0.0, 0.0], "ELASTIC")]), 0.0)
                .unwrap();
        assert_eq!(curve.keyframes()[0].interpolation, Interpolation::Linear);
    }

    #[test]
    fn test_unknown_modes_fail() {
        let err = KeyframeCurve::from_fcurve(
            "arm.loc_x",
            &fcurve("CONSTANT", vec![key([0.0, 0.0], "LINEAR"), key([1.0, 0.0], "BOUNCE")]),
            0.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExportError::UnknownInterpolation { ref curve, ref mode } if curve == "arm.loc_x" && mode == "BOUNCE"
        ));

        let err = KeyframeCurve::from_fcurve("c", &fcurve("CYCLIC", vec![]), 0.0).unwrap_err();
        assert!(matches!(err, ExportError::UnknownExtrapolation { .. }));
    }

    #[test]
    fn test_missing_handles_fail() {
        let mut left = key([0.0, 0.0], "LINEAR");
        left.handle_right = None;
        let err = KeyframeCurve::from_fcurve(
            "c",
            &fcurve("CONSTANT", vec![left, key([1.0, 1.0], "BEZIER")]),
            0.0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExportError::MissingHandle { keyframe: 0, side: "right", .. }
        ));

        let mut tail = key([0.0, 0.0], "LINEAR");
        tail.handle_right = None;
        assert!(KeyframeCurve::from_fcurve("c", &fcurve("LINEAR", vec![tail.clone()]), 0.0).is_err());
        // constant tune-out never reads the handle
        assert!(KeyframeCurve::from_fcurve("c", &fcurve("CONSTANT", vec![tail]), 0.0).is_ok());
    }

    #[test]
    fn test_keyframe_cap() {
        let keys = vec![key([0.0, 0.0], "CONSTANT"); MAX_KEYFRAMES + 1];
        let err = KeyframeCurve::from_fcurve("c", &fcurve("CONSTANT", keys), 0.0).unwrap_err();
        assert!(matches!(err, ExportError::TooManyKeyframes { count: 65536, .. }));
    }
}
