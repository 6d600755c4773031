//! Per-axis face values.

use std::fmt;

use crate::quantize::Quantizer;

/// One tunable dimension of the generated face.
///
/// Each axis carries its own valid range in model units; the ranges match
/// the hosted model's input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    RotatePitch,
    RotateYaw,
    RotateRoll,
    PupilX,
    PupilY,
    Smile,
    Blink,
    Eyebrow,
}

impl Axis {
    /// Every axis, in wire-name order.
    pub const ALL: [Axis; 8] = [
        Axis::Blink,
        Axis::Eyebrow,
        Axis::PupilX,
        Axis::PupilY,
        Axis::RotatePitch,
        Axis::RotateRoll,
        Axis::RotateYaw,
        Axis::Smile,
    ];

    /// Field name used on the wire and in the model input schema.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Axis::RotatePitch => "rotate_pitch",
            Axis::RotateYaw => "rotate_yaw",
            Axis::RotateRoll => "rotate_roll",
            Axis::PupilX => "pupil_x",
            Axis::PupilY => "pupil_y",
            Axis::Smile => "smile",
            Axis::Blink => "blink",
            Axis::Eyebrow => "eyebrow",
        }
    }

    /// Valid input range for this axis, in model units.
    pub fn range(&self) -> (f64, f64) {
        match self {
            Axis::RotatePitch | Axis::RotateYaw | Axis::RotateRoll => (-20.0, 20.0),
            Axis::PupilX | Axis::PupilY => (-15.0, 15.0),
            Axis::Smile => (-0.3, 1.3),
            Axis::Blink => (-20.0, 5.0),
            Axis::Eyebrow => (-10.0, 15.0),
        }
    }

    /// Map a normalized gesture magnitude in `[-1, 1]` onto this axis's
    /// range in model units. Out-of-range input is clamped.
    pub fn denormalize(&self, normalized: f64) -> f64 {
        let (min, max) = self.range();
        let clamped = normalized.clamp(-1.0, 1.0);
        min + (clamped + 1.0) / 2.0 * (max - min)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Current position on every face axis.
///
/// `None` means the axis has never been touched and is omitted from the
/// request entirely; it is distinct from an explicit `Some(0.0)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceValues {
    pub rotate_pitch: Option<f64>,
    pub rotate_yaw: Option<f64>,
    pub rotate_roll: Option<f64>,
    pub pupil_x: Option<f64>,
    pub pupil_y: Option<f64>,
    pub smile: Option<f64>,
    pub blink: Option<f64>,
    pub eyebrow: Option<f64>,
}

impl FaceValues {
    /// All axes at the neutral position.
    pub fn neutral() -> Self {
        let mut values = Self::default();
        for axis in Axis::ALL {
            values.set(axis, 0.0);
        }
        values
    }

    /// Read the value on `axis`.
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::RotatePitch => self.rotate_pitch,
            Axis::RotateYaw => self.rotate_yaw,
            Axis::RotateRoll => self.rotate_roll,
            Axis::PupilX => self.pupil_x,
            Axis::PupilY => self.pupil_y,
            Axis::Smile => self.smile,
            Axis::Blink => self.blink,
            Axis::Eyebrow => self.eyebrow,
        }
    }

    /// Set the value on `axis`.
    pub fn set(&mut self, axis: Axis, value: f64) {
        let slot = match axis {
            Axis::RotatePitch => &mut self.rotate_pitch,
            Axis::RotateYaw => &mut self.rotate_yaw,
            Axis::RotateRoll => &mut self.rotate_roll,
            Axis::PupilX => &mut self.pupil_x,
            Axis::PupilY => &mut self.pupil_y,
            Axis::Smile => &mut self.smile,
            Axis::Blink => &mut self.blink,
            Axis::Eyebrow => &mut self.eyebrow,
        };
        *slot = Some(value);
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        self.set(axis, value);
        self
    }

    /// Set `axis` from a normalized gesture magnitude in `[-1, 1]`.
    pub fn set_normalized(&mut self, axis: Axis, normalized: f64) {
        self.set(axis, axis.denormalize(normalized));
    }

    /// Snap every present axis onto its bucket lattice.
    ///
    /// Absent axes stay absent.
    pub fn quantized(&self, quantizer: &Quantizer) -> Self {
        let mut snapped = Self::default();
        for axis in Axis::ALL {
            let (min, max) = axis.range();
            if let Some(value) = quantizer.snap(self.get(axis), min, max) {
                snapped.set(axis, value);
            }
        }
        snapped
    }
}
