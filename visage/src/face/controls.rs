//! Gesture control registry.
//!
//! Controls group face axes the way the editing UI exposes them: selecting
//! the "face" control maps pan/rotate gestures onto the head rotation axes,
//! "eyes" maps them onto gaze and eyelids, and so on. A control value may
//! carry linked values — secondary axes whose value is derived from the
//! primary by a fixed factor (tilting the head nudges the pupils so the
//! gaze appears to stay on the camera).

use super::values::{Axis, FaceValues};

/// Factor applied to head rotation when deriving the linked pupil offset.
///
/// Keeps the derived pupil value inside its [-15, 15] range for every
/// rotation lattice point.
const ROTATION_PUPIL_FACTOR: f64 = 0.5;

/// A secondary axis derived proportionally from a primary control value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkedValue {
    pub axis: Axis,
    pub factor: f64,
}

/// One value dimension of a control: a primary axis plus any linked axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlValueSpec {
    pub axis: Axis,
    pub label: &'static str,
    pub linked: Vec<LinkedValue>,
}

impl ControlValueSpec {
    fn new(axis: Axis, label: &'static str) -> Self {
        Self {
            axis,
            label,
            linked: Vec::new(),
        }
    }

    fn with_linked(mut self, axis: Axis, factor: f64) -> Self {
        self.linked.push(LinkedValue { axis, factor });
        self
    }

    /// Write `value` to the primary axis and every linked axis.
    pub fn apply(&self, values: &mut FaceValues, value: f64) {
        values.set(self.axis, value);
        for link in &self.linked {
            values.set(link.axis, value * link.factor);
        }
    }
}

/// Identifier for a gesture control group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    Face,
    Mouth,
    Eyes,
    Eyebrows,
}

/// A gesture control: a labeled group of value dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceControl {
    pub key: ControlKey,
    pub label: &'static str,
    pub values: Vec<ControlValueSpec>,
}

impl FaceControl {
    /// Value dimensions swept during a per-control prefetch.
    ///
    /// Blink is pinned while sweeping the eyes and roll while sweeping the
    /// face; sweeping either would multiply the grid with combinations the
    /// UI cannot reach from that control.
    pub fn sweep_values(&self) -> Vec<&ControlValueSpec> {
        self.values
            .iter()
            .filter(|spec| match self.key {
                ControlKey::Eyes => spec.axis != Axis::Blink,
                ControlKey::Face => spec.axis != Axis::RotateRoll,
                _ => true,
            })
            .collect()
    }
}

/// The full control registry, in carousel order.
pub fn face_controls() -> Vec<FaceControl> {
    vec![
        FaceControl {
            key: ControlKey::Face,
            label: "FACE",
            values: vec![
                ControlValueSpec::new(Axis::RotatePitch, "PITCH")
                    .with_linked(Axis::PupilY, ROTATION_PUPIL_FACTOR),
                ControlValueSpec::new(Axis::RotateYaw, "YAW")
                    .with_linked(Axis::PupilX, ROTATION_PUPIL_FACTOR),
                ControlValueSpec::new(Axis::RotateRoll, "ROLL"),
            ],
        },
        FaceControl {
            key: ControlKey::Mouth,
            label: "MOUTH",
            values: vec![ControlValueSpec::new(Axis::Smile, "SMILE")],
        },
        FaceControl {
            key: ControlKey::Eyes,
            label: "EYES",
            values: vec![
                ControlValueSpec::new(Axis::Blink, "EYELID APERTURE"),
                ControlValueSpec::new(Axis::PupilX, "HORIZONTAL"),
                ControlValueSpec::new(Axis::PupilY, "VERTICAL"),
            ],
        },
        FaceControl {
            key: ControlKey::Eyebrows,
            label: "EYEBROWS",
            values: vec![ControlValueSpec::new(Axis::Eyebrow, "HEIGHT")],
        },
    ]
}

/// Look up a control by key.
pub fn control(key: ControlKey) -> FaceControl {
    face_controls()
        .into_iter()
        .find(|c| c.key == key)
        .expect("every ControlKey has a registry entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_four_controls() {
        let controls = face_controls();
        assert_eq!(controls.len(), 4);
        assert_eq!(controls[0].key, ControlKey::Face);
        assert_eq!(controls[1].key, ControlKey::Mouth);
        assert_eq!(controls[2].key, ControlKey::Eyes);
        assert_eq!(controls[3].key, ControlKey::Eyebrows);
    }

    #[test]
    fn test_rotation_axes_link_to_pupils() {
        let face = control(ControlKey::Face);
        let pitch = &face.values[0];
        assert_eq!(pitch.axis, Axis::RotatePitch);
        assert_eq!(pitch.linked.len(), 1);
        assert_eq!(pitch.linked[0].axis, Axis::PupilY);

        let yaw = &face.values[1];
        assert_eq!(yaw.linked[0].axis, Axis::PupilX);
    }

    #[test]
    fn test_apply_writes_linked_axes() {
        let face = control(ControlKey::Face);
        let mut values = FaceValues::default();
        face.values[0].apply(&mut values, 20.0);
        assert_eq!(values.rotate_pitch, Some(20.0));
        assert_eq!(values.pupil_y, Some(10.0));
        assert_eq!(values.pupil_x, None);
    }

    #[test]
    fn test_eyes_sweep_pins_blink() {
        let eyes = control(ControlKey::Eyes);
        let axes: Vec<Axis> = eyes.sweep_values().iter().map(|s| s.axis).collect();
        assert_eq!(axes, vec![Axis::PupilX, Axis::PupilY]);
    }

    #[test]
    fn test_face_sweep_pins_roll() {
        let face = control(ControlKey::Face);
        let axes: Vec<Axis> = face.sweep_values().iter().map(|s| s.axis).collect();
        assert_eq!(axes, vec![Axis::RotatePitch, Axis::RotateYaw]);
    }

    #[test]
    fn test_mouth_sweep_has_no_exclusions() {
        let mouth = control(ControlKey::Mouth);
        assert_eq!(mouth.sweep_values().len(), 1);
    }
}
