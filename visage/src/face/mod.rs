//! Face parameter model: axes, values and the gesture control registry.
//!
//! An [`Axis`] is one tunable dimension of the generated face (a rotation,
//! the gaze, the smile, ...). [`FaceValues`] holds the current position on
//! each axis, and [`controls::face_controls`] describes how the UI groups
//! axes into gesture-driven controls, including linked values that are
//! derived proportionally from a primary axis.

mod controls;
mod values;

pub use controls::{control, face_controls, ControlKey, ControlValueSpec, FaceControl, LinkedValue};
pub use values::{Axis, FaceValues};
