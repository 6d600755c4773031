//! Grid enumeration for prefetch sweeps.
//!
//! Sweeps enumerate raw (unquantized) face-value combinations; the
//! coordinator quantizes each one when the payload is built, so every
//! enumerated point lands exactly on the lattice.

use crate::face::{ControlKey, FaceControl, FaceValues};
use crate::quantize::Quantizer;

/// Full rotation sweep: pitch × yaw at every lattice point, roll visiting
/// the center bucket first and then each remaining bucket.
///
/// Produces `(N+1)^3` unique combinations for an `N`-bucket quantizer,
/// each with the rotation axes' linked values applied (the pupils track
/// the head so the gaze stays on the camera).
pub fn rotation_sweep(quantizer: &Quantizer, controls: &[FaceControl]) -> Vec<FaceValues> {
    let face = controls
        .iter()
        .find(|c| c.key == ControlKey::Face)
        .expect("control registry always contains the face control");
    let pitch_spec = &face.values[0];
    let yaw_spec = &face.values[1];
    let roll_spec = &face.values[2];

    let (min, max) = roll_spec.axis.range();
    let center = quantizer.center(min, max);
    let mut rolls = vec![center];
    rolls.extend(
        quantizer
            .lattice(min, max)
            .into_iter()
            .filter(|&r| r != center),
    );

    let (pitch_min, pitch_max) = pitch_spec.axis.range();
    let (yaw_min, yaw_max) = yaw_spec.axis.range();
    let pitches = quantizer.lattice(pitch_min, pitch_max);
    let yaws = quantizer.lattice(yaw_min, yaw_max);

    let mut combinations = Vec::with_capacity(rolls.len() * pitches.len() * yaws.len());
    for &roll in &rolls {
        for &pitch in &pitches {
            for &yaw in &yaws {
                let mut values = FaceValues::neutral();
                pitch_spec.apply(&mut values, pitch);
                yaw_spec.apply(&mut values, yaw);
                roll_spec.apply(&mut values, roll);
                combinations.push(values);
            }
        }
    }
    combinations
}

/// Per-control sweep: the Cartesian product of the control's sweepable
/// value dimensions at every lattice point, over `base` values.
///
/// Excluded dimensions (blink for eyes, roll for face) keep their `base`
/// value. Linked values are applied per combination.
pub fn control_sweep(
    quantizer: &Quantizer,
    control: &FaceControl,
    base: &FaceValues,
) -> Vec<FaceValues> {
    let specs = control.sweep_values();
    let lattices: Vec<Vec<f64>> = specs
        .iter()
        .map(|spec| {
            let (min, max) = spec.axis.range();
            quantizer.lattice(min, max)
        })
        .collect();

    // Cartesian product, first dimension outermost.
    let mut combinations: Vec<Vec<f64>> = vec![Vec::new()];
    for lattice in &lattices {
        combinations = combinations
            .iter()
            .flat_map(|combo| {
                lattice.iter().map(move |&value| {
                    let mut next = combo.clone();
                    next.push(value);
                    next
                })
            })
            .collect();
    }

    combinations
        .into_iter()
        .map(|combo| {
            let mut values = *base;
            for (spec, value) in specs.iter().zip(combo) {
                spec.apply(&mut values, value);
            }
            values
        })
        .collect()
}
