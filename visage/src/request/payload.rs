//! Wire payload for a single render request.

use serde::{Deserialize, Serialize};

use crate::face::FaceValues;
use crate::quantize::Quantizer;

/// Output image format requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Webp,
    Png,
    Jpg,
}

impl OutputFormat {
    /// File extension used when persisting the rendered asset.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
        }
    }
}

/// Fixed output settings sent with every request.
///
/// These never vary during an editing session, so they are part of the
/// cache key but not of the quantization lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSettings {
    pub output_format: OutputFormat,
    pub output_quality: u32,
    pub crop_factor: f64,
    pub sample_ratio: f64,
    pub src_ratio: f64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Webp,
            output_quality: 100,
            crop_factor: 2.5,
            sample_ratio: 1.0,
            src_ratio: 1.0,
        }
    }
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Webp
}

fn default_output_quality() -> u32 {
    100
}

fn default_crop_factor() -> f64 {
    2.5
}

fn default_unit_ratio() -> f64 {
    1.0
}

/// The quantized wire form of a render request.
///
/// Field names match the hosted model's input schema. Absent axes are
/// omitted entirely rather than defaulted, so "axis untouched" and "axis
/// at zero" stay distinct requests. Invariant: every axis value present
/// here has already passed through the [`Quantizer`] — payloads are built
/// via [`RenderPayload::new`] or [`EditRequest::payload`], never by hand
/// from raw gesture values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blink: Option<f64>,
    #[serde(default = "default_crop_factor")]
    pub crop_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eyebrow: Option<f64>,
    pub image: String,
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
    #[serde(default = "default_output_quality")]
    pub output_quality: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pupil_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pupil_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_roll: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_yaw: Option<f64>,
    #[serde(default = "default_unit_ratio")]
    pub sample_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smile: Option<f64>,
    #[serde(default = "default_unit_ratio")]
    pub src_ratio: f64,
}

impl RenderPayload {
    /// Build a quantized payload from raw face values.
    pub fn new(
        image: impl Into<String>,
        values: &FaceValues,
        settings: &OutputSettings,
        quantizer: &Quantizer,
    ) -> Self {
        let snapped = values.quantized(quantizer);
        Self {
            blink: snapped.blink,
            crop_factor: settings.crop_factor,
            eyebrow: snapped.eyebrow,
            image: image.into(),
            output_format: settings.output_format,
            output_quality: settings.output_quality,
            pupil_x: snapped.pupil_x,
            pupil_y: snapped.pupil_y,
            rotate_pitch: snapped.rotate_pitch,
            rotate_roll: snapped.rotate_roll,
            rotate_yaw: snapped.rotate_yaw,
            sample_ratio: settings.sample_ratio,
            smile: snapped.smile,
            src_ratio: settings.src_ratio,
        }
    }

    /// Canonical JSON form used for cache-key derivation.
    ///
    /// Serializing through `serde_json::Value` sorts object keys, so the
    /// result is independent of field declaration or construction order.
    pub fn canonical_json(&self) -> String {
        serde_json::to_value(self)
            .expect("payload serialization is infallible")
            .to_string()
    }
}

/// A raw (unquantized) edit request as produced by the gesture layer.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub image: String,
    pub values: FaceValues,
    pub settings: OutputSettings,
}

impl EditRequest {
    /// New request with default output settings.
    pub fn new(image: impl Into<String>, values: FaceValues) -> Self {
        Self {
            image: image.into(),
            values,
            settings: OutputSettings::default(),
        }
    }

    /// Quantize this request into its wire payload.
    pub fn payload(&self, quantizer: &Quantizer) -> RenderPayload {
        RenderPayload::new(&self.image, &self.values, &self.settings, quantizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::Axis;

    #[test]
    fn test_absent_axes_are_omitted() {
        let quantizer = Quantizer::default();
        let values = FaceValues::default().with(Axis::RotatePitch, 3.2);
        let payload = RenderPayload::new(
            "https://example.com/a.jpg",
            &values,
            &OutputSettings::default(),
            &quantizer,
        );
        let json = payload.canonical_json();
        assert!(json.contains("\"rotate_pitch\":0.0"));
        assert!(!json.contains("smile"));
        assert!(!json.contains("blink"));
    }

    #[test]
    fn test_payload_values_are_quantized() {
        let quantizer = Quantizer::default();
        let values = FaceValues::default()
            .with(Axis::RotateYaw, 11.9)
            .with(Axis::Smile, 0.95);
        let payload = RenderPayload::new(
            "img",
            &values,
            &OutputSettings::default(),
            &quantizer,
        );
        assert_eq!(payload.rotate_yaw, Some(13.33));
        assert_eq!(payload.smile, Some(1.03));
    }

    #[test]
    fn test_default_settings_match_model_defaults() {
        let settings = OutputSettings::default();
        assert_eq!(settings.output_format, OutputFormat::Webp);
        assert_eq!(settings.output_quality, 100);
        assert_eq!(settings.crop_factor, 2.5);
        assert_eq!(settings.sample_ratio, 1.0);
        assert_eq!(settings.src_ratio, 1.0);
    }

    #[test]
    fn test_deserialize_fills_setting_defaults() {
        let payload: RenderPayload =
            serde_json::from_str(r#"{"image":"img","rotate_pitch":6.67}"#)
                .expect("minimal payload deserializes");
        assert_eq!(payload.image, "img");
        assert_eq!(payload.rotate_pitch, Some(6.67));
        assert_eq!(payload.output_format, OutputFormat::Webp);
        assert_eq!(payload.output_quality, 100);
        assert_eq!(payload.crop_factor, 2.5);
    }

    #[test]
    fn test_deserialize_requires_image() {
        let result = serde_json::from_str::<RenderPayload>(r#"{"rotate_pitch":6.67}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::Webp.extension(), "webp");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Jpg.extension(), "jpg");
    }
}
