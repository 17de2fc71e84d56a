//! Policy-level groups: output settings, breakpoints and rollout info.
use serde::Serialize;
use serde_json::Value;

use crate::enums::{ImageFormat, PerceptualQuality};
use crate::error::{DecodeError, DecodeKind};
use crate::fields::Fields;
use crate::validate::{BLANK, INVALID_VALUE, Validate, ValidationErrors, Validator};
use crate::variable::VariableSlot;

/// `output` keys that only an image policy carries.
pub const IMAGE_ONLY_KEYS: &[&str] =
    &["quality", "adaptiveQuality", "allowedFormats", "forcedFormats", "perceptualQualityFloor"];

/// `output` keys that only a video policy carries.
pub const VIDEO_ONLY_KEYS: &[&str] = &["videoAdaptiveQuality", "placeholderVideoUrl"];

pub const MIN_ROLLOUT_SECONDS: i64 = 3600;
pub const MAX_ROLLOUT_SECONDS: i64 = 604_800;

const MUST_BE_EMPTY: &str = "must be blank";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Encoding settings of an image policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_quality: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_formats: Vec<ImageFormat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forced_formats: Vec<ImageFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual_quality: Option<VariableSlot<PerceptualQuality>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual_quality_floor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<VariableSlot<i64>>,
}

/// Encoding settings of a video policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputVideo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual_quality: Option<VariableSlot<PerceptualQuality>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_video_url: Option<VariableSlot<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_adaptive_quality: Option<VariableSlot<PerceptualQuality>>,
}

/// Widths the derivative images are generated at.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Breakpoints {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub widths: Vec<i64>,
}

/// Rollout window of a policy version, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloutInfo {
    pub end_time: i64,
    pub rollout_duration: i64,
    pub start_time: i64,
}

// ————————————————————————————————————————————————————————————————————————————
// DECODING
// ————————————————————————————————————————————————————————————————————————————

impl OutputImage {
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::OutputImage, raw)?;
        Ok(Self {
            adaptive_quality: fields.value("adaptiveQuality")?,
            allowed_formats: fields.value("allowedFormats")?.unwrap_or_default(),
            forced_formats: fields.value("forcedFormats")?.unwrap_or_default(),
            perceptual_quality: fields.slot("perceptualQuality")?,
            perceptual_quality_floor: fields.value("perceptualQualityFloor")?,
            quality: fields.slot("quality")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl OutputVideo {
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::OutputVideo, raw)?;
        Ok(Self {
            perceptual_quality: fields.slot("perceptualQuality")?,
            placeholder_video_url: fields.slot("placeholderVideoUrl")?,
            video_adaptive_quality: fields.slot("videoAdaptiveQuality")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Breakpoints {
    pub fn new(widths: impl IntoIterator<Item = i64>) -> Self {
        Self { widths: widths.into_iter().collect() }
    }

    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::Breakpoints, raw)?;
        Ok(Self { widths: fields.value("widths")?.unwrap_or_default() })
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}

impl RolloutInfo {
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::RolloutInfo, raw)?;
        Ok(Self {
            end_time: fields.value("endTime")?.unwrap_or_default(),
            rollout_duration: fields.value("rolloutDuration")?.unwrap_or_default(),
            start_time: fields.value("startTime")?.unwrap_or_default(),
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATION
// ————————————————————————————————————————————————————————————————————————————

fn check_formats(v: &mut Validator, field: &str, formats: &[ImageFormat]) {
    for (index, format) in formats.iter().enumerate() {
        v.check(&format!("{field}[{index}]"), format.is_known(), INVALID_VALUE);
    }
}

/// Rollout duration bounds, shared with upsert inputs.
pub(crate) fn check_rollout_duration(v: &mut Validator, field: &str, seconds: Option<i64>) {
    v.range(field, seconds, Some(MIN_ROLLOUT_SECONDS), Some(MAX_ROLLOUT_SECONDS));
}

impl Validate for OutputImage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.range("adaptiveQuality", self.adaptive_quality, Some(1), Some(100));
        check_formats(&mut v, "allowedFormats", &self.allowed_formats);
        check_formats(&mut v, "forcedFormats", &self.forced_formats);
        v.optional("perceptualQuality", &self.perceptual_quality)
            .range("perceptualQualityFloor", self.perceptual_quality_floor, Some(1), Some(100))
            .optional("quality", &self.quality)
            .range("quality", self.quality.as_ref().and_then(|slot| slot.literal()).copied(), Some(1), Some(100));
        if self.perceptual_quality.is_some() {
            v.check("quality", self.quality.is_none(), MUST_BE_EMPTY);
        }
        v.finish()
    }
}

impl Validate for OutputVideo {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .optional("perceptualQuality", &self.perceptual_quality)
            .optional("placeholderVideoUrl", &self.placeholder_video_url)
            .optional("videoAdaptiveQuality", &self.video_adaptive_quality)
            .finish()
    }
}

impl Validate for RolloutInfo {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check("endTime", self.end_time != 0, BLANK);
        if self.rollout_duration == 0 {
            v.violation("rolloutDuration", BLANK);
        }
        check_rollout_duration(&mut v, "rolloutDuration", Some(self.rollout_duration).filter(|d| *d != 0));
        v.check("startTime", self.start_time != 0, BLANK);
        v.finish()
    }
}
