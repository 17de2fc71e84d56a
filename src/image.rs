//! Embeddable image sources, generic over the transformation family that
//! may be applied to them.
use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DecodeCause, DecodeError};
use crate::fields::Fields;
use crate::transformation::{Transformation, TransformationNode};
use crate::transformation::post::PostBreakpointTransformation;
use crate::validate::{Validate, ValidationErrors, Validator};
use crate::variable::VariableSlot;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Box,
    Text,
    Url,
    Circle,
}

/// Lower-cased `type` tag → decoder.
pub type ImageRegistry<N> = HashMap<&'static str, ImageDecoder<N>>;
pub type ImageDecoder<N> = fn(&Fields<'_>) -> Result<ImageSource<N>, DecodeError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ImageSource<N> {
    Box(BoxImage<N>),
    Text(TextImage<N>),
    #[serde(rename = "URL")]
    Url(UrlImage<N>),
    Circle(CircleImage<N>),
}

/// Image source for pre-breakpoint transformations.
pub type PreImageSource = ImageSource<Transformation>;
/// Image source for post-breakpoint transformations.
pub type ImageSourcePost = ImageSource<PostBreakpointTransformation>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxImage<N> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<VariableSlot<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<VariableSlot<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<VariableSlot<i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleImage<N> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<VariableSlot<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter: Option<VariableSlot<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<VariableSlot<i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextImage<N> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<VariableSlot<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<VariableSlot<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<VariableSlot<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_size: Option<VariableSlot<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<VariableSlot<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typeface: Option<VariableSlot<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlImage<N> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<VariableSlot<String>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ImageKind {
    /// Canonical wire tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Box => "Box",
            Self::Text => "Text",
            Self::Url => "URL",
            Self::Circle => "Circle",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Builds the tag table for one family. Each family keeps its own copy.
pub fn handlers<N: TransformationNode>() -> ImageRegistry<N> {
    let mut registry: ImageRegistry<N> = HashMap::new();
    registry.insert("box", decode_box::<N>);
    registry.insert("text", decode_text::<N>);
    registry.insert("url", decode_url::<N>);
    registry.insert("circle", decode_circle::<N>);
    registry
}

fn decode_box<N: TransformationNode>(fields: &Fields<'_>) -> Result<ImageSource<N>, DecodeError> {
    let fields = fields.retarget(N::FAMILY.image_kind(Some(ImageKind::Box)));
    Ok(ImageSource::Box(BoxImage {
        color: fields.slot("color")?,
        height: fields.slot("height")?,
        transformation: fields.node("transformation")?,
        width: fields.slot("width")?,
    }))
}

fn decode_circle<N: TransformationNode>(fields: &Fields<'_>) -> Result<ImageSource<N>, DecodeError> {
    let fields = fields.retarget(N::FAMILY.image_kind(Some(ImageKind::Circle)));
    Ok(ImageSource::Circle(CircleImage {
        color: fields.slot("color")?,
        diameter: fields.slot("diameter")?,
        transformation: fields.node("transformation")?,
        width: fields.slot("width")?,
    }))
}

fn decode_text<N: TransformationNode>(fields: &Fields<'_>) -> Result<ImageSource<N>, DecodeError> {
    let fields = fields.retarget(N::FAMILY.image_kind(Some(ImageKind::Text)));
    Ok(ImageSource::Text(TextImage {
        fill: fields.slot("fill")?,
        size: fields.slot("size")?,
        stroke: fields.slot("stroke")?,
        stroke_size: fields.slot("strokeSize")?,
        text: fields.slot("text")?,
        transformation: fields.node("transformation")?,
        typeface: fields.slot("typeface")?,
    }))
}

fn decode_url<N: TransformationNode>(fields: &Fields<'_>) -> Result<ImageSource<N>, DecodeError> {
    let fields = fields.retarget(N::FAMILY.image_kind(Some(ImageKind::Url)));
    Ok(ImageSource::Url(UrlImage {
        transformation: fields.node("transformation")?,
        url: fields.slot("url")?,
    }))
}

impl<N: TransformationNode> ImageSource<N> {
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(N::FAMILY.image_kind(None), raw)?;
        let tag = match fields.map().get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(_) => return Err(fields.fail(DecodeCause::ImageTypeNotString)),
            // images written before `type` existed are URL images
            None if fields.has_key("url") => "url",
            None => return Err(fields.fail(DecodeCause::MissingImageType)),
        };
        let decode = N::image_registry()
            .get(tag.to_lowercase().as_str())
            .ok_or_else(|| fields.fail(DecodeCause::UnknownImageType(tag.to_owned())))?;
        decode(&fields)
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            Self::Box(_) => ImageKind::Box,
            Self::Text(_) => ImageKind::Text,
            Self::Url(_) => ImageKind::Url,
            Self::Circle(_) => ImageKind::Circle,
        }
    }

    /// Transformation applied to this image before it is used.
    pub fn transformation(&self) -> Option<&N> {
        let node = match self {
            Self::Box(image) => &image.transformation,
            Self::Text(image) => &image.transformation,
            Self::Url(image) => &image.transformation,
            Self::Circle(image) => &image.transformation,
        };
        node.as_deref()
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(UrlImage { transformation: None, url: Some(VariableSlot::Literal(url.into())) })
    }
}

impl<'de, N: TransformationNode> Deserialize<'de> for ImageSource<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(&raw).map_err(de::Error::custom)
    }
}

impl<N: TransformationNode> Validate for ImageSource<N> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        match self {
            Self::Box(image) => {
                v.optional("color", &image.color)
                    .optional("height", &image.height)
                    .optional("transformation", &image.transformation)
                    .optional("width", &image.width);
            }
            Self::Circle(image) => {
                v.optional("color", &image.color)
                    .optional("diameter", &image.diameter)
                    .optional("transformation", &image.transformation)
                    .optional("width", &image.width);
            }
            Self::Text(image) => {
                v.optional("fill", &image.fill)
                    .optional("size", &image.size)
                    .optional("stroke", &image.stroke)
                    .optional("strokeSize", &image.stroke_size)
                    .required("text", &image.text)
                    .optional("transformation", &image.transformation)
                    .optional("typeface", &image.typeface);
            }
            Self::Url(image) => {
                v.optional("transformation", &image.transformation).required("url", &image.url);
            }
        }
        v.finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
