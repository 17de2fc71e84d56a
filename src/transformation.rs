//! Transformation trees.
//!
//! Two closed families share one codec: [`Transformation`] (pre-breakpoint)
//! and [`post::PostBreakpointTransformation`]. Each family owns an immutable
//! tag → decoder registry built on first use. A node is decoded in one pass:
//! the `transformation` tag selects the decoder, which builds the typed
//! payload and recurses into nested nodes, images and shapes directly.
pub mod branch;
pub mod ops;
pub mod post;

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

use crate::enums::TransformationKind;
use crate::error::{DecodeCause, DecodeError, DecodeKind};
use crate::fields::Fields;
use crate::image::{self, ImageKind, ImageRegistry};
use crate::validate::Validate;

pub use branch::{Append, Composite, Compound, FitAndFill, IfDimension, IfOrientation, ImQuery, RegionOfInterestCrop};
pub use ops::*;

/// Wire name of the node discriminator.
pub const TAG: &str = "transformation";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Tag → payload decoder for one family.
pub type Registry<N> = HashMap<&'static str, Decoder<N>>;
pub type Decoder<N> = fn(&Fields<'_>) -> Result<N, DecodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    PreBreakpoint,
    PostBreakpoint,
}

/// A node payload that can be read from its object.
pub trait Payload: Sized {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError>;
}

pub trait TransformationNode:
    Sized + Clone + PartialEq + fmt::Debug + Serialize + Validate + Send + Sync + 'static
{
    const FAMILY: Family;

    fn registry() -> &'static Registry<Self>;

    fn image_registry() -> &'static ImageRegistry<Self>;

    fn kind(&self) -> TransformationKind;

    /// Directly nested nodes of the same family, in field order.
    fn children(&self) -> Vec<&Self>;

    fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(Self::FAMILY.node_kind(None), raw)?;
        let tag = match fields.map().get(TAG) {
            Some(Value::String(tag)) => tag.as_str(),
            Some(_) => return Err(fields.fail(DecodeCause::TagNotString)),
            None => return Err(fields.fail(DecodeCause::MissingTag)),
        };
        let decode = Self::registry()
            .get(tag)
            .ok_or_else(|| fields.fail(DecodeCause::UnknownTransformation(tag.to_owned())))?;
        tracing::trace!(tag, family = %Self::FAMILY, "decoding transformation");

        let kind = TransformationKind::from_wire(tag);
        let node = decode(&fields.retarget(Self::FAMILY.node_kind(Some(kind.clone()))))?;
        if node.kind() != kind {
            return Err(DecodeError::new(
                Self::FAMILY.node_kind(Some(kind)),
                DecodeCause::TagMismatch { tag: tag.to_owned(), decoded: node.kind().to_string() },
            ));
        }
        Ok(node)
    }

    /// Element-wise decode; the first bad element fails the whole list.
    fn decode_list(raw: &Value) -> Result<Vec<Self>, DecodeError> {
        let list_kind = Self::FAMILY.list_kind();
        let Value::Array(items) = raw else {
            return Err(DecodeError::new(list_kind, DecodeCause::NotAnArray));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::decode(item).map_err(|err| DecodeError::element(list_kind.clone(), index, err)))
            .collect()
    }

    /// Levels in the deepest branch, counting this node.
    fn depth(&self) -> usize {
        1 + self.children().into_iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Nodes in this subtree, counting this node.
    fn node_count(&self) -> usize {
        1 + self.children().into_iter().map(Self::node_count).sum::<usize>()
    }
}

macro_rules! node_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident($payload:ty) = $tag:tt,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize)]
        #[serde(tag = "transformation")]
        pub enum $name {
            $(
                #[serde(rename = $tag)]
                $variant($payload),
            )+
        }

        impl $name {
            fn variant_kind(&self) -> $crate::enums::TransformationKind {
                match self {
                    $(Self::$variant(_) => $crate::enums::TransformationKind::$variant,)+
                }
            }

            fn build_registry() -> $crate::transformation::Registry<Self> {
                let mut registry: $crate::transformation::Registry<Self> = ::std::collections::HashMap::new();
                $(
                    registry.insert($tag, |fields: &$crate::fields::Fields<'_>| {
                        <$payload as $crate::transformation::Payload>::decode(fields).map(Self::$variant)
                    });
                )+
                registry
            }
        }

        impl $crate::validate::Validate for $name {
            fn validate(&self) -> Result<(), $crate::validate::ValidationErrors> {
                match self {
                    $(Self::$variant(payload) => $crate::validate::Validate::validate(payload),)+
                }
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                <Self as $crate::transformation::TransformationNode>::decode(&raw)
                    .map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use node_enum;

node_enum! {
    /// A pre-breakpoint pipeline step.
    Transformation {
        Append(Append) = "Append",
        AspectCrop(AspectCrop) = "AspectCrop",
        BackgroundColor(BackgroundColor) = "BackgroundColor",
        Blur(Blur) = "Blur",
        ChromaKey(ChromaKey) = "ChromaKey",
        Composite(Composite<Transformation>) = "Composite",
        Compound(Compound<Transformation>) = "Compound",
        Contrast(Contrast) = "Contrast",
        Crop(Crop) = "Crop",
        FaceCrop(FaceCrop) = "FaceCrop",
        FeatureCrop(FeatureCrop) = "FeatureCrop",
        FitAndFill(FitAndFill) = "FitAndFill",
        Goop(Goop) = "Goop",
        Grayscale(Grayscale) = "Grayscale",
        Hsl(Hsl) = "HSL",
        Hsv(Hsv) = "HSV",
        IfDimension(IfDimension<Transformation>) = "IfDimension",
        IfOrientation(IfOrientation<Transformation>) = "IfOrientation",
        ImQuery(ImQuery) = "ImQuery",
        MaxColors(MaxColors) = "MaxColors",
        Mirror(Mirror) = "Mirror",
        MonoHue(MonoHue) = "MonoHue",
        Opacity(Opacity) = "Opacity",
        RegionOfInterestCrop(RegionOfInterestCrop) = "RegionOfInterestCrop",
        RelativeCrop(RelativeCrop) = "RelativeCrop",
        RemoveColor(RemoveColor) = "RemoveColor",
        Resize(Resize) = "Resize",
        Rotate(Rotate) = "Rotate",
        Scale(Scale) = "Scale",
        Shear(Shear) = "Shear",
        Trim(Trim) = "Trim",
        UnsharpMask(UnsharpMask) = "UnsharpMask",
    }
}

static REGISTRY: Lazy<Registry<Transformation>> = Lazy::new(Transformation::build_registry);
static IMAGES: Lazy<ImageRegistry<Transformation>> = Lazy::new(image::handlers);

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Family {
    pub fn node_kind(self, tag: Option<TransformationKind>) -> DecodeKind {
        match self {
            Self::PreBreakpoint => DecodeKind::Transformation(tag),
            Self::PostBreakpoint => DecodeKind::PostBreakpointTransformation(tag),
        }
    }

    pub fn list_kind(self) -> DecodeKind {
        match self {
            Self::PreBreakpoint => DecodeKind::TransformationList,
            Self::PostBreakpoint => DecodeKind::PostBreakpointTransformationList,
        }
    }

    pub fn image_kind(self, image: Option<ImageKind>) -> DecodeKind {
        match self {
            Self::PreBreakpoint => DecodeKind::Image(image),
            Self::PostBreakpoint => DecodeKind::ImagePost(image),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PreBreakpoint => "pre-breakpoint",
            Self::PostBreakpoint => "post-breakpoint",
        })
    }
}

impl TransformationNode for Transformation {
    const FAMILY: Family = Family::PreBreakpoint;

    fn registry() -> &'static Registry<Self> {
        &REGISTRY
    }

    fn image_registry() -> &'static ImageRegistry<Self> {
        &IMAGES
    }

    fn kind(&self) -> TransformationKind {
        self.variant_kind()
    }

    fn children(&self) -> Vec<&Self> {
        match self {
            Self::Append(node) => node.image.iter().filter_map(|image| image.transformation()).collect(),
            Self::Composite(node) => node.children(),
            Self::Compound(node) => node.transformations.iter().collect(),
            Self::FitAndFill(node) => node.fill_transformation.as_deref().into_iter().collect(),
            Self::IfDimension(node) => node.branches().map(|(_, child)| child).collect(),
            Self::IfOrientation(node) => node.branches().map(|(_, child)| child).collect(),
            _ => Vec::new(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
