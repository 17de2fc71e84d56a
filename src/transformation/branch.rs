//! Payloads that hold nested nodes, images or shapes.
//!
//! The recursive ones are generic over the node family so a pre-breakpoint
//! tree can only nest pre-breakpoint nodes, and likewise for post.
use serde::Serialize;

use crate::enums::{CropStyle, Dimension, Gravity, GravityPriority, Placement, ScaleDimension, TransformationKind};
use crate::error::DecodeError;
use crate::fields::Fields;
use crate::image::{ImageSource, PreImageSource};
use crate::shape::ShapeRegion;
use crate::transformation::{Payload, Transformation, TransformationNode};
use crate::validate::{INVALID_VALUE, Validate, ValidationErrors, Validator};
use crate::variable::{VariableReference, VariableSlot};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Places another image next to the current one.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Append {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravity: Option<VariableSlot<Gravity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravity_priority: Option<VariableSlot<GravityPriority>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PreImageSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_minor_dimension: Option<VariableSlot<bool>>,
}

/// Draws an image over, under or through the current one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Composite<N> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravity: Option<VariableSlot<Gravity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<VariableSlot<Placement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<VariableSlot<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_dimension: Option<VariableSlot<ScaleDimension>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_position: Option<VariableSlot<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_position: Option<VariableSlot<i64>>,
}

/// Runs its children in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compound<N> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transformations: Vec<N>,
}

/// Resizes to fit, then fills the remaining area with `fillTransformation`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitAndFill {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_transformation: Option<Box<Transformation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<VariableSlot<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<VariableSlot<i64>>,
}

/// Picks a branch by comparing an image dimension against `value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IfDimension<N> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<VariableSlot<Dimension>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equal: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greater_than: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub less_than: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<VariableSlot<i64>>,
}

/// Picks a branch by image orientation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfOrientation<N> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landscape: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<Box<N>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub square: Option<Box<N>>,
}

/// Applies transformations named in a request query parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImQuery {
    pub allowed_transformations: Vec<TransformationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<VariableReference>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionOfInterestCrop {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravity: Option<VariableSlot<Gravity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<VariableSlot<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_of_interest: Option<ShapeRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<VariableSlot<CropStyle>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<VariableSlot<i64>>,
}

// ————————————————————————————————————————————————————————————————————————————
// DECODE
// ————————————————————————————————————————————————————————————————————————————

impl Payload for Append {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            gravity: fields.slot("gravity")?,
            gravity_priority: fields.slot("gravityPriority")?,
            image: fields.image("image")?,
            preserve_minor_dimension: fields.slot("preserveMinorDimension")?,
        })
    }
}

impl<N: TransformationNode> Payload for Composite<N> {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            gravity: fields.slot("gravity")?,
            image: fields.image("image")?,
            placement: fields.slot("placement")?,
            scale: fields.slot("scale")?,
            scale_dimension: fields.slot("scaleDimension")?,
            x_position: fields.slot("xPosition")?,
            y_position: fields.slot("yPosition")?,
        })
    }
}

impl<N: TransformationNode> Payload for Compound<N> {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self { transformations: fields.nodes("transformations")? })
    }
}

impl Payload for FitAndFill {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            fill_transformation: fields.node("fillTransformation")?,
            height: fields.slot("height")?,
            width: fields.slot("width")?,
        })
    }
}

impl<N: TransformationNode> Payload for IfDimension<N> {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            default: fields.node("default")?,
            dimension: fields.slot("dimension")?,
            equal: fields.node("equal")?,
            greater_than: fields.node("greaterThan")?,
            less_than: fields.node("lessThan")?,
            value: fields.slot("value")?,
        })
    }
}

impl<N: TransformationNode> Payload for IfOrientation<N> {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            default: fields.node("default")?,
            landscape: fields.node("landscape")?,
            portrait: fields.node("portrait")?,
            square: fields.node("square")?,
        })
    }
}

impl Payload for ImQuery {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            allowed_transformations: fields.value("allowedTransformations")?.unwrap_or_default(),
            query: fields.with("query", VariableReference::decode)?,
        })
    }
}

impl Payload for RegionOfInterestCrop {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            gravity: fields.slot("gravity")?,
            height: fields.slot("height")?,
            region_of_interest: fields.shape("regionOfInterest")?,
            style: fields.slot("style")?,
            width: fields.slot("width")?,
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TREE ACCESS
// ————————————————————————————————————————————————————————————————————————————

impl<N> Default for Composite<N> {
    fn default() -> Self {
        Self {
            gravity: None,
            image: None,
            placement: None,
            scale: None,
            scale_dimension: None,
            x_position: None,
            y_position: None,
        }
    }
}

impl<N: TransformationNode> Composite<N> {
    pub fn children(&self) -> Vec<&N> {
        self.image.iter().filter_map(ImageSource::transformation).collect()
    }
}

impl<N> Default for Compound<N> {
    fn default() -> Self {
        Self { transformations: Vec::new() }
    }
}

impl<N> Compound<N> {
    pub fn new(transformations: Vec<N>) -> Self {
        Self { transformations }
    }
}

impl<N> Default for IfDimension<N> {
    fn default() -> Self {
        Self { default: None, dimension: None, equal: None, greater_than: None, less_than: None, value: None }
    }
}

impl<N> IfDimension<N> {
    /// Present branches with their wire names.
    pub fn branches(&self) -> impl Iterator<Item = (&'static str, &N)> {
        [
            ("default", &self.default),
            ("equal", &self.equal),
            ("greaterThan", &self.greater_than),
            ("lessThan", &self.less_than),
        ]
        .into_iter()
        .filter_map(|(name, node)| node.as_deref().map(|node| (name, node)))
    }
}

impl<N> Default for IfOrientation<N> {
    fn default() -> Self {
        Self { default: None, landscape: None, portrait: None, square: None }
    }
}

impl<N> IfOrientation<N> {
    pub fn branches(&self) -> impl Iterator<Item = (&'static str, &N)> {
        [
            ("default", &self.default),
            ("landscape", &self.landscape),
            ("portrait", &self.portrait),
            ("square", &self.square),
        ]
        .into_iter()
        .filter_map(|(name, node)| node.as_deref().map(|node| (name, node)))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATION
// ————————————————————————————————————————————————————————————————————————————

impl Validate for Append {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .optional("gravity", &self.gravity)
            .optional("gravityPriority", &self.gravity_priority)
            .required("image", &self.image)
            .optional("preserveMinorDimension", &self.preserve_minor_dimension)
            .finish()
    }
}

impl<N: TransformationNode> Validate for Composite<N> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .optional("gravity", &self.gravity)
            .required("image", &self.image)
            .optional("placement", &self.placement)
            .optional("scale", &self.scale)
            .optional("scaleDimension", &self.scale_dimension)
            .optional("xPosition", &self.x_position)
            .optional("yPosition", &self.y_position)
            .finish()
    }
}

impl<N: TransformationNode> Validate for Compound<N> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().each("transformations", &self.transformations).finish()
    }
}

impl Validate for FitAndFill {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .optional("fillTransformation", &self.fill_transformation)
            .required("height", &self.height)
            .required("width", &self.width)
            .finish()
    }
}

impl<N: TransformationNode> Validate for IfDimension<N> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .optional("default", &self.default)
            .optional("dimension", &self.dimension)
            .optional("equal", &self.equal)
            .optional("greaterThan", &self.greater_than)
            .optional("lessThan", &self.less_than)
            .required("value", &self.value)
            .finish()
    }
}

impl<N: TransformationNode> Validate for IfOrientation<N> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        for (name, node) in self.branches() {
            v.nested(name, node);
        }
        v.finish()
    }
}

impl Validate for ImQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check("allowedTransformations", !self.allowed_transformations.is_empty(), crate::validate::BLANK);
        for (index, kind) in self.allowed_transformations.iter().enumerate() {
            v.check(&format!("allowedTransformations[{index}]"), kind.is_query_allowed(), INVALID_VALUE);
        }
        v.required("query", &self.query);
        v.finish()
    }
}

impl Validate for RegionOfInterestCrop {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .optional("gravity", &self.gravity)
            .required("height", &self.height)
            .required("regionOfInterest", &self.region_of_interest)
            .optional("style", &self.style)
            .required("width", &self.width)
            .finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;
    use crate::validate::BLANK;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn fit_and_fill_nests_a_pre_breakpoint_node() {
        let raw = json!({
            "transformation": "FitAndFill",
            "width": 400,
            "height": 300,
            "fillTransformation": {"transformation": "Blur", "sigma": 20}
        });
        let node = Transformation::decode(&raw).unwrap();
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].kind(), TransformationKind::Blur);
        assert_eq!(serde_json::to_value(&node).unwrap(), raw);
    }

    #[test]
    fn region_of_interest_crop_decodes_its_shape() {
        let raw = json!({
            "transformation": "RegionOfInterestCrop",
            "width": 200,
            "height": 200,
            "style": "fill",
            "regionOfInterest": {"anchor": {"x": 4, "y": 5}, "width": 8, "height": 9}
        });
        let Transformation::RegionOfInterestCrop(crop) = Transformation::decode(&raw).unwrap() else {
            panic!("expected RegionOfInterestCrop")
        };
        assert_eq!(crop.region_of_interest.map(|shape| shape.kind()), Some(ShapeKind::Rectangle));
        assert_eq!(crop.style, Some(VariableSlot::Literal(CropStyle::Fill)));
    }

    #[test]
    fn append_requires_an_image() {
        let node = Transformation::decode(&json!({"transformation": "Append", "gravityPriority": "diagonal"})).unwrap();
        let err = node.validate().unwrap_err();
        assert_eq!(err.get("image"), Some(BLANK));
        assert_eq!(err.get("gravityPriority"), Some(INVALID_VALUE));
    }

    #[test]
    fn im_query_allowed_list() {
        let node = Transformation::decode(&json!({
            "transformation": "ImQuery",
            "allowedTransformations": ["Resize", "Compound", "Sparkle"],
            "query": {"var": "imQuery"}
        }))
        .unwrap();
        let err = node.validate().unwrap_err();
        assert_eq!(err.len(), 2);
        assert_eq!(err.get("allowedTransformations[1]"), Some(INVALID_VALUE));
        assert_eq!(err.get("allowedTransformations[2]"), Some(INVALID_VALUE));

        let err = Transformation::decode(&json!({"transformation": "ImQuery"})).unwrap().validate().unwrap_err();
        assert_eq!(err.get("allowedTransformations"), Some(BLANK));
        assert_eq!(err.get("query"), Some(BLANK));
    }

    #[test]
    fn if_orientation_validates_each_branch() {
        let node = Transformation::decode(&json!({
            "transformation": "IfOrientation",
            "portrait": {"transformation": "Rotate", "degrees": 90},
            "square": {"transformation": "Scale", "width": 0.5}
        }))
        .unwrap();
        assert_eq!(node.children().len(), 2);
        let err = node.validate().unwrap_err();
        assert_eq!(err.get("square.height"), Some(BLANK));
    }
}
