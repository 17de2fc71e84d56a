//! Regions of interest. Shapes carry no tag; the variant follows from which
//! marker key is present.
use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DecodeCause, DecodeError, DecodeKind};
use crate::fields::Fields;
use crate::validate::{BLANK, Validate, ValidationErrors, Validator};
use crate::variable::VariableSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Point,
    Circle,
    Polygon,
    Rectangle,
    Union,
}

/// Marker key → shape, checked in order; the first key present wins.
pub const SHAPE_PRECEDENCE: [(&str, ShapeKind); 5] = [
    ("radius", ShapeKind::Circle),
    ("x", ShapeKind::Point),
    ("points", ShapeKind::Polygon),
    ("anchor", ShapeKind::Rectangle),
    ("shapes", ShapeKind::Union),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShapeRegion {
    Point(PointShape),
    Circle(CircleShape),
    Polygon(PolygonShape),
    Rectangle(RectangleShape),
    Union(UnionShape),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PointShape {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<VariableSlot<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<VariableSlot<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CircleShape {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<PointShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<VariableSlot<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PolygonShape {
    pub points: Vec<PointShape>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RectangleShape {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<PointShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<VariableSlot<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<VariableSlot<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UnionShape {
    pub shapes: Vec<ShapeRegion>,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Circle => "circle",
            Self::Polygon => "polygon",
            Self::Rectangle => "rectangle",
            Self::Union => "union",
        }
    }

    /// Marker-key dispatch over an object's key set.
    pub fn detect(map: &serde_json::Map<String, Value>) -> Option<Self> {
        SHAPE_PRECEDENCE
            .iter()
            .find(|(key, _)| map.contains_key(*key))
            .map(|(_, kind)| *kind)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ShapeRegion {
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::Shape(None), raw)?;
        let kind = ShapeKind::detect(fields.map()).ok_or_else(|| fields.fail(DecodeCause::InvalidShape))?;
        let fields = fields.retarget(DecodeKind::Shape(Some(kind)));
        Ok(match kind {
            ShapeKind::Point => Self::Point(PointShape::from_fields(&fields)?),
            ShapeKind::Circle => Self::Circle(CircleShape {
                center: fields.point("center")?,
                radius: fields.slot("radius")?,
            }),
            ShapeKind::Polygon => Self::Polygon(PolygonShape {
                points: fields.each("points", PointShape::decode)?,
            }),
            ShapeKind::Rectangle => Self::Rectangle(RectangleShape {
                anchor: fields.point("anchor")?,
                height: fields.slot("height")?,
                width: fields.slot("width")?,
            }),
            ShapeKind::Union => Self::Union(UnionShape {
                shapes: fields.each("shapes", ShapeRegion::decode)?,
            }),
        })
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Point(_) => ShapeKind::Point,
            Self::Circle(_) => ShapeKind::Circle,
            Self::Polygon(_) => ShapeKind::Polygon,
            Self::Rectangle(_) => ShapeKind::Rectangle,
            Self::Union(_) => ShapeKind::Union,
        }
    }
}

impl PointShape {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x: Some(x.into()), y: Some(y.into()) }
    }

    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        Self::from_fields(&Fields::new(DecodeKind::Shape(Some(ShapeKind::Point)), raw)?)
    }

    fn from_fields(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self { x: fields.slot("x")?, y: fields.slot("y")? })
    }
}

impl<'de> Deserialize<'de> for ShapeRegion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(&raw).map_err(de::Error::custom)
    }
}

impl Validate for ShapeRegion {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Point(shape) => shape.validate(),
            Self::Circle(shape) => shape.validate(),
            Self::Polygon(shape) => shape.validate(),
            Self::Rectangle(shape) => shape.validate(),
            Self::Union(shape) => shape.validate(),
        }
    }
}

impl Validate for PointShape {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required("x", &self.x).required("y", &self.y).finish()
    }
}

impl Validate for CircleShape {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required("center", &self.center).required("radius", &self.radius).finish()
    }
}

impl Validate for PolygonShape {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().required_each("points", &self.points).finish()
    }
}

impl Validate for RectangleShape {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("anchor", &self.anchor)
            .required("height", &self.height)
            .required("width", &self.width)
            .finish()
    }
}

impl Validate for UnionShape {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check("shapes", !self.shapes.is_empty(), BLANK);
        v.each("shapes", &self.shapes);
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn point_wins_with_extra_keys() {
        let shape = ShapeRegion::decode(&json!({"x": 4, "y": 5, "anchor": {"x": 0, "y": 0}})).unwrap();
        assert_eq!(shape, ShapeRegion::Point(PointShape::new(4.0, 5.0)));
    }

    #[test]
    fn radius_beats_everything() {
        let shape = ShapeRegion::decode(&json!({"radius": 3, "center": {"x": 1, "y": 1}, "x": 9})).unwrap();
        assert_eq!(
            shape,
            ShapeRegion::Circle(CircleShape {
                center: Some(PointShape::new(1.0, 1.0)),
                radius: Some(VariableSlot::Literal(3.0)),
            })
        );
    }

    #[test]
    fn precedence_order_is_fixed() {
        let order: Vec<_> = SHAPE_PRECEDENCE.iter().map(|(key, _)| *key).collect();
        assert_eq!(order, ["radius", "x", "points", "anchor", "shapes"]);
    }

    #[test]
    fn union_recurses() {
        let raw = json!({"shapes": [
            {"points": [{"x": 0, "y": 0}, {"x": 10, "y": 0}, {"x": 5, "y": {"var": "peak"}}]},
            {"anchor": {"x": 1, "y": 2}, "width": 30, "height": 40}
        ]});
        let shape = ShapeRegion::decode(&raw).unwrap();
        let ShapeRegion::Union(union) = &shape else { panic!("expected union, got {shape:?}") };
        assert_eq!(union.shapes[0].kind(), ShapeKind::Polygon);
        assert_eq!(union.shapes[1].kind(), ShapeKind::Rectangle);
        assert_eq!(serde_json::to_value(&shape).unwrap(), raw);
    }

    #[test]
    fn no_marker_key_is_invalid() {
        let err = ShapeRegion::decode(&json!({"y": 1, "width": 2})).unwrap_err();
        assert!(matches!(err.cause, DecodeCause::InvalidShape));
        assert_eq!(err.to_string(), "unmarshalling shape: invalid shape type");
    }

    #[test]
    fn validation_reports_missing_members() {
        let shape = ShapeRegion::decode(&json!({"anchor": {"x": 1}})).unwrap();
        let err = shape.validate().unwrap_err();
        assert_eq!(err.get("anchor.y"), Some(BLANK));
        assert_eq!(err.get("height"), Some(BLANK));
        assert_eq!(err.get("width"), Some(BLANK));
    }
}
