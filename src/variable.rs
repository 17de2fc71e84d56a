//! Literal-or-reference leaf fields and policy variable declarations.
use serde::de::{self, DeserializeOwned};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::enums::{
    CropStyle, Dimension, FaceCropAlgorithm, FaceCropFocus, Gravity, GravityPriority, GrayscaleType,
    PerceptualQuality, Placement, ResizeAspect, ResizeType, ScaleDimension, VariableType,
};
use crate::error::{DecodeError, DecodeKind, SlotKind};
use crate::fields::Fields;
use crate::path_de::from_value_with_path;
use crate::validate::{BLANK, INVALID_VALUE, Validate, ValidationErrors, Validator};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A literal type a [`VariableSlot`] can hold.
pub trait SlotValue: Sized + Clone + PartialEq + std::fmt::Debug + Serialize + DeserializeOwned {
    const KIND: SlotKind;

    /// Rule violation for a literal of this type, if any.
    fn violation(&self) -> Option<&'static str> {
        None
    }

    fn serialize_literal<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize(serializer)
    }
}

/// Either a literal value or `{"var": name}`.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableSlot<T> {
    Literal(T),
    Reference(String),
}

/// A slot that only accepts `{"var": name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableReference {
    pub var: String,
}

/// A policy-level variable declaration.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub default_value: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_options: Vec<EnumOption>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postfix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(rename = "type")]
    pub var_type: VariableType,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EnumOption {
    pub id: String,
    pub value: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SlotValue for bool {
    const KIND: SlotKind = SlotKind::Bool;
}

impl SlotValue for i64 {
    const KIND: SlotKind = SlotKind::Integer;
}

impl SlotValue for String {
    const KIND: SlotKind = SlotKind::String;
}

impl SlotValue for f64 {
    const KIND: SlotKind = SlotKind::Number;

    // integral values go out as integers, the way the API itself writes them
    fn serialize_literal<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_finite() && self.fract() == 0.0 && self.abs() < 9.0e15 {
            serializer.serialize_i64(*self as i64)
        } else {
            serializer.serialize_f64(*self)
        }
    }
}

macro_rules! enum_slot {
    ($($ty:ident => $kind:ident),+ $(,)?) => {
        $(
            impl SlotValue for $ty {
                const KIND: SlotKind = SlotKind::$kind;

                fn violation(&self) -> Option<&'static str> {
                    (!self.is_known()).then_some(INVALID_VALUE)
                }
            }
        )+
    };
}

enum_slot! {
    Gravity => Gravity,
    GravityPriority => GravityPriority,
    Placement => Placement,
    ScaleDimension => ScaleDimension,
    Dimension => Dimension,
    FaceCropAlgorithm => FaceCropAlgorithm,
    FaceCropFocus => FaceCropFocus,
    CropStyle => CropStyle,
    GrayscaleType => GrayscaleType,
    ResizeAspect => ResizeAspect,
    ResizeType => ResizeType,
    PerceptualQuality => PerceptualQuality,
}

/// The referenced variable name when `raw` is `{"var": "<name>"}`.
pub(crate) fn reference_name(raw: &Value) -> Option<&str> {
    raw.as_object()?.get("var")?.as_str()
}

impl<T: SlotValue> VariableSlot<T> {
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        if let Some(name) = reference_name(raw) {
            return Ok(Self::Reference(name.to_owned()));
        }
        from_value_with_path::<T>(raw)
            .map(Self::Literal)
            .map_err(|err| DecodeError::new(DecodeKind::Variable(T::KIND), err))
    }

    pub fn literal(&self) -> Option<&T> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Reference(_) => None,
        }
    }

    pub fn reference_to(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Reference(name) => Some(name),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

impl<T> From<T> for VariableSlot<T> {
    fn from(value: T) -> Self {
        Self::Literal(value)
    }
}

impl<T: SlotValue> Serialize for VariableSlot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(value) => value.serialize_literal(serializer),
            Self::Reference(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("var", name)?;
                map.end()
            }
        }
    }
}

impl<'de, T: SlotValue> Deserialize<'de> for VariableSlot<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(&raw).map_err(de::Error::custom)
    }
}

impl<T: SlotValue> Validate for VariableSlot<T> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        match self {
            Self::Literal(value) => {
                if let Some(message) = value.violation() {
                    v.violation("", message);
                }
            }
            Self::Reference(name) => {
                v.check("var", !name.is_empty(), BLANK);
            }
        }
        v.finish()
    }
}

impl VariableReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { var: name.into() }
    }

    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        #[derive(Deserialize)]
        struct Wire {
            var: String,
        }
        from_value_with_path::<Wire>(raw)
            .map(|wire| Self { var: wire.var })
            .map_err(|err| DecodeError::new(DecodeKind::Variable(SlotKind::Query), err))
    }
}

impl<'de> Deserialize<'de> for VariableReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(&raw).map_err(de::Error::custom)
    }
}

impl Validate for VariableReference {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new().check("var", !self.var.is_empty(), BLANK).finish()
    }
}

impl Variable {
    pub fn new(name: impl Into<String>, var_type: VariableType, default_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type,
            default_value: default_value.into(),
            ..Self::default()
        }
    }

    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::VariableDeclaration, raw)?;
        Ok(Self {
            default_value: fields.value("defaultValue")?.unwrap_or_default(),
            enum_options: fields.each("enumOptions", EnumOption::decode)?,
            name: fields.value("name")?.unwrap_or_default(),
            postfix: fields.value("postfix")?,
            prefix: fields.value("prefix")?,
            var_type: fields.value("type")?.unwrap_or_default(),
        })
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(&raw).map_err(de::Error::custom)
    }
}

impl EnumOption {
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::VariableDeclaration, raw)?;
        Ok(Self {
            id: fields.value("id")?.unwrap_or_default(),
            value: fields.value("value")?.unwrap_or_default(),
        })
    }
}

impl Validate for Variable {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.check(
            "defaultValue",
            !self.default_value.is_empty() || self.var_type == VariableType::String,
            BLANK,
        );
        v.each("enumOptions", &self.enum_options);
        v.check("name", !self.name.is_empty(), BLANK);
        match &self.var_type {
            VariableType::Other(raw) if raw.is_empty() => v.violation("type", BLANK),
            other => v.check("type", other.is_known(), INVALID_VALUE),
        };
        v.finish()
    }
}

impl Validate for EnumOption {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .check("id", !self.id.is_empty(), BLANK)
            .check("value", !self.value.is_empty(), BLANK)
            .finish()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reference_wins_over_literal() {
        let slot = VariableSlot::<f64>::decode(&json!({"var": "blurVar"})).unwrap();
        assert_eq!(slot, VariableSlot::reference("blurVar"));
        assert_eq!(slot.literal(), None);
        assert_eq!(slot.reference_to(), Some("blurVar"));
    }

    #[test]
    fn literal_of_the_slot_type() {
        assert_eq!(VariableSlot::<i64>::decode(&json!(2)).unwrap(), VariableSlot::Literal(2));
        assert_eq!(
            VariableSlot::<Gravity>::decode(&json!("NorthEast")).unwrap(),
            VariableSlot::Literal(Gravity::NorthEast)
        );
    }

    #[test]
    fn wrong_literal_type_names_the_slot_kind() {
        let err = VariableSlot::<i64>::decode(&json!("two")).unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::Variable(SlotKind::Integer));
        let err = VariableSlot::<bool>::decode(&json!({"name": "x"})).unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::Variable(SlotKind::Bool));
        assert!(err.to_string().starts_with("unmarshalling bool variable"));
    }

    #[test]
    fn encodes_native_values_and_references() {
        assert_eq!(serde_json::to_value(VariableSlot::Literal(3.0_f64)).unwrap(), json!(3));
        assert_eq!(serde_json::to_value(VariableSlot::Literal(0.25_f64)).unwrap(), json!(0.25));
        assert_eq!(
            serde_json::to_value(VariableSlot::<String>::reference("color")).unwrap(),
            json!({"var": "color"})
        );
    }

    #[test]
    fn enum_literals_validate_membership() {
        let slot = VariableSlot::<Gravity>::decode(&json!("Middle")).unwrap();
        let err = slot.validate().unwrap_err();
        assert_eq!(err.get(""), Some(INVALID_VALUE));
        assert!(VariableSlot::<Gravity>::reference("g").validate().is_ok());
    }

    #[test]
    fn query_is_reference_only() {
        assert_eq!(VariableReference::decode(&json!({"var": "q"})).unwrap(), VariableReference::new("q"));
        let err = VariableReference::decode(&json!("q")).unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::Variable(SlotKind::Query));
    }

    #[test]
    fn variable_declaration_rules() {
        let ok = Variable::decode(&json!({"name": "width", "type": "number", "defaultValue": "320"})).unwrap();
        assert!(ok.validate().is_ok());

        let text = Variable::new("caption", VariableType::String, "");
        assert!(text.validate().is_ok());

        let bad = Variable::decode(&json!({
            "name": "",
            "type": "colour",
            "enumOptions": [{"id": "a"}]
        }))
        .unwrap();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.get("defaultValue"), Some(BLANK));
        assert_eq!(err.get("enumOptions[0].value"), Some(BLANK));
        assert_eq!(err.get("name"), Some(BLANK));
        assert_eq!(err.get("type"), Some(INVALID_VALUE));
    }

    #[test]
    fn null_members_read_as_absent() {
        let declared = Variable::decode(&json!({
            "name": "w",
            "type": "number",
            "defaultValue": "1",
            "enumOptions": null,
            "postfix": null
        }))
        .unwrap();
        assert_eq!(declared, Variable::new("w", VariableType::Number, "1"));

        let sparse = Variable::decode(&json!({
            "name": "mode",
            "type": null,
            "defaultValue": null,
            "enumOptions": [{"id": null, "value": "fit"}]
        }))
        .unwrap();
        assert_eq!(sparse.var_type, VariableType::default());
        assert_eq!(sparse.enum_options, vec![EnumOption { id: String::new(), value: "fit".into() }]);
        let err = sparse.validate().unwrap_err();
        assert_eq!(err.get("type"), Some(BLANK));
        assert_eq!(err.get("enumOptions[0].id"), Some(BLANK));
    }

    #[test]
    fn declaration_failures_name_the_member() {
        let err = Variable::decode(&json!({"name": "w", "enumOptions": [{"id": "a", "value": 3}]})).unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::VariableDeclaration);
        assert_eq!(err.path(), "enumOptions[0].value");
    }
}
