//! Typed reads over one JSON object.
//!
//! Every decoder walks its object through a [`Fields`] so nested failures are
//! wrapped with the owning kind and field name. `null` reads as absent.
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{DecodeCause, DecodeError, DecodeKind};
use crate::image::ImageSource;
use crate::path_de::from_value_with_path;
use crate::shape::{PointShape, ShapeRegion};
use crate::transformation::TransformationNode;
use crate::variable::{SlotValue, VariableSlot};

#[derive(Debug, Clone)]
pub struct Fields<'a> {
    kind: DecodeKind,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub fn new(kind: DecodeKind, raw: &'a Value) -> Result<Self, DecodeError> {
        match raw {
            Value::Object(map) => Ok(Self { kind, map }),
            _ => Err(DecodeError::new(kind, DecodeCause::NotAnObject)),
        }
    }

    /// Same object, failures attributed to `kind` from here on.
    pub fn retarget(&self, kind: DecodeKind) -> Self {
        Self { kind, map: self.map }
    }

    pub fn kind(&self) -> &DecodeKind {
        &self.kind
    }

    pub fn map(&self) -> &'a Map<String, Value> {
        self.map
    }

    /// Whether the key exists at all, `null` included.
    pub fn has_key(&self, field: &str) -> bool {
        self.map.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|value| !value.is_null())
    }

    pub fn fail(&self, cause: impl Into<DecodeCause>) -> DecodeError {
        DecodeError::new(self.kind.clone(), cause)
    }

    fn within(&self, field: &str, inner: DecodeError) -> DecodeError {
        DecodeError::field(self.kind.clone(), field, inner)
    }

    /// Decodes a present field with `decode`, attributing failures to it.
    pub fn with<T>(
        &self,
        field: &str,
        decode: impl FnOnce(&'a Value) -> Result<T, DecodeError>,
    ) -> Result<Option<T>, DecodeError> {
        self.get(field)
            .map(|raw| decode(raw).map_err(|err| self.within(field, err)))
            .transpose()
    }

    /// Decodes every member of a present array field.
    pub fn each<T>(
        &self,
        field: &str,
        decode: impl Fn(&'a Value) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let Some(raw) = self.get(field) else {
            return Ok(Vec::new());
        };
        let list = DecodeKind::List(field.to_owned());
        let Value::Array(items) = raw else {
            return Err(self.within(field, DecodeError::new(list, DecodeCause::NotAnArray)));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                decode(item).map_err(|err| self.within(field, DecodeError::element(list.clone(), index, err)))
            })
            .collect()
    }

    /// Plain serde field (strings, numbers, enum lists).
    pub fn value<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, DecodeError> {
        self.with(field, |raw| from_value_with_path(raw).map_err(|err| self.fail(err)))
    }

    pub fn slot<T: SlotValue>(&self, field: &str) -> Result<Option<VariableSlot<T>>, DecodeError> {
        self.with(field, VariableSlot::decode)
    }

    pub fn node<N: TransformationNode>(&self, field: &str) -> Result<Option<Box<N>>, DecodeError> {
        self.with(field, |raw| N::decode(raw).map(Box::new))
    }

    /// A node list; absent reads as empty, a bad element fails the whole list.
    pub fn nodes<N: TransformationNode>(&self, field: &str) -> Result<Vec<N>, DecodeError> {
        Ok(self.with(field, N::decode_list)?.unwrap_or_default())
    }

    pub fn image<N: TransformationNode>(&self, field: &str) -> Result<Option<ImageSource<N>>, DecodeError> {
        self.with(field, ImageSource::decode)
    }

    pub fn shape(&self, field: &str) -> Result<Option<ShapeRegion>, DecodeError> {
        self.with(field, ShapeRegion::decode)
    }

    pub fn point(&self, field: &str) -> Result<Option<PointShape>, DecodeError> {
        self.with(field, PointShape::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlotKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn null_reads_as_absent() {
        let raw = json!({"width": null, "height": 10});
        let fields = Fields::new(DecodeKind::OutputImage, &raw).unwrap();
        assert!(fields.has_key("width"));
        assert_eq!(fields.slot::<i64>("width").unwrap(), None);
        assert_eq!(fields.slot::<i64>("height").unwrap(), Some(VariableSlot::Literal(10)));
    }

    #[test]
    fn field_failures_are_wrapped() {
        let raw = json!({"height": "tall"});
        let fields = Fields::new(DecodeKind::OutputImage, &raw).unwrap();
        let err = fields.slot::<i64>("height").unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::OutputImage);
        assert_eq!(err.path(), "height");
        assert_eq!(err.innermost().kind(), &DecodeKind::Variable(SlotKind::Integer));
    }

    #[test]
    fn each_indexes_elements() {
        let raw = json!({"widths": [1, 2, "x"]});
        let fields = Fields::new(DecodeKind::Breakpoints, &raw).unwrap();
        let err = fields.each("widths", |raw| VariableSlot::<i64>::decode(raw)).unwrap_err();
        assert_eq!(err.path(), "widths[2]");
    }

    #[test]
    fn each_names_the_list_once() {
        let raw = json!({"variables": [{"name": "w", "defaultValue": 1}]});
        let fields = Fields::new(DecodeKind::Policy(None), &raw).unwrap();
        let err = fields.each("variables", crate::variable::Variable::decode).unwrap_err();
        assert_eq!(err.path(), "variables[0].defaultValue");
        assert!(err.involves(&DecodeKind::List("variables".into())));
        assert!(err.to_string().starts_with(
            "unmarshalling policy: field 'variables': unmarshalling variables: element 0: \
             unmarshalling variable declaration: field 'defaultValue': "
        ));
        assert_eq!(err.to_string().matches("unmarshalling policy").count(), 1);

        let raw = json!({"variables": {"name": "w"}});
        let fields = Fields::new(DecodeKind::Policy(None), &raw).unwrap();
        let err = fields.each("variables", crate::variable::Variable::decode).unwrap_err();
        assert_eq!(err.to_string(), "unmarshalling policy: field 'variables': unmarshalling variables: expected a JSON array");
    }

    #[test]
    fn rejects_non_objects() {
        let raw = json!([1]);
        let err = Fields::new(DecodeKind::RolloutInfo, &raw).unwrap_err();
        assert!(matches!(err.cause, DecodeCause::NotAnObject));
    }
}
