//! Codec for Image & Video Manager policies.
//!
//! Decodes policy JSON into typed trees (transformations, images, shapes and
//! literal-or-variable slots), encodes them back to the same wire form and
//! validates them field by field.
pub mod enums;
pub mod error;
pub mod fields;
pub mod image;
pub mod output;
pub mod path_de;
pub mod policy;
pub mod shape;
pub mod transformation;
pub mod validate;
pub mod variable;

use serde_json::Value;

pub use error::{DecodeCause, DecodeError, DecodeKind};
pub use image::{ImageSource, ImageSourcePost, PreImageSource};
pub use output::{Breakpoints, OutputImage, OutputVideo, RolloutInfo};
pub use policy::{PolicyDocument, PolicyInput, PolicyKind, PolicyList};
pub use shape::ShapeRegion;
pub use transformation::post::PostBreakpointTransformation;
pub use transformation::{Transformation, TransformationNode};
pub use validate::{Validate, ValidationErrors};
pub use variable::{Variable, VariableSlot};

fn parse(kind: DecodeKind, bytes: &[u8]) -> Result<Value, DecodeError> {
    path_de::from_slice_with_path(bytes).map_err(|err| DecodeError::new(kind, err))
}

/// Decodes one policy version, resolving whether it is an image or a video policy.
pub fn decode_policy(bytes: &[u8]) -> Result<PolicyDocument, DecodeError> {
    PolicyDocument::decode(&parse(DecodeKind::Policy(None), bytes)?)
}

/// Decodes a ListPolicies response.
pub fn decode_policy_list(bytes: &[u8]) -> Result<PolicyList, DecodeError> {
    PolicyList::decode(&parse(DecodeKind::PolicyList, bytes)?)
}

pub fn encode_policy(document: &PolicyDocument) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(document)
}

pub fn encode_policy_input(input: &PolicyInput) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bytes_round_trip() {
        let bytes = include_bytes!("../fixtures/post_breakpoint.json");
        let document = decode_policy(bytes).unwrap();
        let encoded = encode_policy(&document).unwrap();
        assert_eq!(decode_policy(&encoded).unwrap(), document);
        let text = String::from_utf8(encoded).unwrap();
        assert!(text.contains(r#"{"transformation":"Append","#));
    }

    #[test]
    fn malformed_json_reports_the_policy_kind() {
        let err = decode_policy(b"{\"id\": ").unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::Policy(None));
        assert!(matches!(err.cause, DecodeCause::Path(_)));
    }

    #[test]
    fn list_bytes_decode() {
        let list = decode_policy_list(include_bytes!("../fixtures/policy_list.json")).unwrap();
        assert_eq!(list.items.len(), 8);
    }

    #[test]
    fn documents_deserialize_through_serde() {
        let raw = r#"{"video": true, "id": "clip", "output": {"videoAdaptiveQuality": "low"}}"#;
        let document: PolicyDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(document.kind(), PolicyKind::Video);
        let input = encode_policy_input(&document.to_input()).unwrap();
        assert_eq!(input, br#"{"output":{"videoAdaptiveQuality":"low"}}"#.to_vec());
    }
}
