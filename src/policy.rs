//! Policy documents, list responses and upsert inputs.
//!
//! A document is an image or a video policy. The JSON carries no reliable
//! discriminator, so [`PolicyDocument::decode`] resolves the kind from the
//! `video` flag first and falls back to which groups the object carries.
use std::collections::BTreeSet;
use std::fmt;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{DecodeCause, DecodeError, DecodeKind};
use crate::fields::Fields;
use crate::output::{
    Breakpoints, IMAGE_ONLY_KEYS, OutputImage, OutputVideo, RolloutInfo, VIDEO_ONLY_KEYS, check_rollout_duration,
};
use crate::transformation::post::PostBreakpointTransformation;
use crate::transformation::{Transformation, TransformationNode};
use crate::validate::{BLANK, INVALID_VALUE, Validate, ValidationErrors, Validator};
use crate::variable::{Variable, reference_name};

const TRANSFORMATION_LISTS: &[&str] = &["transformations", "postBreakpointTransformations"];

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Image,
    Video,
}

/// Fields every stored policy version carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyMetadata {
    pub id: String,
    pub version: i64,
    pub previous_version: i64,
    pub rollout_info: Option<RolloutInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    pub user: String,
    pub date_created: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePolicy {
    #[serde(flatten)]
    pub metadata: PolicyMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Breakpoints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transformations: Vec<Transformation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_breakpoint_transformations: Vec<PostBreakpointTransformation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPolicy {
    #[serde(flatten)]
    pub metadata: PolicyMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Breakpoints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputVideo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<bool>,
}

/// A stored policy version as the API returns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PolicyDocument {
    Image(ImagePolicy),
    Video(VideoPolicy),
}

/// A ListPolicies response.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyList {
    pub item_kind: String,
    pub items: Vec<PolicyDocument>,
    pub total_items: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePolicyInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Breakpoints>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_breakpoint_transformations: Vec<PostBreakpointTransformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_duration: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transformations: Vec<Transformation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPolicyInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Breakpoints>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputVideo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollout_duration: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,
}

/// Body of a create/update request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PolicyInput {
    Image(ImagePolicyInput),
    Video(VideoPolicyInput),
}

// ————————————————————————————————————————————————————————————————————————————
// KIND RESOLUTION
// ————————————————————————————————————————————————————————————————————————————

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Resolves the kind of a policy object.
    ///
    /// An explicit `video` flag wins. Without one, transformation lists or an
    /// image-only output key mean image, a video-only output key means video,
    /// and anything else is an image policy.
    pub fn detect(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        match fields.get("video") {
            Some(Value::Bool(true)) => return Ok(Self::Video),
            Some(Value::Bool(false)) => return Ok(Self::Image),
            Some(_) => return Err(fields.fail(DecodeCause::VideoNotBool)),
            None => {}
        }
        if TRANSFORMATION_LISTS.iter().any(|key| fields.get(key).is_some()) {
            return Ok(Self::Image);
        }
        let output = fields.get("output").and_then(Value::as_object);
        let carries = |keys: &[&str]| output.is_some_and(|output| keys.iter().any(|key| output.contains_key(*key)));
        if carries(IMAGE_ONLY_KEYS) {
            Ok(Self::Image)
        } else if carries(VIDEO_ONLY_KEYS) {
            Ok(Self::Video)
        } else {
            Ok(Self::Image)
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DECODING
// ————————————————————————————————————————————————————————————————————————————

impl PolicyMetadata {
    fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            id: fields.value("id")?.unwrap_or_default(),
            version: fields.value("version")?.unwrap_or_default(),
            previous_version: fields.value("previousVersion")?.unwrap_or_default(),
            rollout_info: fields.with("rolloutInfo", RolloutInfo::decode)?,
            hosts: fields.value("hosts")?.unwrap_or_default(),
            user: fields.value("user")?.unwrap_or_default(),
            date_created: fields.value("dateCreated")?.unwrap_or_default(),
        })
    }
}

impl ImagePolicy {
    fn decode_fields(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            metadata: PolicyMetadata::decode(fields)?,
            breakpoints: fields.with("breakpoints", Breakpoints::decode)?,
            output: fields.with("output", OutputImage::decode)?,
            transformations: fields.nodes("transformations")?,
            post_breakpoint_transformations: fields.nodes("postBreakpointTransformations")?,
            variables: fields.each("variables", Variable::decode)?,
            video: fields.value("video")?,
        })
    }
}

impl VideoPolicy {
    fn decode_fields(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        let metadata = PolicyMetadata::decode(fields)?;
        let ignored: Vec<&str> = TRANSFORMATION_LISTS.iter().copied().filter(|key| fields.get(key).is_some()).collect();
        if !ignored.is_empty() {
            tracing::warn!(id = %metadata.id, groups = ?ignored, "video policy carries transformation lists; ignoring them");
        }
        Ok(Self {
            metadata,
            breakpoints: fields.with("breakpoints", Breakpoints::decode)?,
            output: fields.with("output", OutputVideo::decode)?,
            variables: fields.each("variables", Variable::decode)?,
            video: fields.value("video")?,
        })
    }
}

impl PolicyDocument {
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::Policy(None), raw)?;
        let kind = PolicyKind::detect(&fields)?;
        let fields = fields.retarget(DecodeKind::Policy(Some(kind)));
        let document = match kind {
            PolicyKind::Image => ImagePolicy::decode_fields(&fields).map(Self::Image)?,
            PolicyKind::Video => VideoPolicy::decode_fields(&fields).map(Self::Video)?,
        };
        tracing::debug!(id = %document.id(), %kind, "decoded policy");
        Ok(document)
    }
}

impl PolicyList {
    pub fn decode(raw: &Value) -> Result<Self, DecodeError> {
        let fields = Fields::new(DecodeKind::PolicyList, raw)?;
        let list = Self {
            item_kind: fields.value("itemKind")?.unwrap_or_default(),
            items: fields.each("items", PolicyDocument::decode)?,
            total_items: fields.value("totalItems")?.unwrap_or_default(),
        };
        tracing::debug!(items = list.items.len(), total = list.total_items, "decoded policy list");
        Ok(list)
    }
}

impl<'de> Deserialize<'de> for PolicyDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(&raw).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for PolicyList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::decode(&raw).map_err(de::Error::custom)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INSPECTION
// ————————————————————————————————————————————————————————————————————————————

impl PolicyDocument {
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Image(_) => PolicyKind::Image,
            Self::Video(_) => PolicyKind::Video,
        }
    }

    pub fn metadata(&self) -> &PolicyMetadata {
        match self {
            Self::Image(policy) => &policy.metadata,
            Self::Video(policy) => &policy.metadata,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata().id
    }

    pub fn version(&self) -> i64 {
        self.metadata().version
    }

    pub fn variables(&self) -> &[Variable] {
        match self {
            Self::Image(policy) => &policy.variables,
            Self::Video(policy) => &policy.variables,
        }
    }

    /// Pre-breakpoint steps; always empty for video policies.
    pub fn transformations(&self) -> &[Transformation] {
        match self {
            Self::Image(policy) => &policy.transformations,
            Self::Video(_) => &[],
        }
    }

    pub fn post_breakpoint_transformations(&self) -> &[PostBreakpointTransformation] {
        match self {
            Self::Image(policy) => &policy.post_breakpoint_transformations,
            Self::Video(_) => &[],
        }
    }

    /// Total nodes across both transformation lists.
    pub fn node_count(&self) -> usize {
        self.transformations().iter().map(Transformation::node_count).sum::<usize>()
            + self.post_breakpoint_transformations().iter().map(PostBreakpointTransformation::node_count).sum::<usize>()
    }

    /// Deepest tree across both transformation lists.
    pub fn depth(&self) -> usize {
        let pre = self.transformations().iter().map(Transformation::depth).max().unwrap_or(0);
        let post = self.post_breakpoint_transformations().iter().map(PostBreakpointTransformation::depth).max();
        pre.max(post.unwrap_or(0))
    }

    /// Every variable name referenced anywhere in the document, sorted.
    pub fn references(&self) -> serde_json::Result<BTreeSet<String>> {
        fn collect(raw: &Value, names: &mut BTreeSet<String>) {
            if let Some(name) = reference_name(raw) {
                names.insert(name.to_owned());
                return;
            }
            match raw {
                Value::Array(items) => items.iter().for_each(|item| collect(item, names)),
                Value::Object(map) => map.values().for_each(|value| collect(value, names)),
                _ => {}
            }
        }
        let raw = serde_json::to_value(self)?;
        let mut names = BTreeSet::new();
        collect(&raw, &mut names);
        Ok(names)
    }

    /// Referenced names with no matching declaration in `variables`.
    pub fn unresolved_references(&self) -> serde_json::Result<Vec<String>> {
        let declared: BTreeSet<&str> = self.variables().iter().map(|variable| variable.name.as_str()).collect();
        Ok(self.references()?.into_iter().filter(|name| !declared.contains(name.as_str())).collect())
    }

    /// The upsert body that recreates this version.
    pub fn to_input(&self) -> PolicyInput {
        let rollout_duration = self.metadata().rollout_info.map(|info| info.rollout_duration).filter(|d| *d != 0);
        match self {
            Self::Image(policy) => PolicyInput::Image(ImagePolicyInput {
                breakpoints: policy.breakpoints.clone(),
                hosts: policy.metadata.hosts.clone(),
                output: policy.output.clone(),
                post_breakpoint_transformations: policy.post_breakpoint_transformations.clone(),
                rollout_duration,
                transformations: policy.transformations.clone(),
                variables: policy.variables.clone(),
            }),
            Self::Video(policy) => PolicyInput::Video(VideoPolicyInput {
                breakpoints: policy.breakpoints.clone(),
                hosts: policy.metadata.hosts.clone(),
                output: policy.output.clone(),
                rollout_duration,
                variables: policy.variables.clone(),
            }),
        }
    }
}

impl PolicyInput {
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Image(_) => PolicyKind::Image,
            Self::Video(_) => PolicyKind::Video,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATION
// ————————————————————————————————————————————————————————————————————————————

impl Validate for PolicyMetadata {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .check("id", !self.id.is_empty(), BLANK)
            .check("version", self.version != 0, BLANK)
            .required("rolloutInfo", &self.rollout_info)
            .check("user", !self.user.is_empty(), BLANK)
            .check("dateCreated", !self.date_created.is_empty(), BLANK)
            .finish()
    }
}

impl Validate for ImagePolicy {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .nested("", &self.metadata)
            .optional("output", &self.output)
            .each("transformations", &self.transformations)
            .each("postBreakpointTransformations", &self.post_breakpoint_transformations)
            .each("variables", &self.variables)
            .check("video", self.video != Some(true), INVALID_VALUE)
            .finish()
    }
}

impl Validate for VideoPolicy {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .nested("", &self.metadata)
            .optional("output", &self.output)
            .each("variables", &self.variables)
            .check("video", self.video != Some(false), INVALID_VALUE)
            .finish()
    }
}

impl Validate for PolicyDocument {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Image(policy) => policy.validate(),
            Self::Video(policy) => policy.validate(),
        }
    }
}

impl Validate for ImagePolicyInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.optional("output", &self.output)
            .each("postBreakpointTransformations", &self.post_breakpoint_transformations);
        check_rollout_duration(&mut v, "rolloutDuration", self.rollout_duration);
        v.each("transformations", &self.transformations).each("variables", &self.variables).finish()
    }
}

impl Validate for VideoPolicyInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.optional("output", &self.output);
        check_rollout_duration(&mut v, "rolloutDuration", self.rollout_duration);
        v.each("variables", &self.variables).finish()
    }
}

impl Validate for PolicyInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Image(input) => input.validate(),
            Self::Video(input) => input.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{PerceptualQuality, TransformationKind, VariableType};
    use crate::variable::VariableSlot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const LIST: &str = include_str!("../fixtures/policy_list.json");
    const MULTIDIMENSION: &str = include_str!("../fixtures/multidimension.json");
    const POST_BREAKPOINT: &str = include_str!("../fixtures/post_breakpoint.json");
    const VIDEO: &str = include_str!("../fixtures/video.json");

    fn parse(raw: &str) -> Value {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn video_flag_decides() {
        let document = PolicyDocument::decode(&json!({"id": "v", "video": true})).unwrap();
        assert_eq!(document.kind(), PolicyKind::Video);

        let raw = json!({
            "id": "i",
            "video": false,
            "transformations": [{"transformation": "MaxColors", "colors": 2}]
        });
        let document = PolicyDocument::decode(&raw).unwrap();
        assert_eq!(document.kind(), PolicyKind::Image);
        assert_eq!(document.transformations()[0].kind(), TransformationKind::MaxColors);
    }

    #[test]
    fn kind_falls_back_to_groups() {
        let cases = [
            (json!({"postBreakpointTransformations": [{"transformation": "Blur"}]}), PolicyKind::Image),
            (json!({"output": {"quality": 80}}), PolicyKind::Image),
            (json!({"output": {"videoAdaptiveQuality": "high"}}), PolicyKind::Video),
            (json!({"output": {"perceptualQuality": "high"}}), PolicyKind::Image),
            (json!({"video": null, "output": {"placeholderVideoUrl": "x"}}), PolicyKind::Video),
            (json!({}), PolicyKind::Image),
        ];
        for (raw, kind) in cases {
            assert_eq!(PolicyDocument::decode(&raw).unwrap().kind(), kind, "{raw}");
        }
    }

    #[test]
    fn non_bool_video_is_rejected() {
        let err = PolicyDocument::decode(&json!({"video": "yes"})).unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::Policy(None));
        assert!(matches!(err.cause, DecodeCause::VideoNotBool));
    }

    #[test]
    fn video_ignores_transformation_lists() {
        let raw = json!({"video": true, "transformations": [{"transformation": "Blur"}]});
        let document = PolicyDocument::decode(&raw).unwrap();
        assert_eq!(document.kind(), PolicyKind::Video);
        assert!(document.transformations().is_empty());
    }

    #[test]
    fn nested_failures_name_the_policy_kind() {
        let raw = json!({"video": false, "transformations": [{"transformation": "Blur"}, {"transformation": "Nope"}]});
        let err = PolicyDocument::decode(&raw).unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::Policy(Some(PolicyKind::Image)));
        assert_eq!(err.path(), "transformations[1]");
        assert_eq!(err.unknown_tag(), Some("Nope"));
        assert!(err.to_string().starts_with("unmarshalling image policy: "));
    }

    #[test]
    fn list_response_dispatches_each_item() {
        let list = PolicyList::decode(&parse(LIST)).unwrap();
        assert_eq!(list.item_kind, "POLICY");
        assert_eq!(list.total_items, 8);
        let kinds: Vec<_> = list.items.iter().map(PolicyDocument::kind).collect();
        assert_eq!(kinds.iter().filter(|kind| **kind == PolicyKind::Video).count(), 1);
        assert_eq!(list.items[7].id(), "updatePolicy");
        assert_eq!(list.items[7].kind(), PolicyKind::Video);

        let example = &list.items[3];
        assert_eq!(example.id(), "example");
        let PolicyDocument::Image(policy) = example else { panic!("expected an image policy") };
        assert_eq!(policy.breakpoints, Some(Breakpoints::new([320, 640, 1024, 2048, 5000])));
        assert_eq!(
            policy.output.as_ref().and_then(|output| output.perceptual_quality.clone()),
            Some(VariableSlot::Literal(PerceptualQuality::MediumHigh))
        );
        assert_eq!(example.unresolved_references().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn list_item_failures_are_indexed() {
        let raw = json!({"itemKind": "POLICY", "items": [{"video": false}, {"video": 1}], "totalItems": 2});
        let err = PolicyList::decode(&raw).unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::PolicyList);
        assert_eq!(err.path(), "items[1]");
        assert!(matches!(err.innermost().cause, DecodeCause::VideoNotBool));
    }

    #[test]
    fn null_variable_members_decode() {
        let raw = json!({
            "video": false,
            "id": "p",
            "variables": [{"name": "w", "type": "number", "defaultValue": "1", "enumOptions": null}]
        });
        let document = PolicyDocument::decode(&raw).unwrap();
        assert_eq!(document.variables(), &[Variable::new("w", VariableType::Number, "1")][..]);
    }

    #[test]
    fn multidimension_chain() {
        let document = PolicyDocument::decode(&parse(MULTIDIMENSION)).unwrap();
        assert_eq!(document.kind(), PolicyKind::Image);
        assert_eq!(document.transformations().len(), 2);
        assert_eq!(document.transformations()[1].depth(), 9);
        assert_eq!(document.transformations()[1].node_count(), 23);
        assert_eq!(document.depth(), 9);
        assert_eq!(document.variables().len(), 5);
        assert_eq!(document.unresolved_references().unwrap(), Vec::<String>::new());

        let encoded = serde_json::to_value(&document).unwrap();
        assert_eq!(PolicyDocument::decode(&encoded).unwrap(), document);

        let err = document.validate().unwrap_err();
        assert_eq!(err.get("rolloutInfo"), Some(BLANK));
        assert_eq!(err.get("user"), Some(BLANK));
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn post_breakpoint_document() {
        let document = PolicyDocument::decode(&parse(POST_BREAKPOINT)).unwrap();
        assert_eq!(document.post_breakpoint_transformations().len(), 2);
        assert_eq!(document.node_count(), 13);
        assert_eq!(document.unresolved_references().unwrap(), vec!["MaxDimOld", "MinDim"]);

        let err = document.validate().unwrap_err();
        assert_eq!(err.get("rolloutInfo.rolloutDuration"), Some("must be no less than 3600"));
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn video_document_round_trips() {
        let raw = parse(VIDEO);
        let document = PolicyDocument::decode(&raw).unwrap();
        assert_eq!(document.kind(), PolicyKind::Video);
        assert!(document.validate().is_ok());
        assert_eq!(serde_json::to_value(&document).unwrap(), raw);
    }

    #[test]
    fn metadata_rules() {
        let raw = json!({
            "video": false,
            "output": {"quality": 0},
            "variables": [{"name": "w", "type": "number"}]
        });
        let err = PolicyDocument::decode(&raw).unwrap().validate().unwrap_err();
        let keys: Vec<_> = err.iter().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec!["id", "version", "rolloutInfo", "user", "dateCreated", "output.quality", "variables[0].defaultValue"]
        );
    }

    #[test]
    fn video_flag_must_match_the_kind() {
        let policy = ImagePolicy { video: Some(true), ..ImagePolicy::default() };
        assert_eq!(policy.validate().unwrap_err().get("video"), Some(INVALID_VALUE));
        let policy = VideoPolicy { video: Some(false), ..VideoPolicy::default() };
        assert_eq!(policy.validate().unwrap_err().get("video"), Some(INVALID_VALUE));
    }

    #[test]
    fn input_keeps_editable_groups() {
        let document = PolicyDocument::decode(&parse(POST_BREAKPOINT)).unwrap();
        let input = document.to_input();
        assert_eq!(input.kind(), PolicyKind::Image);
        let encoded = serde_json::to_value(&input).unwrap();
        assert_eq!(encoded["rolloutDuration"], json!(1));
        assert!(encoded.get("id").is_none());
        assert!(encoded.get("video").is_none());
        assert_eq!(encoded["transformations"].as_array().map(Vec::len), Some(3));

        let err = input.validate().unwrap_err();
        assert_eq!(err.get("rolloutDuration"), Some("must be no less than 3600"));

        let PolicyInput::Video(input) = PolicyDocument::decode(&parse(VIDEO)).unwrap().to_input() else {
            panic!("expected a video input")
        };
        assert_eq!(input.rollout_duration, Some(3600));
        assert!(input.validate().is_ok());
    }
}
