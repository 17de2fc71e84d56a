//! Decode error model.
//!
//! Every failure carries the [`DecodeKind`] of the thing being decoded plus a
//! [`DecodeCause`]. Nested failures (a field of a node, an element of a list)
//! keep the inner error boxed, so callers can walk the chain and ask which
//! shape of thing failed without matching on message text.
use std::fmt;

use thiserror::Error;

use crate::enums::TransformationKind;
use crate::image::ImageKind;
use crate::path_de::PathError;
use crate::policy::PolicyKind;
use crate::shape::ShapeKind;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Literal type carried by a variable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Bool,
    Integer,
    Number,
    String,
    Gravity,
    GravityPriority,
    Placement,
    ScaleDimension,
    Dimension,
    FaceCropAlgorithm,
    FaceCropFocus,
    CropStyle,
    GrayscaleType,
    ResizeAspect,
    ResizeType,
    PerceptualQuality,
    /// reference-only slot (`ImQuery.query`)
    Query,
}

/// Which decodable thing failed.
///
/// `None` payloads mark failures during dispatch, before the concrete variant
/// was known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeKind {
    Variable(SlotKind),
    VariableDeclaration,
    Shape(Option<ShapeKind>),
    Image(Option<ImageKind>),
    ImagePost(Option<ImageKind>),
    Transformation(Option<TransformationKind>),
    PostBreakpointTransformation(Option<TransformationKind>),
    TransformationList,
    PostBreakpointTransformationList,
    OutputImage,
    OutputVideo,
    Breakpoints,
    RolloutInfo,
    Policy(Option<PolicyKind>),
    PolicyList,
    /// a plain array member, named by its field
    List(String),
}

#[derive(Debug, Error)]
pub enum DecodeCause {
    #[error("{0}")]
    Path(#[from] PathError),
    #[error("field '{field}': {inner}")]
    Field { field: String, inner: Box<DecodeError> },
    #[error("element {index}: {inner}")]
    Element { index: usize, inner: Box<DecodeError> },
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("expected a JSON array")]
    NotAnArray,
    #[error("transformation should contain 'transformation' field")]
    MissingTag,
    #[error("'transformation' field on transformation entry should be a string")]
    TagNotString,
    #[error("unsupported transformation type: {0}")]
    UnknownTransformation(String),
    #[error("missing image type")]
    MissingImageType,
    #[error("'type' field on image should be a string")]
    ImageTypeNotString,
    #[error("invalid image type: {0}")]
    UnknownImageType(String),
    #[error("invalid shape type")]
    InvalidShape,
    #[error("decoded as {decoded} but tagged {tag}")]
    TagMismatch { tag: String, decoded: String },
    #[error("'video' field on policy should be a boolean")]
    VideoNotBool,
}

#[derive(Debug, Error)]
#[error("unmarshalling {kind}: {cause}")]
pub struct DecodeError {
    pub kind: DecodeKind,
    pub cause: DecodeCause,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SlotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Gravity => "gravity",
            Self::GravityPriority => "gravityPriority",
            Self::Placement => "placement",
            Self::ScaleDimension => "scaleDimension",
            Self::Dimension => "dimension",
            Self::FaceCropAlgorithm => "faceCropAlgorithm",
            Self::FaceCropFocus => "faceCropFocus",
            Self::CropStyle => "cropStyle",
            Self::GrayscaleType => "grayscaleType",
            Self::ResizeAspect => "resizeAspect",
            Self::ResizeType => "resizeType",
            Self::PerceptualQuality => "perceptualQuality",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DecodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(slot) => write!(f, "{slot} variable"),
            Self::VariableDeclaration => f.write_str("variable declaration"),
            Self::Shape(Some(shape)) => write!(f, "{shape} shape"),
            Self::Shape(None) => f.write_str("shape"),
            Self::Image(Some(image)) => write!(f, "{image} image"),
            Self::Image(None) => f.write_str("image"),
            Self::ImagePost(Some(image)) => write!(f, "{image} post-breakpoint image"),
            Self::ImagePost(None) => f.write_str("post-breakpoint image"),
            Self::Transformation(Some(tag)) => write!(f, "{tag} transformation"),
            Self::Transformation(None) => f.write_str("transformation"),
            Self::PostBreakpointTransformation(Some(tag)) => {
                write!(f, "{tag} post-breakpoint transformation")
            }
            Self::PostBreakpointTransformation(None) => f.write_str("post-breakpoint transformation"),
            Self::TransformationList => f.write_str("transformations"),
            Self::PostBreakpointTransformationList => f.write_str("post-breakpoint transformations"),
            Self::OutputImage => f.write_str("image output"),
            Self::OutputVideo => f.write_str("video output"),
            Self::Breakpoints => f.write_str("breakpoints"),
            Self::RolloutInfo => f.write_str("rollout info"),
            Self::Policy(Some(kind)) => write!(f, "{kind} policy"),
            Self::Policy(None) => f.write_str("policy"),
            Self::PolicyList => f.write_str("policy list"),
            Self::List(field) => f.write_str(field),
        }
    }
}

impl DecodeError {
    pub fn new(kind: DecodeKind, cause: impl Into<DecodeCause>) -> Self {
        Self { kind, cause: cause.into() }
    }

    /// Wraps `inner` as the failure of `field` on a value of `kind`.
    pub fn field(kind: DecodeKind, field: &str, inner: DecodeError) -> Self {
        Self::new(kind, DecodeCause::Field { field: field.to_owned(), inner: Box::new(inner) })
    }

    /// Wraps `inner` as the failure of element `index` in a list of `kind`.
    pub fn element(kind: DecodeKind, index: usize, inner: DecodeError) -> Self {
        Self::new(kind, DecodeCause::Element { index, inner: Box::new(inner) })
    }

    pub fn kind(&self) -> &DecodeKind {
        &self.kind
    }

    /// This error followed by every nested field/element error, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &DecodeError> {
        std::iter::successors(Some(self), |err| match &err.cause {
            DecodeCause::Field { inner, .. } | DecodeCause::Element { inner, .. } => Some(inner.as_ref()),
            _ => None,
        })
    }

    /// The deepest error in the chain, i.e. the one that actually failed.
    pub fn innermost(&self) -> &DecodeError {
        self.chain().last().unwrap_or(self)
    }

    pub fn involves(&self, kind: &DecodeKind) -> bool {
        self.chain().any(|err| &err.kind == kind)
    }

    /// The unrecognised transformation or image tag, if that is what failed.
    pub fn unknown_tag(&self) -> Option<&str> {
        match &self.innermost().cause {
            DecodeCause::UnknownTransformation(tag) | DecodeCause::UnknownImageType(tag) => Some(tag),
            _ => None,
        }
    }

    /// Location of the failure inside the document, e.g. `transformations[2].default.width`.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for err in self.chain() {
            match &err.cause {
                DecodeCause::Field { field, .. } => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(field);
                }
                DecodeCause::Element { index, .. } => {
                    out.push_str(&format!("[{index}]"));
                }
                _ => {}
            }
        }
        out
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> DecodeError {
        let leaf = DecodeError::new(
            DecodeKind::Transformation(None),
            DecodeCause::UnknownTransformation("NotAThing".into()),
        );
        let list = DecodeError::element(DecodeKind::TransformationList, 1, leaf);
        let compound = DecodeError::field(
            DecodeKind::Transformation(Some(TransformationKind::Compound)),
            "transformations",
            list,
        );
        DecodeError::element(DecodeKind::TransformationList, 0, compound)
    }

    #[test]
    fn chain_walks_to_the_failing_leaf() {
        let err = nested();
        assert_eq!(err.chain().count(), 4);
        assert_eq!(err.innermost().kind(), &DecodeKind::Transformation(None));
        assert_eq!(err.unknown_tag(), Some("NotAThing"));
        assert!(err.involves(&DecodeKind::Transformation(Some(TransformationKind::Compound))));
        assert!(!err.involves(&DecodeKind::PostBreakpointTransformationList));
    }

    #[test]
    fn path_joins_fields_and_indices() {
        assert_eq!(nested().path(), "[0].transformations[1]");
        let err = DecodeError::field(DecodeKind::Policy(None), "transformations", nested());
        assert_eq!(err.path(), "transformations[0].transformations[1]");
    }

    #[test]
    fn display_names_kind_and_tag() {
        let msg = nested().to_string();
        assert!(msg.starts_with("unmarshalling transformations: element 0:"));
        assert!(msg.contains("unsupported transformation type: NotAThing"));
    }
}
