//! Post-breakpoint family: steps applied after the breakpoint resize.
//!
//! Leaf payloads are the same structs as the pre-breakpoint family. The
//! recursive ones are instantiated with this family, so pre-only steps
//! (`Append`, `Crop`, `ImQuery`, ...) cannot appear anywhere in a
//! post-breakpoint tree.
use once_cell::sync::Lazy;

use crate::enums::TransformationKind;
use crate::image::{self, ImageRegistry};
use crate::transformation::{
    BackgroundColor, Blur, ChromaKey, Composite, Compound, Contrast, Family, Goop, Grayscale, Hsl, Hsv, IfDimension,
    IfOrientation, MaxColors, Mirror, MonoHue, Opacity, Registry, RemoveColor, TransformationNode, UnsharpMask,
    node_enum,
};

pub type CompoundPost = Compound<PostBreakpointTransformation>;
pub type CompositePost = Composite<PostBreakpointTransformation>;
pub type IfDimensionPost = IfDimension<PostBreakpointTransformation>;
pub type IfOrientationPost = IfOrientation<PostBreakpointTransformation>;

node_enum! {
    /// A post-breakpoint pipeline step.
    PostBreakpointTransformation {
        BackgroundColor(BackgroundColor) = "BackgroundColor",
        Blur(Blur) = "Blur",
        ChromaKey(ChromaKey) = "ChromaKey",
        Composite(CompositePost) = "Composite",
        Compound(CompoundPost) = "Compound",
        Contrast(Contrast) = "Contrast",
        Goop(Goop) = "Goop",
        Grayscale(Grayscale) = "Grayscale",
        Hsl(Hsl) = "HSL",
        Hsv(Hsv) = "HSV",
        IfDimension(IfDimensionPost) = "IfDimension",
        IfOrientation(IfOrientationPost) = "IfOrientation",
        MaxColors(MaxColors) = "MaxColors",
        Mirror(Mirror) = "Mirror",
        MonoHue(MonoHue) = "MonoHue",
        Opacity(Opacity) = "Opacity",
        RemoveColor(RemoveColor) = "RemoveColor",
        UnsharpMask(UnsharpMask) = "UnsharpMask",
    }
}

static REGISTRY: Lazy<Registry<PostBreakpointTransformation>> = Lazy::new(PostBreakpointTransformation::build_registry);
static IMAGES: Lazy<ImageRegistry<PostBreakpointTransformation>> = Lazy::new(image::handlers);

impl TransformationNode for PostBreakpointTransformation {
    const FAMILY: Family = Family::PostBreakpoint;

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
            Self::Composite(node) => node.children(),
            Self::Compound(node) => node.transformations.iter().collect(),
            Self::IfDimension(node) => node.branches().map(|(_, child)| child).collect(),
            Self::IfOrientation(node) => node.branches().map(|(_, child)| child).collect(),
            _ => Vec::new(),
        }
    }
}

/// Tags accepted by the post-breakpoint registry, sorted.
pub fn post_breakpoint_tags() -> Vec<&'static str> {
    let mut tags: Vec<_> = REGISTRY.keys().copied().collect();
    tags.sort_unstable();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeCause, DecodeKind};
    use crate::image::ImageKind;
    use crate::validate::{BLANK, Validate};
    use crate::variable::VariableSlot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn registry_holds_eighteen_tags() {
        let tags = post_breakpoint_tags();
        assert_eq!(tags.len(), 18);
        assert!(tags.contains(&"HSV"));
        assert!(!tags.contains(&"Append"));
        assert!(!tags.contains(&"ImQuery"));
    }

    #[test]
    fn pre_only_steps_are_rejected() {
        for tag in ["Append", "Crop", "FitAndFill", "ImQuery", "Resize", "RegionOfInterestCrop"] {
            let err = PostBreakpointTransformation::decode(&json!({"transformation": tag})).unwrap_err();
            assert_eq!(err.kind(), &DecodeKind::PostBreakpointTransformation(None));
            assert_eq!(err.unknown_tag(), Some(tag));
        }
    }

    #[test]
    fn nested_pre_only_step_fails_the_list() {
        let raw = json!([
            {"transformation": "Opacity", "opacity": 0.8},
            {"transformation": "Compound", "transformations": [
                {"transformation": "Blur"},
                {"transformation": "Crop", "width": 1, "height": 1}
            ]}
        ]);
        let err = PostBreakpointTransformation::decode_list(&raw).unwrap_err();
        assert_eq!(err.kind(), &DecodeKind::PostBreakpointTransformationList);
        assert_eq!(err.path(), "[1].transformations[1]");
        assert!(matches!(err.innermost().cause, DecodeCause::UnknownTransformation(_)));
    }

    #[test]
    fn composite_post_uses_post_images() {
        let raw = json!({
            "transformation": "Composite",
            "placement": "Mask",
            "image": {"type": "Circle", "diameter": 100, "color": {"var": "maskColor"}}
        });
        let node = PostBreakpointTransformation::decode(&raw).unwrap();
        let PostBreakpointTransformation::Composite(composite) = &node else { panic!("expected composite") };
        assert_eq!(composite.image.as_ref().map(|image| image.kind()), Some(ImageKind::Circle));
        assert_eq!(serde_json::to_value(&node).unwrap(), raw);
    }

    #[test]
    fn if_dimension_post_round_trips() {
        let raw = json!({
            "transformation": "IfDimension",
            "dimension": "width",
            "value": {"var": "cutoff"},
            "lessThan": {"transformation": "MaxColors", "colors": 16},
            "default": {"transformation": "IfOrientation", "landscape": {"transformation": "Grayscale", "type": "Lightness"}}
        });
        let node = PostBreakpointTransformation::decode(&raw).unwrap();
        assert_eq!(node.depth(), 3);
        assert_eq!(node.node_count(), 4);
        assert_eq!(serde_json::to_value(&node).unwrap(), raw);
        let PostBreakpointTransformation::IfDimension(branch) = &node else { panic!("expected IfDimension") };
        assert_eq!(branch.value, Some(VariableSlot::reference("cutoff")));
    }

    #[test]
    fn shared_leaf_rules_apply() {
        let node = PostBreakpointTransformation::decode(&json!({"transformation": "RemoveColor", "tolerance": 0.1})).unwrap();
        assert_eq!(node.validate().unwrap_err().get("color"), Some(BLANK));
    }
}
