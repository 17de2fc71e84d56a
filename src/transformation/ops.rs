//! Leaf payloads: steps with no nested nodes. Shared by both families.
use crate::enums::{CropStyle, FaceCropAlgorithm, FaceCropFocus, Gravity, GrayscaleType, ResizeAspect, ResizeType};
use crate::error::DecodeError;
use crate::fields::Fields;
use crate::transformation::Payload;
use crate::validate::{Validate, ValidationErrors, Validator};
use crate::variable::VariableSlot;

macro_rules! check_field {
    ($v:ident, $wire:tt, $value:expr, required) => {
        $v.required($wire, $value)
    };
    ($v:ident, $wire:tt, $value:expr, max $max:expr) => {
        $v.optional($wire, $value)
            .range($wire, $value.as_ref().and_then(|slot| slot.literal()).copied(), None, Some($max))
    };
    ($v:ident, $wire:tt, $value:expr) => {
        $v.optional($wire, $value)
    };
}

/// Declares leaf payloads: every field is an optional [`VariableSlot`],
/// listed with its wire name and an optional rule.
macro_rules! leaf_payload {
    ($(
        $(#[$meta:meta])*
        $name:ident {
            $($field:ident: $ty:ty = $wire:tt $([$($rule:tt)+])?,)*
        }
    )+) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
        pub struct $name {
            $(
                #[serde(rename = $wire, skip_serializing_if = "Option::is_none")]
                pub $field: Option<VariableSlot<$ty>>,
            )*
        }

        impl Payload for $name {
            fn decode(fields: &Fields<'_>) -> Result<Self, DecodeError> {
                Ok(Self {
                    $($field: fields.slot($wire)?,)*
                })
            }
        }

        impl Validate for $name {
            fn validate(&self) -> Result<(), ValidationErrors> {
                let mut v = Validator::new();
                $(check_field!(v, $wire, &self.$field $(, $($rule)+)?);)*
                v.finish()
            }
        }
    )+};
}

leaf_payload! {
    /// Crops to a target aspect ratio.
    AspectCrop {
        allow_expansion: bool = "allowExpansion",
        height: f64 = "height",
        width: f64 = "width",
        x_position: f64 = "xPosition",
        y_position: f64 = "yPosition",
    }

    BackgroundColor {
        color: String = "color" [required],
    }

    Blur {
        sigma: f64 = "sigma",
    }

    ChromaKey {
        hue: f64 = "hue",
        hue_feather: f64 = "hueFeather",
        hue_tolerance: f64 = "hueTolerance",
        lightness_feather: f64 = "lightnessFeather",
        lightness_tolerance: f64 = "lightnessTolerance",
        saturation_feather: f64 = "saturationFeather",
        saturation_tolerance: f64 = "saturationTolerance",
    }

    Contrast {
        brightness: f64 = "brightness",
        contrast: f64 = "contrast",
    }

    Crop {
        allow_expansion: bool = "allowExpansion",
        gravity: Gravity = "gravity",
        height: i64 = "height" [required],
        width: i64 = "width" [required],
        x_position: i64 = "xPosition",
        y_position: i64 = "yPosition",
    }

    /// Crops around detected faces.
    FaceCrop {
        algorithm: FaceCropAlgorithm = "algorithm",
        confidence: f64 = "confidence",
        fail_gravity: Gravity = "failGravity",
        focus: FaceCropFocus = "focus",
        gravity: Gravity = "gravity",
        height: i64 = "height" [required],
        padding: f64 = "padding",
        style: CropStyle = "style",
        width: i64 = "width" [required],
    }

    /// Crops around the most prominent features.
    FeatureCrop {
        fail_gravity: Gravity = "failGravity",
        feature_radius: f64 = "featureRadius",
        gravity: Gravity = "gravity",
        height: i64 = "height" [required],
        max_features: i64 = "maxFeatures",
        min_feature_quality: f64 = "minFeatureQuality",
        padding: f64 = "padding",
        style: CropStyle = "style",
        width: i64 = "width" [required],
    }

    Goop {
        chaos: f64 = "chaos",
        density: i64 = "density",
        power: f64 = "power",
        seed: i64 = "seed",
    }

    Grayscale {
        grayscale_type: GrayscaleType = "type",
    }

    Hsl {
        hue: f64 = "hue",
        lightness: f64 = "lightness",
        saturation: f64 = "saturation",
    }

    Hsv {
        hue: f64 = "hue",
        saturation: f64 = "saturation",
        value: f64 = "value",
    }

    MaxColors {
        colors: i64 = "colors" [required],
    }

    Mirror {
        horizontal: bool = "horizontal",
        vertical: bool = "vertical",
    }

    MonoHue {
        hue: f64 = "hue",
    }

    Opacity {
        opacity: f64 = "opacity" [required],
    }

    /// Shrinks or grows each edge by a pixel count.
    RelativeCrop {
        east: i64 = "east",
        north: i64 = "north",
        south: i64 = "south",
        west: i64 = "west",
    }

    RemoveColor {
        color: String = "color" [required],
        feather: f64 = "feather",
        tolerance: f64 = "tolerance",
    }

    Resize {
        aspect: ResizeAspect = "aspect",
        height: i64 = "height",
        resize_type: ResizeType = "type",
        width: i64 = "width",
    }

    Rotate {
        degrees: f64 = "degrees" [required],
    }

    Scale {
        height: f64 = "height" [required],
        width: f64 = "width" [required],
    }

    Shear {
        x_shear: f64 = "xShear",
        y_shear: f64 = "yShear",
    }

    Trim {
        fuzz: f64 = "fuzz" [max 1.0],
        padding: i64 = "padding",
    }

    UnsharpMask {
        gain: f64 = "gain",
        sigma: f64 = "sigma",
        threshold: f64 = "threshold",
    }
}
