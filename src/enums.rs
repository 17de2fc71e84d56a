//! Closed string enumerations used on the wire.
//!
//! Decoding is lenient: a string outside the known set lands in `Other` so a
//! document always decodes, and validation reports the bad value later.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            /// Every accepted wire value, in declaration order.
            pub const KNOWN: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(raw) => raw,
                }
            }

            pub fn from_wire(raw: &str) -> Self {
                match raw {
                    $($wire => Self::$variant,)+
                    other => Self::Other(other.to_owned()),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::from_wire(&raw))
            }
        }
    };
}

wire_enum! {
    /// Anchor point for crops and composites.
    Gravity {
        North => "North",
        NorthEast => "NorthEast",
        NorthWest => "NorthWest",
        South => "South",
        SouthEast => "SouthEast",
        SouthWest => "SouthWest",
        Center => "Center",
        East => "East",
        West => "West",
    }
}

wire_enum! {
    GravityPriority {
        Horizontal => "horizontal",
        Vertical => "vertical",
    }
}

wire_enum! {
    Placement {
        Over => "Over",
        Under => "Under",
        Mask => "Mask",
        Stencil => "Stencil",
    }
}

wire_enum! {
    ScaleDimension {
        Width => "width",
        Height => "height",
    }
}

wire_enum! {
    Dimension {
        Width => "width",
        Height => "height",
        Both => "both",
    }
}

wire_enum! {
    FaceCropAlgorithm {
        Cascade => "cascade",
        Dnn => "dnn",
    }
}

wire_enum! {
    FaceCropFocus {
        AllFaces => "allFaces",
        BiggestFace => "biggestFace",
    }
}

wire_enum! {
    /// How FaceCrop, FeatureCrop and RegionOfInterestCrop fit the region.
    CropStyle {
        Crop => "crop",
        Fill => "fill",
        Zoom => "zoom",
    }
}

wire_enum! {
    GrayscaleType {
        Rec601 => "Rec601",
        Rec709 => "Rec709",
        Brightness => "Brightness",
        Lightness => "Lightness",
    }
}

wire_enum! {
    ResizeAspect {
        Fit => "fit",
        Fill => "fill",
        Ignore => "ignore",
    }
}

wire_enum! {
    ResizeType {
        Normal => "normal",
        Upsize => "upsize",
        Downsize => "downsize",
    }
}

wire_enum! {
    /// Also used for `videoAdaptiveQuality`.
    PerceptualQuality {
        High => "high",
        MediumHigh => "mediumHigh",
        Medium => "medium",
        MediumLow => "mediumLow",
        Low => "low",
    }
}

wire_enum! {
    ImageFormat {
        Gif => "gif",
        Jpeg => "jpeg",
        Png => "png",
        Webp => "webp",
        Jpegxr => "jpegxr",
        Jpeg2000 => "jpeg2000",
    }
}

wire_enum! {
    VariableType {
        Bool => "bool",
        Number => "number",
        Url => "url",
        Color => "color",
        Gravity => "gravity",
        Placement => "placement",
        ScaleDimension => "scaleDimension",
        GrayscaleType => "grayscaleType",
        Aspect => "aspect",
        ResizeType => "resizeType",
        Dimension => "dimension",
        PerceptualQuality => "perceptualQuality",
        String => "string",
        Focus => "focus",
    }
}

wire_enum! {
    /// Every `transformation` tag across both families.
    TransformationKind {
        Append => "Append",
        AspectCrop => "AspectCrop",
        BackgroundColor => "BackgroundColor",
        Blur => "Blur",
        ChromaKey => "ChromaKey",
        Composite => "Composite",
        Compound => "Compound",
        Contrast => "Contrast",
        Crop => "Crop",
        FaceCrop => "FaceCrop",
        FeatureCrop => "FeatureCrop",
        FitAndFill => "FitAndFill",
        Goop => "Goop",
        Grayscale => "Grayscale",
        Hsl => "HSL",
        Hsv => "HSV",
        IfDimension => "IfDimension",
        IfOrientation => "IfOrientation",
        ImQuery => "ImQuery",
        MaxColors => "MaxColors",
        Mirror => "Mirror",
        MonoHue => "MonoHue",
        Opacity => "Opacity",
        RegionOfInterestCrop => "RegionOfInterestCrop",
        RelativeCrop => "RelativeCrop",
        RemoveColor => "RemoveColor",
        Resize => "Resize",
        Rotate => "Rotate",
        Scale => "Scale",
        Shear => "Shear",
        Trim => "Trim",
        UnsharpMask => "UnsharpMask",
    }
}

impl TransformationKind {
    /// Whether an `ImQuery` may list this tag in `allowedTransformations`.
    pub fn is_query_allowed(&self) -> bool {
        self.is_known() && !matches!(self, Self::Compound | Self::ImQuery)
    }
}

impl Default for VariableType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_values_survive_decode() {
        let g: Gravity = serde_json::from_value(json!("Middle")).unwrap();
        assert_eq!(g, Gravity::Other("Middle".into()));
        assert!(!g.is_known());
        assert_eq!(serde_json::to_value(&g).unwrap(), json!("Middle"));
    }

    #[test]
    fn wire_names_are_case_sensitive() {
        assert_eq!(TransformationKind::from_wire("HSL"), TransformationKind::Hsl);
        assert!(!TransformationKind::from_wire("hsl").is_known());
        assert_eq!(PerceptualQuality::from_wire("mediumHigh"), PerceptualQuality::MediumHigh);
    }

    #[test]
    fn query_allowed_excludes_containers() {
        let allowed = TransformationKind::KNOWN
            .iter()
            .map(|tag| TransformationKind::from_wire(tag))
            .filter(TransformationKind::is_query_allowed)
            .count();
        assert_eq!(TransformationKind::KNOWN.len(), 32);
        assert_eq!(allowed, 30);
        assert_eq!(VariableType::KNOWN.len(), 14);
    }
}
