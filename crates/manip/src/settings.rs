//! Manip settings, as declared in configuration.

use crate::ImageFormat;
use crate::error::{ErrorKind, Result};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Name under which exposed source images are linked into the content tree.
/// No manip may use it.
pub const ORIGINAL: &str = "original";

/// Largest width or height, in pixels, that scaling will produce.
pub const MAX_DIMENSION: u32 = 16_384;
/// Largest factor a relative scale may apply.
pub const MAX_SCALE_FACTOR: f64 = 16.0;

/// How scale values are interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleStrategy {
    /// Values are target sizes in pixels.
    #[default]
    Absolute,
    /// Values are factors applied to the current size.
    Relative,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleConfig {
    pub horizontal: Option<f64>,
    pub vertical: Option<f64>,
    pub strategy: ScaleStrategy,
}
impl ScaleConfig {
    pub fn is_configured(&self) -> bool {
        self.horizontal.is_some() || self.vertical.is_some()
    }

    fn validate(&self) -> Result<()> {
        for value in [self.horizontal, self.vertical].into_iter().flatten() {
            if !value.is_finite() || value <= 0.0 {
                exn::bail!(ErrorKind::InvalidSettings(format!("scale value {value} must be positive")));
            }
            if self.strategy == ScaleStrategy::Absolute && value.fract() != 0.0 {
                exn::bail!(ErrorKind::InvalidSettings(format!(
                    "absolute scale value {value} must be a whole number of pixels"
                )));
            }
            let limit = match self.strategy {
                ScaleStrategy::Absolute => f64::from(MAX_DIMENSION),
                ScaleStrategy::Relative => MAX_SCALE_FACTOR,
            };
            if value > limit {
                exn::bail!(ErrorKind::InvalidSettings(format!("scale value {value} exceeds the limit of {limit}")));
            }
        }
        Ok(())
    }
}

/// Where the crop window sits relative to the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropAnchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Alignment of a crop window along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Align {
    Start,
    Middle,
    End,
}

impl CropAnchor {
    /// Horizontal and vertical alignment of the anchor.
    pub(crate) fn alignment(&self) -> (Align, Align) {
        use Align::*;
        match self {
            Self::TopLeft => (Start, Start),
            Self::TopCenter => (Middle, Start),
            Self::TopRight => (End, Start),
            Self::CenterLeft => (Start, Middle),
            Self::Center => (Middle, Middle),
            Self::CenterRight => (End, Middle),
            Self::BottomLeft => (Start, End),
            Self::BottomCenter => (Middle, End),
            Self::BottomRight => (End, End),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    pub horizontal: Option<u32>,
    pub vertical: Option<u32>,
    pub anchor: CropAnchor,
}
impl CropConfig {
    pub fn is_configured(&self) -> bool {
        self.horizontal.is_some() || self.vertical.is_some()
    }

    fn validate(&self) -> Result<()> {
        if self.horizontal == Some(0) || self.vertical == Some(0) {
            exn::bail!(ErrorKind::InvalidSettings("crop values must be positive".to_string()));
        }
        Ok(())
    }
}

fn default_formats() -> BTreeSet<ImageFormat> {
    BTreeSet::from([ImageFormat::Jpeg, ImageFormat::Png])
}

/// A named image transformation and the formats it may be requested in.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manip {
    /// Name used in requests and in generated file names. Usually filled in
    /// from the configuration key.
    pub name: String,
    pub scale: ScaleConfig,
    pub crop: CropConfig,
    pub formats: BTreeSet<ImageFormat>,
    pub black_and_white: bool,
}
impl Default for Manip {
    fn default() -> Self {
        Self {
            name: String::new(),
            scale: ScaleConfig::default(),
            crop: CropConfig::default(),
            formats: default_formats(),
            black_and_white: false,
        }
    }
}
impl Manip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn allows(&self, format: ImageFormat) -> bool {
        self.formats.contains(&format)
    }

    /// Check that the settings describe a transformation that can be run.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            exn::bail!(ErrorKind::InvalidSettings("manip name must not be empty".to_string()));
        }
        if self.name == ORIGINAL {
            exn::bail!(ErrorKind::InvalidSettings(format!("manip name `{ORIGINAL}` is reserved")));
        }
        if self.name.contains(['/', '\\', '.']) {
            exn::bail!(ErrorKind::InvalidSettings(format!(
                "manip name `{}` must not contain path separators or dots",
                self.name
            )));
        }
        if self.formats.is_empty() {
            exn::bail!(ErrorKind::InvalidSettings(format!(
                "manip `{}` must allow at least one format",
                self.name
            )));
        }
        self.scale.validate()?;
        self.crop.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let manip = Manip::new("thumb");
        assert_eq!(manip.scale.strategy, ScaleStrategy::Absolute);
        assert_eq!(manip.crop.anchor, CropAnchor::Center);
        assert!(manip.allows(ImageFormat::Jpeg));
        assert!(manip.allows(ImageFormat::Png));
        assert!(!manip.allows(ImageFormat::Gif));
        assert!(!manip.scale.is_configured());
        assert!(!manip.crop.is_configured());
        assert!(manip.validate().is_ok());
    }

    #[rstest]
    #[case(CropAnchor::TopLeft, (Align::Start, Align::Start))]
    #[case(CropAnchor::TopRight, (Align::End, Align::Start))]
    #[case(CropAnchor::CenterLeft, (Align::Start, Align::Middle))]
    #[case(CropAnchor::BottomCenter, (Align::Middle, Align::End))]
    fn test_anchor_alignment(#[case] anchor: CropAnchor, #[case] expected: (Align, Align)) {
        assert_eq!(anchor.alignment(), expected);
    }

    #[rstest]
    #[case::empty_name("", |_: &mut Manip| {})]
    #[case::reserved_name("original", |_: &mut Manip| {})]
    #[case::separator("a/b", |_: &mut Manip| {})]
    #[case::no_formats("thumb", |m: &mut Manip| m.formats.clear())]
    #[case::negative_scale("thumb", |m: &mut Manip| m.scale.horizontal = Some(-1.0))]
    #[case::fractional_pixels("thumb", |m: &mut Manip| m.scale.vertical = Some(10.5))]
    #[case::huge_absolute_scale("thumb", |m: &mut Manip| m.scale.horizontal = Some(1e12))]
    #[case::just_over_max_dimension("thumb", |m: &mut Manip| m.scale.vertical = Some(16_385.0))]
    #[case::huge_relative_scale("thumb", |m: &mut Manip| {
        m.scale.strategy = ScaleStrategy::Relative;
        m.scale.horizontal = Some(100.0);
    })]
    #[case::zero_crop("thumb", |m: &mut Manip| m.crop.horizontal = Some(0))]
    fn test_invalid(#[case] name: &str, #[case] modify: fn(&mut Manip)) {
        let mut manip = Manip::new(name);
        modify(&mut manip);
        let err = manip.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidSettings(_)));
    }

    #[test]
    fn test_max_dimension_is_allowed() {
        let mut manip = Manip::new("poster");
        manip.scale.horizontal = Some(f64::from(MAX_DIMENSION));
        assert!(manip.validate().is_ok());
    }

    #[test]
    fn test_relative_scale_allows_fractions() {
        let mut manip = Manip::new("half");
        manip.scale = ScaleConfig {
            horizontal: Some(0.5),
            vertical: None,
            strategy: ScaleStrategy::Relative,
        };
        assert!(manip.validate().is_ok());
    }
}
