//! Image manipulation for kodak.
//!
//! A [`Manip`] is a named transformation declared in configuration: an
//! optional scale, an optional crop and an optional conversion to black and
//! white, plus the set of [`ImageFormat`]s it may be requested in. The
//! pipeline always runs the steps in that order and skips any step that
//! isn't configured.
//!
//! ```
//! use kodak_manip::{ImageFormat, Manip, ScaleConfig};
//!
//! let mut thumb = Manip::new("thumb");
//! thumb.scale = ScaleConfig { horizontal: Some(100.0), ..Default::default() };
//! thumb.validate().unwrap();
//!
//! let image = image::DynamicImage::new_rgb8(400, 300);
//! let output = kodak_manip::apply(image, &thumb);
//! assert_eq!((output.width(), output.height()), (100, 75));
//! let bytes = kodak_manip::encode(&output, ImageFormat::Jpeg).unwrap();
//! assert!(!bytes.is_empty());
//! ```

pub mod error;
mod format;
mod ops;
mod settings;

pub use crate::format::{ImageFormat, is_supported_extension};
pub use crate::ops::{apply, black_and_white, crop, decode, encode, scale};
pub use crate::settings::{CropAnchor, CropConfig, MAX_DIMENSION, MAX_SCALE_FACTOR, Manip, ORIGINAL, ScaleConfig, ScaleStrategy};
