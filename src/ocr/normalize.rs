//! Photo decoding, downscaling and rotation ahead of OCR.

use image::{DynamicImage, ImageReader};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size of the preview surface, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// How the photo's dimensions are obtained before the scale factor is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsProbe {
    /// Bounds are requested but never read, so they stay 0x0 and the scale
    /// factor collapses to 0 (full-resolution decode).
    #[default]
    Unset,
    /// Read the real dimensions from the image header.
    Header,
}

/// Clockwise rotation applied after decoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Self::None),
            90 => Ok(Self::Quarter),
            180 => Ok(Self::Half),
            270 => Ok(Self::ThreeQuarter),
            other => Err(format!(
                "unsupported rotation {} (expected 0, 90, 180 or 270)",
                other
            )),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NormalizeOptions {
    pub bounds_probe: BoundsProbe,
    pub rotation: Rotation,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("preview surface has no area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Linear downscale factor: `min(photo_w / target_w, photo_h / target_h)`.
pub fn scale_factor(photo: (u32, u32), target: SurfaceSize) -> Result<u32, NormalizeError> {
    if target.width == 0 || target.height == 0 {
        return Err(NormalizeError::EmptySurface {
            width: target.width,
            height: target.height,
        });
    }
    Ok((photo.0 / target.width).min(photo.1 / target.height))
}

/// Decode sample size for a scale factor.
///
/// Values of 1 or less decode at full size; larger values round down to a
/// power of two.
pub fn sample_size(scale: u32) -> u32 {
    if scale <= 1 {
        1
    } else {
        1 << (u32::BITS - 1 - scale.leading_zeros())
    }
}

/// Decodes the photo at `path`, downsampled against `surface` and rotated.
pub fn normalize(
    path: &Path,
    surface: SurfaceSize,
    options: &NormalizeOptions,
) -> Result<DynamicImage, NormalizeError> {
    let decode_err = |source| NormalizeError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let bounds = match options.bounds_probe {
        BoundsProbe::Unset => (0, 0),
        BoundsProbe::Header => open_reader(path)
            .and_then(|r| r.into_dimensions())
            .map_err(decode_err)?,
    };

    let scale = scale_factor(bounds, surface)?;
    let sample = sample_size(scale);

    let img = open_reader(path)
        .and_then(|r| r.decode())
        .map_err(decode_err)?;
    log::debug!(
        "Decoded {} ({}x{}), scale={} sample={}",
        path.display(),
        img.width(),
        img.height(),
        scale,
        sample
    );

    let img = if sample > 1 {
        img.resize_exact(
            (img.width() / sample).max(1),
            (img.height() / sample).max(1),
            FilterType::Triangle,
        )
    } else {
        img
    };

    Ok(rotate(img, options.rotation))
}

/// Opens `path`, trusting the file contents over its extension.
fn open_reader(path: &Path) -> image::ImageResult<ImageReader<BufReader<File>>> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

pub fn rotate(img: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => img,
        Rotation::Quarter => img.rotate90(),
        Rotation::Half => img.rotate180(),
        Rotation::ThreeQuarter => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::tempdir;

    const SURFACE: SurfaceSize = SurfaceSize {
        width: 100,
        height: 50,
    };

    fn write_photo(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("photo.png");
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_scale_factor_unset_bounds_is_zero() {
        assert_eq!(scale_factor((0, 0), SURFACE).unwrap(), 0);
    }

    #[test]
    fn test_scale_factor_takes_smaller_ratio() {
        // 450/100 = 4, 300/50 = 6
        assert_eq!(scale_factor((450, 300), SURFACE).unwrap(), 4);
    }

    #[test]
    fn test_scale_factor_empty_surface() {
        let empty = SurfaceSize { width: 0, height: 50 };
        assert!(matches!(
            scale_factor((400, 400), empty),
            Err(NormalizeError::EmptySurface { .. })
        ));
    }

    #[test]
    fn test_sample_size() {
        assert_eq!(sample_size(0), 1);
        assert_eq!(sample_size(1), 1);
        assert_eq!(sample_size(2), 2);
        assert_eq!(sample_size(3), 2);
        assert_eq!(sample_size(4), 4);
        assert_eq!(sample_size(7), 4);
        assert_eq!(sample_size(9), 8);
    }

    #[test]
    fn test_unset_bounds_decodes_full_resolution() {
        let dir = tempdir().unwrap();
        let path = write_photo(dir.path(), 400, 200);

        let img = normalize(&path, SURFACE, &NormalizeOptions::default()).unwrap();
        assert_eq!((img.width(), img.height()), (400, 200));
    }

    #[test]
    fn test_header_bounds_downsamples() {
        let dir = tempdir().unwrap();
        let path = write_photo(dir.path(), 400, 200);
        let options = NormalizeOptions {
            bounds_probe: BoundsProbe::Header,
            rotation: Rotation::None,
        };

        // min(400/100, 200/50) = 4
        let img = normalize(&path, SURFACE, &options).unwrap();
        assert_eq!((img.width(), img.height()), (100, 50));
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let dir = tempdir().unwrap();
        let path = write_photo(dir.path(), 40, 20);
        let options = NormalizeOptions {
            bounds_probe: BoundsProbe::Unset,
            rotation: Rotation::Quarter,
        };

        let img = normalize(&path, SURFACE, &options).unwrap();
        assert_eq!((img.width(), img.height()), (20, 40));
    }

    #[test]
    fn test_empty_file_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("JPEG_empty.jpg");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(
            normalize(&path, SURFACE, &NormalizeOptions::default()),
            Err(NormalizeError::Decode { .. })
        ));
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::try_from(270).unwrap(), Rotation::ThreeQuarter);
        assert!(Rotation::try_from(45).is_err());
        assert_eq!(u16::from(Rotation::Half), 180);
    }
}
