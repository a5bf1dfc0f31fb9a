//! Encoding rasters to bytes and back, via the `image` crate.
//!
//! Restore points and the host-facing "encoded bytes" both use PNG: lossless,
//! so a snapshot renders back byte-for-byte.

use super::raster::{Raster, RasterError};
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encode failed: {0}")]
    Encode(image::ImageError),
    #[error("Decode failed: {0}")]
    Decode(image::ImageError),
    #[error("Decoded image is not a valid raster: {0}")]
    Raster(#[from] RasterError),
}

fn to_rgba_image(raster: &Raster) -> RgbaImage {
    // Dimensions and buffer length are kept consistent by `Raster` itself.
    RgbaImage::from_raw(raster.width(), raster.height(), raster.as_bytes().to_vec())
        .unwrap_or_else(|| RgbaImage::new(raster.width(), raster.height()))
}

fn from_dynamic(img: DynamicImage) -> Result<Raster, CodecError> {
    let rgba = img.into_rgba8();
    let (w, h) = rgba.dimensions();
    Ok(Raster::from_rgba(w, h, rgba.into_raw())?)
}

/// Encode as PNG.
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    to_rgba_image(raster)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(CodecError::Encode)?;
    Ok(bytes)
}

/// Decode PNG bytes produced by [`encode_png`].
pub fn decode_png(bytes: &[u8]) -> Result<Raster, CodecError> {
    let img =
        image::load_from_memory_with_format(bytes, ImageFormat::Png).map_err(CodecError::Decode)?;
    from_dynamic(img)
}

/// Load any decodable image file as RGBA8.
pub fn open(path: &Path) -> Result<Raster, CodecError> {
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(CodecError::Decode)?;
    from_dynamic(img)
}

/// Save to disk, inferring the format from the extension.
///
/// Formats without an alpha channel (JPEG) get the raster flattened to RGB.
pub fn save(raster: &Raster, path: &Path) -> Result<(), CodecError> {
    let format = ImageFormat::from_path(path).map_err(CodecError::Encode)?;
    let img = DynamicImage::ImageRgba8(to_rgba_image(raster));
    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).save_with_format(path, format),
        _ => img.save_with_format(path, format),
    };
    result.map_err(CodecError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_preserves_pixels_exactly() {
        let r = Raster::from_fn(7, 5, |x, y| [x as u8 * 30, y as u8 * 40, 3, (x * y) as u8]);
        let bytes = encode_png(&r).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_png(&bytes).unwrap(), r);
    }

    #[test]
    fn decode_garbage_fails() {
        let err = decode_png(b"not a png at all").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn save_and_open_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let r = Raster::from_fn(4, 3, |x, _| [x as u8, 0, 0, 255]);
        save(&r, &path).unwrap();
        assert_eq!(open(&path).unwrap(), r);
    }

    #[test]
    fn save_jpeg_flattens_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.jpg");
        let r = Raster::from_fn(8, 8, |_, _| [120, 60, 30, 128]);
        save(&r, &path).unwrap();
        let back = open(&path).unwrap();
        assert_eq!(back.dimensions(), (8, 8));
        assert_eq!(back.pixel(0, 0).unwrap()[3], 255);
    }

    #[test]
    fn save_unknown_extension_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let r = Raster::new(2, 2);
        assert!(save(&r, &tmp.path().join("out.xyz")).is_err());
    }
}
