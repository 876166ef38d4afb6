//! Decoded image handles.
//!
//! - `DecodedImage`: owned RGB8 bitmap supplied by the caller. Bytes are private.
//! - `ImageView`: borrowed, read-only view handed to prediction backends.
//!
//! Decoding is the caller's job. `DecodedImage::open` and `from_dynamic` exist
//! for collaborators (the CLI, tests) that start from an encoded file or an
//! `image` crate value.

use std::path::Path;

use crate::error::ClassifyError;

/// Bytes per RGB8 pixel.
pub const RGB_CHANNELS: usize = 3;

/// Owned RGB8 bitmap.
///
/// No `Clone`: the categorizer borrows the image for a single call and keeps
/// nothing once it returns.
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    /// Wrap interleaved RGB8 bytes.
    ///
    /// The handle is not checked here; a broken handle is rejected by
    /// `validate` (and therefore by the categorizer) instead.
    pub fn from_rgb8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert any decoded `image` value to RGB8.
    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::from_rgb8(width, height, rgb.into_raw())
    }

    /// Decode an image file (JPEG or PNG).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ClassifyError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|e| {
            ClassifyError::InvalidImage(format!("failed to decode {}: {}", path.display(), e))
        })?;
        Ok(Self::from_dynamic(&decoded))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Structural check: non-zero dimensions and a pixel buffer that matches them.
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.width == 0 || self.height == 0 {
            return Err(ClassifyError::InvalidImage(format!(
                "zero-sized image ({}x{})",
                self.width, self.height
            )));
        }

        let expected_len = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(RGB_CHANNELS))
            .ok_or_else(|| ClassifyError::InvalidImage("image dimensions overflow".to_string()))?;

        if self.pixels.len() != expected_len {
            return Err(ClassifyError::InvalidImage(format!(
                "expected {} RGB bytes for {}x{}, found {}",
                expected_len,
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Read-only view for backends.
    pub fn view(&self) -> ImageView<'_> {
        ImageView { image: self }
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("byte_len", &self.pixels.len())
            .finish()
    }
}

/// Borrowed view of a `DecodedImage`.
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    image: &'a DecodedImage,
}

impl<'a> ImageView<'a> {
    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }

    /// Interleaved RGB8 bytes, row-major.
    pub fn pixels(&self) -> &'a [u8] {
        &self.image.pixels
    }

    /// Copy into an `image` buffer for resizing. `None` when the view does not
    /// describe a well-formed RGB8 buffer.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width(), self.height(), self.pixels().to_vec())
    }
}

impl std::fmt::Debug for ImageView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageView")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
