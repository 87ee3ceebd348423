//! Raw 32-bpp image ingestion.
//!
//! The format carries an 18-byte header (width and height as little-endian
//! u16 at offsets 12 and 14, bits-per-pixel at 16) followed by bottom-up
//! BGRA pixel rows. Decoding validates 32 bpp, reverses the rows to
//! top-down order, and swaps BGRA to RGBA before the pixels reach the
//! device layer. Anything else is a hard load failure.

use std::path::Path;

use prism_device::{Device, DeviceError, TextureId};
use tracing::info;

use crate::LoadError;

const HEADER_LEN: usize = 18;

/// Decoded image: RGBA, top-down rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn upload(&self, device: &mut dyn Device) -> Result<TextureId, DeviceError> {
        device.create_texture(self.width, self.height, &self.pixels)
    }
}

/// Decode a raw image from its full byte contents.
pub fn decode_raw_image(bytes: &[u8]) -> Result<ImageData, LoadError> {
    if bytes.len() < HEADER_LEN {
        return Err(LoadError::Truncated {
            got: bytes.len(),
            expected: HEADER_LEN,
        });
    }

    let width = u16::from_le_bytes([bytes[12], bytes[13]]) as usize;
    let height = u16::from_le_bytes([bytes[14], bytes[15]]) as usize;
    let bpp = bytes[16];
    if bpp != 32 {
        return Err(LoadError::NotTrueColor { bpp });
    }

    let image_size = width * height * 4;
    let expected = HEADER_LEN + image_size;
    if bytes.len() < expected {
        return Err(LoadError::Truncated {
            got: bytes.len(),
            expected,
        });
    }
    let source = &bytes[HEADER_LEN..expected];

    // Walk the source from its last row forward while filling the output
    // top-down, swapping blue and red in each pixel.
    let mut pixels = vec![0u8; image_size];
    let mut write = 0;
    if width > 0 && height > 0 {
        let mut read = image_size - width * 4;
        for _ in 0..height {
            for _ in 0..width {
                pixels[write] = source[read + 2];
                pixels[write + 1] = source[read + 1];
                pixels[write + 2] = source[read];
                pixels[write + 3] = source[read + 3];
                read += 4;
                write += 4;
            }
            read = read.saturating_sub(width * 8);
        }
    }

    Ok(ImageData {
        width: width as u32,
        height: height as u32,
        pixels,
    })
}

/// Load and decode a raw image from disk.
pub fn load_image(path: impl AsRef<Path>) -> Result<ImageData, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let image = decode_raw_image(&bytes)?;
    info!(
        path = %path.display(),
        width = image.width,
        height = image.height,
        "loaded image"
    );
    Ok(image)
}
