//! Lossless, deterministic PNG encoding of finished canvases.
//!
//! The encoder writes only IHDR, IDAT, and IEND: no time chunk, no text
//! chunks. Identical buffers always produce identical bytes. Naming and
//! timestamps belong to the persistence step.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

use spritemerge_common::error::{SpritemergeError, SpritemergeResult};
use spritemerge_sprite_model::PixelBuffer;

/// Encode an RGBA8 buffer as PNG.
pub fn encode_png(canvas: &PixelBuffer) -> SpritemergeResult<Vec<u8>> {
    if canvas.width() == 0 || canvas.height() == 0 {
        return Err(SpritemergeError::encoding(format!(
            "cannot encode a {}x{} image",
            canvas.width(),
            canvas.height()
        )));
    }

    let mut bytes = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut bytes, CompressionType::Default, FilterType::Adaptive);
    encoder
        .write_image(
            canvas.as_bytes(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| SpritemergeError::encoding(e.to_string()))?;

    tracing::debug!(
        width = canvas.width(),
        height = canvas.height(),
        bytes = bytes.len(),
        "Encoded PNG"
    );
    Ok(bytes)
}

/// Decode PNG bytes back into an RGBA8 buffer.
pub fn decode_png(bytes: &[u8]) -> SpritemergeResult<PixelBuffer> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| SpritemergeError::encoding(format!("invalid PNG: {e}")))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_raw(width, height, rgba.into_raw())
        .map_err(|e| SpritemergeError::encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spritemerge_sprite_model::Rgba;

    fn sample() -> PixelBuffer {
        let mut buf = PixelBuffer::new_transparent(5, 3);
        buf.put(0, 0, Rgba::new(255, 0, 0, 255));
        buf.put(4, 2, Rgba::new(0, 128, 255, 64));
        buf.put(2, 1, Rgba::new(12, 34, 56, 0));
        buf
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let a = encode_png(&sample()).unwrap();
        let b = encode_png(&sample()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_png_signature_and_no_time_chunk() {
        let bytes = encode_png(&sample()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert!(!bytes.windows(4).any(|w| w == b"tIME"));
    }

    #[test]
    fn test_lossless_including_transparent_color() {
        let bytes = encode_png(&sample()).unwrap();
        let decoded = decode_png(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let err = encode_png(&PixelBuffer::new_transparent(0, 4)).unwrap_err();
        assert!(matches!(err, SpritemergeError::EncodingFailure { .. }));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_png(b"not a png").is_err());
    }
}
