//! Media helpers: MIME lookup, intrinsic dimensions, data URLs.

use base64::{engine::general_purpose, Engine as _};
use deckparse_core::{Error, Result};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// MIME type for a media file name, by extension.
pub fn mime_type(file_name: &str) -> &'static str {
    match extension(file_name).as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

/// Lower-case image format name (`png`, `jpeg`, ...), `unknown` otherwise.
pub fn image_type(file_name: &str) -> String {
    match extension(file_name).as_str() {
        "" => "unknown".to_string(),
        "jpg" => "jpeg".to_string(),
        "tif" => "tiff".to_string(),
        ext => ext.to_string(),
    }
}

fn extension(file_name: &str) -> String {
    let name = file_name.rsplit('/').next().unwrap_or(file_name);
    match name.rfind('.') {
        Some(pos) => name[pos + 1..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// `data:` URL carrying `bytes` base64-encoded.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Width and height from a PNG header.
pub fn png_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.len() < 8 || bytes[..8] != PNG_SIGNATURE {
        return Err(Error::InvalidImage("missing PNG signature".to_string()));
    }
    if bytes.len() < 24 {
        return Err(Error::InvalidImage("truncated PNG header".to_string()));
    }
    Ok((read_u32_be(bytes, 16), read_u32_be(bytes, 20)))
}

/// Width and height from the first baseline or progressive SOF segment.
pub fn jpeg_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return Err(Error::InvalidImage("missing JPEG SOI marker".to_string()));
    }
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = bytes[pos + 1];
        match marker {
            // Fill bytes and standalone markers carry no length.
            0xFF => {
                pos += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => return Err(Error::SofNotFound),
            _ => {}
        }
        let length = read_u16_be(bytes, pos + 2) as usize;
        if marker == 0xC0 || marker == 0xC2 {
            // length(2) precision(1) height(2) width(2)
            if pos + 9 > bytes.len() {
                return Err(Error::InvalidImage("truncated JPEG SOF segment".to_string()));
            }
            let height = read_u16_be(bytes, pos + 5) as u32;
            let width = read_u16_be(bytes, pos + 7) as u32;
            return Ok((width, height));
        }
        if length < 2 {
            return Err(Error::InvalidImage("bad JPEG segment length".to_string()));
        }
        pos += 2 + length;
    }
    Err(Error::SofNotFound)
}

/// Width and height from a GIF logical screen descriptor.
pub fn gif_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.len() < 10 || (&bytes[..6] != b"GIF87a" && &bytes[..6] != b"GIF89a") {
        return Err(Error::InvalidImage("missing GIF signature".to_string()));
    }
    let width = u16::from_le_bytes([bytes[6], bytes[7]]) as u32;
    let height = u16::from_le_bytes([bytes[8], bytes[9]]) as u32;
    Ok((width, height))
}

/// Width and height from a BMP info header. Top-down bitmaps store a
/// negative height.
pub fn bmp_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    if bytes.len() < 26 || &bytes[..2] != b"BM" {
        return Err(Error::InvalidImage("missing BMP signature".to_string()));
    }
    let width = i32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]);
    let height = i32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]);
    Ok((width.unsigned_abs(), height.unsigned_abs()))
}

/// Intrinsic dimensions of an image, chosen by its format name.
///
/// Returns `Ok(None)` for formats whose headers are not read.
pub fn dimensions(image_type: &str, bytes: &[u8]) -> Result<Option<(u32, u32)>> {
    let dims = match image_type {
        "png" => png_dimensions(bytes)?,
        "jpeg" => jpeg_dimensions(bytes)?,
        "gif" => gif_dimensions(bytes)?,
        "bmp" => bmp_dimensions(bytes)?,
        _ => return Ok(None),
    };
    Ok(Some(dims))
}

fn read_u32_be(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u16_be(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_bytes;

    fn jpeg_bytes(marker: u8, width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        // APP0 segment to skip over.
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x06, b'J', b'F', b'I', b'F']);
        bytes.extend_from_slice(&[0xFF, marker, 0x00, 0x11, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[0x03; 10]);
        bytes
    }

    #[test]
    fn test_mime_table() {
        assert_eq!(mime_type("ppt/media/image1.PNG"), "image/png");
        assert_eq!(mime_type("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_type("photo.jpg"), "image/jpeg");
        assert_eq!(mime_type("logo.svg"), "image/svg+xml");
        assert_eq!(mime_type("old.wmf"), "image/x-wmf");
        assert_eq!(mime_type("clip.mp4"), "application/octet-stream");
        assert_eq!(mime_type("noext"), "application/octet-stream");
        assert_eq!(image_type("a/b.JPG"), "jpeg");
        assert_eq!(image_type("a/b"), "unknown");
    }

    #[test]
    fn test_png_dimensions() {
        assert_eq!(png_dimensions(&png_bytes(640, 480)).unwrap(), (640, 480));
        assert!(matches!(
            png_dimensions(b"not a png at all, really not"),
            Err(Error::InvalidImage(_))
        ));
        assert!(png_dimensions(&png_bytes(1, 1)[..20]).is_err());
    }

    #[test]
    fn test_jpeg_dimensions() {
        assert_eq!(jpeg_dimensions(&jpeg_bytes(0xC0, 800, 600)).unwrap(), (800, 600));
        assert_eq!(jpeg_dimensions(&jpeg_bytes(0xC2, 32, 16)).unwrap(), (32, 16));
    }

    #[test]
    fn test_jpeg_scan_before_frame_is_sof_not_found() {
        let bytes = [0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x08, 0, 0, 0, 0, 0, 0];
        assert!(matches!(jpeg_dimensions(&bytes), Err(Error::SofNotFound)));
        assert!(matches!(jpeg_dimensions(&[0xFF, 0xD8, 0x00, 0x00]), Err(Error::SofNotFound)));
        assert!(jpeg_dimensions(b"GIF89a").is_err());
    }

    #[test]
    fn test_gif_and_bmp_dimensions() {
        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&300u16.to_le_bytes());
        gif.extend_from_slice(&200u16.to_le_bytes());
        assert_eq!(gif_dimensions(&gif).unwrap(), (300, 200));

        let mut bmp = b"BM".to_vec();
        bmp.extend_from_slice(&[0; 16]);
        bmp.extend_from_slice(&50i32.to_le_bytes());
        bmp.extend_from_slice(&(-20i32).to_le_bytes());
        assert_eq!(bmp_dimensions(&bmp).unwrap(), (50, 20));
    }

    #[test]
    fn test_dimensions_dispatch() {
        assert_eq!(dimensions("png", &png_bytes(2, 3)).unwrap(), Some((2, 3)));
        assert_eq!(dimensions("emf", &[1, 2, 3]).unwrap(), None);
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }
}
