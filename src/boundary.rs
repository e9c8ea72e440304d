//! Embedding boundary helpers.
//!
//! Every value returned across the host boundary is a freshly allocated
//! buffer framed with a 4-byte little-endian length header; hosts must read
//! the header before copying the payload. Inputs arrive unframed (the host
//! already knows their lengths), with formats and `k` passed as plain
//! integers, so each wrapper here validates the format code and frames its
//! result.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::Error;
use crate::PixelFormat;

/// Frame a payload with its 4-byte little-endian length.
pub fn pack(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// Read a framed buffer back, validating the header against what follows.
pub fn unpack(buffer: &[u8]) -> Result<&[u8], Error> {
    if buffer.len() < 4 {
        return Err(Error::MissingLengthHeader);
    }
    let mut header = [0u8; 4];
    header.copy_from_slice(&buffer[..4]);
    let declared = u32::from_le_bytes(header) as usize;
    buffer.get(4..4 + declared).ok_or(Error::TruncatedBuffer {
        declared,
        available: buffer.len() - 4,
    })
}

pub fn get_clustering(pixels: &[u8], format_code: u32) -> Result<Vec<u8>, Error> {
    let format = PixelFormat::from_code(format_code)?;
    Ok(pack(&crate::get_clustering(pixels, format)))
}

pub fn get_palette(pixels: &[u8], format_code: u32, k: u32) -> Result<Vec<u8>, Error> {
    let format = PixelFormat::from_code(format_code)?;
    Ok(pack(&crate::get_palette(pixels, format, k)))
}

pub fn get_palette_from_clustering(clustering: &[u8], k: u32) -> Result<Vec<u8>, Error> {
    Ok(pack(&crate::get_palette_from_clustering(clustering, k)))
}

pub fn quantize(pixels: &[u8], format_code: u32, k: u32) -> Result<Vec<u8>, Error> {
    let format = PixelFormat::from_code(format_code)?;
    Ok(pack(&crate::quantize(pixels, format, k)))
}

pub fn quantize_with_clustering(
    pixels: &[u8],
    format_code: u32,
    clustering: &[u8],
    k: u32,
) -> Result<Vec<u8>, Error> {
    let format = PixelFormat::from_code(format_code)?;
    Ok(pack(&crate::quantize_with_clustering(
        pixels, format, clustering, k,
    )))
}

pub fn quantize_with_palette(
    pixels: &[u8],
    format_code: u32,
    palette: &[u8],
) -> Result<Vec<u8>, Error> {
    let format = PixelFormat::from_code(format_code)?;
    Ok(pack(&crate::quantize_with_palette(pixels, format, palette)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_prepends_le_length() {
        let framed = pack(&[7, 8, 9]);
        assert_eq!(framed, [3, 0, 0, 0, 7, 8, 9]);
    }

    #[test]
    fn pack_empty_payload() {
        assert_eq!(pack(&[]), [0, 0, 0, 0]);
    }

    #[test]
    fn unpack_roundtrip() {
        let payload = [1u8, 2, 3, 4, 5];
        assert_eq!(unpack(&pack(&payload)).expect("valid"), payload);
    }

    #[test]
    fn unpack_ignores_trailing_bytes() {
        let mut framed = pack(&[1, 2]);
        framed.push(99);
        assert_eq!(unpack(&framed).expect("valid"), [1, 2]);
    }

    #[test]
    fn unpack_missing_header() {
        assert_eq!(unpack(&[1, 2, 3]), Err(Error::MissingLengthHeader));
    }

    #[test]
    fn unpack_truncated_payload() {
        let framed = [10, 0, 0, 0, 1, 2];
        assert_eq!(
            unpack(&framed),
            Err(Error::TruncatedBuffer {
                declared: 10,
                available: 2
            })
        );
    }

    #[test]
    fn unknown_format_code_is_rejected() {
        assert_eq!(
            get_clustering(&[0, 0, 0], 7),
            Err(Error::UnknownPixelFormat(7))
        );
    }

    #[test]
    fn framed_clustering_roundtrips() {
        let pixels = [0u8, 0, 0, 255, 255, 255];
        let framed = get_clustering(&pixels, 1).expect("valid format");
        let payload = unpack(&framed).expect("well framed");
        assert_eq!(payload, crate::get_clustering(&pixels, PixelFormat::Rgb));
    }
}
