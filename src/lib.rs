//! Hierarchical agglomerative color clustering for palette reduction.
//!
//! The pipeline discovers the distinct colors of an image, builds the full
//! average-linkage merge tree over them in a widened RGB space, and encodes
//! that tree as a compact dendrogram buffer. A palette of *any* size `k` can
//! then be extracted from the buffer without re-clustering, and pixels are
//! remapped to a palette through a k-d tree nearest-color index.
//!
//! Everything runs single-threaded and in memory, and identical inputs
//! always produce identical buffers.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod boundary;
pub mod cluster;
pub mod color;
pub mod dendrogram;
pub mod error;
pub mod grid;
pub mod histogram;
pub mod kdtree;

pub use cluster::DEFAULT_RESOLUTION;
pub use error::Error;

use alloc::vec::Vec;
use rgb::RGB;

/// Layout of the raw pixel buffer. Codes match the embedding contract:
/// 1 is 3 bytes per pixel, 0 is 4 bytes per pixel with a trailing alpha
/// byte that quantization passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba = 0,
    Rgb = 1,
}

impl PixelFormat {
    pub fn from_code(code: u32) -> Result<Self, Error> {
        match code {
            0 => Ok(Self::Rgba),
            1 => Ok(Self::Rgb),
            other => Err(Error::UnknownPixelFormat(other)),
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Cluster an image's distinct colors down to one, returning the encoded
/// dendrogram. See [`dendrogram`] for the buffer layout.
pub fn get_clustering(pixels: &[u8], format: PixelFormat) -> Vec<u8> {
    cluster::build_clustering(iter_pixels(pixels, format), DEFAULT_RESOLUTION)
}

/// Cluster and immediately extract a `k`-color palette, flat 3 bytes per
/// color, sorted lexicographically.
pub fn get_palette(pixels: &[u8], format: PixelFormat, k: u32) -> Vec<u8> {
    flatten(dendrogram::extract_palette(
        &get_clustering(pixels, format),
        k,
    ))
}

/// Extract a `k`-color palette from a previously computed dendrogram.
/// Malformed buffers and `k == 0` yield an empty palette.
pub fn get_palette_from_clustering(clustering: &[u8], k: u32) -> Vec<u8> {
    flatten(dendrogram::extract_palette(clustering, k))
}

/// Cluster, extract a `k`-color palette, and remap every pixel to its
/// nearest palette color. Output has the same format as the input.
pub fn quantize(pixels: &[u8], format: PixelFormat, k: u32) -> Vec<u8> {
    let palette = dendrogram::extract_palette(&get_clustering(pixels, format), k);
    quantize_to(pixels, format, &palette)
}

/// Remap pixels against a palette extracted from an existing dendrogram.
pub fn quantize_with_clustering(
    pixels: &[u8],
    format: PixelFormat,
    clustering: &[u8],
    k: u32,
) -> Vec<u8> {
    let palette = dendrogram::extract_palette(clustering, k);
    quantize_to(pixels, format, &palette)
}

/// Remap pixels against an explicit palette buffer (flat 3-byte colors).
pub fn quantize_with_palette(pixels: &[u8], format: PixelFormat, palette: &[u8]) -> Vec<u8> {
    let colors: Vec<RGB<u8>> = palette
        .chunks_exact(3)
        .map(|chunk| RGB {
            r: chunk[0],
            g: chunk[1],
            b: chunk[2],
        })
        .collect();
    quantize_to(pixels, format, &colors)
}

fn quantize_to(pixels: &[u8], format: PixelFormat, palette: &[RGB<u8>]) -> Vec<u8> {
    let bytes_per_pixel = format.bytes_per_pixel();
    let index = kdtree::NearestPalette::new(palette);
    let mut output = Vec::with_capacity(pixels.len());

    for chunk in pixels.chunks_exact(bytes_per_pixel) {
        let color = RGB {
            r: chunk[0],
            g: chunk[1],
            b: chunk[2],
        };
        // An empty palette makes quantization a no-op
        let nearest = index.nearest(color).unwrap_or(color);
        output.extend_from_slice(&[nearest.r, nearest.g, nearest.b]);
        if bytes_per_pixel == 4 {
            output.push(chunk[3]);
        }
    }
    output
}

/// Complete pixels only; a ragged tail shorter than one pixel is ignored.
fn iter_pixels(pixels: &[u8], format: PixelFormat) -> impl Iterator<Item = RGB<u8>> + '_ {
    pixels.chunks_exact(format.bytes_per_pixel()).map(|chunk| RGB {
        r: chunk[0],
        g: chunk[1],
        b: chunk[2],
    })
}

fn flatten(colors: Vec<RGB<u8>>) -> Vec<u8> {
    let mut out = Vec::with_capacity(colors.len() * 3);
    for color in colors {
        out.extend_from_slice(&[color.r, color.g, color.b]);
    }
    out
}
