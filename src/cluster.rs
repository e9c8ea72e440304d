extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use rgb::RGB;

use crate::color::WideRgb;
use crate::dendrogram::{HEADER_LEN, RECORD_LEN};
use crate::grid::CoarseningGrid;
use crate::histogram::ColorHistogram;

pub use crate::grid::DEFAULT_RESOLUTION;

/// Cluster a pixel stream down to a single color, emitting the full merge
/// tree as an encoded buffer.
///
/// For N distinct colors the buffer is exactly `3 + 9·(N−1)` bytes: the final
/// singleton color, then every merge record with the most recent merge first.
/// Chronological merge `j` therefore lands at offset `3 + 9·(N−2−j)`. A
/// stream with no pixels yields an empty buffer; a single distinct color
/// yields just the 3-byte header. A merge whose weighted average lands
/// exactly on another live color absorbs two entries at once and shortens
/// the buffer by one record.
///
/// `initial_resolution` is the spatial index's starting grid subdivision;
/// [`DEFAULT_RESOLUTION`] works well for photographic inputs.
// TODO: benchmark starting resolutions against sparse palettes (pixel art
// tends to coarsen several levels before the first merge).
pub fn build_clustering(
    pixels: impl Iterator<Item = RGB<u8>>,
    initial_resolution: u16,
) -> Vec<u8> {
    let mut histogram = ColorHistogram::new();
    let mut grid = CoarseningGrid::new(initial_resolution);

    for pixel in pixels {
        let color = WideRgb::widen(pixel);
        if histogram.record(color) {
            grid.add(color);
        }
    }

    if histogram.is_empty() {
        return Vec::new();
    }

    let distinct = histogram.len();
    let mut clustering = vec![0u8; HEADER_LEN + RECORD_LEN * (distinct - 1)];

    for rank in (0..distinct - 1).rev() {
        let Some((a, b)) = grid.nearest() else {
            // A merge landed exactly on another live color, absorbing two
            // entries at once, so fewer merges remain than the distinct
            // count predicted. Drop the records that were never written.
            clustering.drain(HEADER_LEN..HEADER_LEN + RECORD_LEN * (rank + 1));
            break;
        };
        let merged = histogram.merge(a, b);
        grid.remove(a);
        grid.remove(b);
        grid.add(merged);

        let offset = HEADER_LEN + RECORD_LEN * rank;
        write_color(&mut clustering[offset..offset + 3], merged);
        write_color(&mut clustering[offset + 3..offset + 6], a);
        write_color(&mut clustering[offset + 6..offset + 9], b);
    }

    write_color(&mut clustering[..HEADER_LEN], histogram.last());
    clustering
}

fn write_color(out: &mut [u8], color: WideRgb) {
    let narrowed = color.narrow();
    out[0] = narrowed.r;
    out[1] = narrowed.g;
    out[2] = narrowed.b;
}
