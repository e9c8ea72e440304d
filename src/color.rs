use rgb::RGB;

/// A color widened to 16 bits per channel.
///
/// All clustering happens in this expanded range so that repeated weighted
/// averaging does not accumulate rounding error the way 8-bit math would.
/// Equality is exact over all three channels; the derived `Ord` (lexicographic
/// r, g, b) is the total order used for tie-breaking throughout the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WideRgb {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl WideRgb {
    pub const fn new(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    /// Widen an 8-bit color: `v * 65535 / 255` per channel.
    ///
    /// Exact for every input (the scale factor is the integer 257), so 0 and
    /// 255 map to the range extremes and `narrow` round-trips losslessly.
    pub fn widen(color: RGB<u8>) -> Self {
        Self {
            r: widen_channel(color.r),
            g: widen_channel(color.g),
            b: widen_channel(color.b),
        }
    }

    /// Narrow back to 8 bits per channel with round-half-up.
    pub fn narrow(self) -> RGB<u8> {
        RGB {
            r: narrow_channel(self.r),
            g: narrow_channel(self.g),
            b: narrow_channel(self.b),
        }
    }

    /// Squared Euclidean distance in the widened space.
    pub fn distance_sq(self, other: Self) -> u64 {
        let dr = self.r.abs_diff(other.r) as u64;
        let dg = self.g.abs_diff(other.g) as u64;
        let db = self.b.abs_diff(other.b) as u64;
        dr * dr + dg * dg + db * db
    }
}

#[inline]
fn widen_channel(v: u8) -> u16 {
    (v as u32 * u16::MAX as u32 / u8::MAX as u32) as u16
}

#[inline]
fn narrow_channel(v: u16) -> u8 {
    ((v as u32 * u8::MAX as u32 + u16::MAX as u32 / 2) / u16::MAX as u32) as u8
}
