extern crate alloc;
use alloc::boxed::Box;
use alloc::vec::Vec;

use rgb::RGB;

/// A static nearest-color index over a palette: a balanced 3-d tree built
/// once per quantization call.
///
/// Construction sorts and deduplicates the palette, splits on the axis of
/// greatest spread (lowest axis wins ties) and uses the median as the node,
/// so the tree and every query answer are fully determined by the palette
/// contents regardless of input order.
#[derive(Debug)]
pub struct NearestPalette {
    root: Option<Box<Node>>,
}

#[derive(Debug)]
struct Node {
    color: RGB<u8>,
    axis: usize,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl NearestPalette {
    pub fn new(palette: &[RGB<u8>]) -> Self {
        let mut colors: Vec<RGB<u8>> = palette.to_vec();
        colors.sort_unstable();
        colors.dedup();
        Self {
            root: build(&mut colors),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The palette color closest to `color` in squared Euclidean distance.
    /// `None` only for an empty palette. Equidistant candidates resolve to
    /// the first one met in traversal order (strict improvement only).
    pub fn nearest(&self, color: RGB<u8>) -> Option<RGB<u8>> {
        let root = self.root.as_deref()?;
        let mut best = (distance_sq(root.color, color), root.color);
        search(root, color, &mut best);
        Some(best.1)
    }
}

fn build(colors: &mut [RGB<u8>]) -> Option<Box<Node>> {
    if colors.is_empty() {
        return None;
    }
    let axis = spread_axis(colors);
    let mid = colors.len() / 2;
    // Secondary key: full color, so equal axis values still order totally
    colors.select_nth_unstable_by_key(mid, |&c| (channel(c, axis), c));

    let color = colors[mid];
    let (left, rest) = colors.split_at_mut(mid);
    let right = &mut rest[1..];
    Some(Box::new(Node {
        color,
        axis,
        left: build(left),
        right: build(right),
    }))
}

/// Branch-and-bound descent: visit the half-space containing the query
/// first, then the sibling only if the splitting plane is closer than the
/// best distance found so far.
fn search(node: &Node, query: RGB<u8>, best: &mut (u32, RGB<u8>)) {
    let d = distance_sq(node.color, query);
    if d < best.0 {
        *best = (d, node.color);
    }

    let query_v = channel(query, node.axis) as i32;
    let node_v = channel(node.color, node.axis) as i32;
    let (near, far) = if query_v < node_v {
        (&node.left, &node.right)
    } else {
        (&node.right, &node.left)
    };

    if let Some(near) = near {
        search(near, query, best);
    }
    if let Some(far) = far {
        let plane = query_v - node_v;
        if ((plane * plane) as u32) < best.0 {
            search(far, query, best);
        }
    }
}

fn channel(color: RGB<u8>, axis: usize) -> u8 {
    match axis {
        0 => color.r,
        1 => color.g,
        _ => color.b,
    }
}

fn spread_axis(colors: &[RGB<u8>]) -> usize {
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    for &color in colors {
        for axis in 0..3 {
            let v = channel(color, axis);
            min[axis] = min[axis].min(v);
            max[axis] = max[axis].max(v);
        }
    }
    let spread = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
    let mut axis = 0;
    for candidate in 1..3 {
        if spread[candidate] > spread[axis] {
            axis = candidate;
        }
    }
    axis
}

fn distance_sq(a: RGB<u8>, b: RGB<u8>) -> u32 {
    let dr = a.r.abs_diff(b.r) as u32;
    let dg = a.g.abs_diff(b.g) as u32;
    let db = a.b.abs_diff(b.b) as u32;
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> RGB<u8> {
        RGB { r, g, b }
    }

    fn brute_force(palette: &[RGB<u8>], query: RGB<u8>) -> u32 {
        palette
            .iter()
            .map(|&c| distance_sq(c, query))
            .min()
            .expect("non-empty palette")
    }

    fn lcg_colors(n: usize, seed: u64) -> Vec<RGB<u8>> {
        let mut state = seed;
        let mut step = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 56) as u8
        };
        (0..n).map(|_| rgb(step(), step(), step())).collect()
    }

    #[test]
    fn empty_palette_has_no_answer() {
        let index = NearestPalette::new(&[]);
        assert!(index.is_empty());
        assert_eq!(index.nearest(rgb(1, 2, 3)), None);
    }

    #[test]
    fn single_entry_always_wins() {
        let index = NearestPalette::new(&[rgb(10, 20, 30)]);
        assert_eq!(index.nearest(rgb(0, 0, 0)), Some(rgb(10, 20, 30)));
        assert_eq!(index.nearest(rgb(255, 255, 255)), Some(rgb(10, 20, 30)));
    }

    #[test]
    fn exact_member_maps_to_itself() {
        let palette = [rgb(0, 0, 0), rgb(100, 50, 25), rgb(255, 255, 255)];
        let index = NearestPalette::new(&palette);
        for &c in &palette {
            assert_eq!(index.nearest(c), Some(c));
        }
    }

    #[test]
    fn matches_brute_force_on_random_palette() {
        let palette = lcg_colors(64, 0xDEAD);
        let index = NearestPalette::new(&palette);
        for query in lcg_colors(200, 0xF00D) {
            let found = index.nearest(query).expect("non-empty");
            assert_eq!(
                distance_sq(found, query),
                brute_force(&palette, query),
                "query {query:?}"
            );
        }
    }

    #[test]
    fn insensitive_to_palette_order() {
        let mut palette = lcg_colors(32, 0xC0FFEE);
        let forward = NearestPalette::new(&palette);
        palette.reverse();
        let reversed = NearestPalette::new(&palette);
        for query in lcg_colors(100, 0x5EED) {
            assert_eq!(forward.nearest(query), reversed.nearest(query));
        }
    }

    #[test]
    fn equidistant_queries_are_deterministic() {
        // 128 sits exactly between 118 and 138
        let palette = [rgb(118, 0, 0), rgb(138, 0, 0)];
        let index = NearestPalette::new(&palette);
        let first = index.nearest(rgb(128, 0, 0));
        for _ in 0..10 {
            assert_eq!(index.nearest(rgb(128, 0, 0)), first);
        }
    }

    #[test]
    fn duplicates_in_palette_are_collapsed() {
        let palette = [rgb(5, 5, 5); 16];
        let index = NearestPalette::new(&palette);
        assert_eq!(index.nearest(rgb(0, 0, 0)), Some(rgb(5, 5, 5)));
    }
}
