extern crate alloc;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::color::WideRgb;

/// Cache key meaning "this bucket currently knows no pair".
///
/// Real squared distances in the widened color cube are at most
/// `3 * 65535^2`, far below `u64::MAX`, so the sentinel always sorts last.
const NO_PAIR: u64 = u64::MAX;

/// Starting resolution used by the clustering pipeline.
pub const DEFAULT_RESOLUTION: u16 = 8;

/// A pair of colors and their squared distance, endpoints stored in
/// lexicographic order so equal-distance pairs compare identically no matter
/// which side observed them first.
#[derive(Debug, Clone, Copy)]
struct ClosePair {
    a: WideRgb,
    b: WideRgb,
    distance: u64,
}

impl ClosePair {
    const NONE: ClosePair = ClosePair {
        a: WideRgb::new(0, 0, 0),
        b: WideRgb::new(0, 0, 0),
        distance: NO_PAIR,
    };

    fn new(a: WideRgb, b: WideRgb) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            a,
            b,
            distance: a.distance_sq(b),
        }
    }

    fn contains(&self, point: WideRgb) -> bool {
        self.a == point || self.b == point
    }
}

type Cell = [u32; 3];

/// One grid cell: the live colors mapping to it at the current resolution and
/// the closest pair observed between this cell's points and its 3×3×3
/// neighborhood.
#[derive(Debug)]
struct Bucket {
    points: BTreeSet<WideRgb>,
    best: ClosePair,
}

impl Bucket {
    fn new() -> Self {
        Self {
            points: BTreeSet::new(),
            best: ClosePair::NONE,
        }
    }
}

/// A multi-resolution grid over 3-D color space answering "what is the
/// closest pair of live colors".
///
/// Each bucket caches its best pair over its 3×3×3 neighborhood; a
/// distance-keyed index over all buckets makes the smallest cached pair an
/// O(log n) lookup. Pairs spanning more than one neighborhood are invisible
/// until the grid coarsens: when no bucket holds a resolvable pair, the grid
/// rebuilds itself one level coarser and retries, and resolution 0
/// degenerates to brute force over one neighborhood. The answer is exact
/// whenever the nearest pair shares a neighborhood at the resolution that
/// produced it, which coarsening drives toward.
///
/// The grid and the cache must stay in lockstep: a bucket appears in the
/// cache under exactly its current best distance, and leaves both structures
/// within the same method call.
#[derive(Debug)]
pub struct CoarseningGrid {
    resolution: u16,
    cell_size: u32,
    grid: BTreeMap<Cell, Bucket>,
    cache: BTreeMap<u64, BTreeSet<Cell>>,
}

impl CoarseningGrid {
    pub fn new(resolution: u16) -> Self {
        let resolution = resolution.min(16);
        Self {
            resolution,
            cell_size: cell_size_for(resolution),
            grid: BTreeMap::new(),
            cache: BTreeMap::new(),
        }
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    /// Number of live points across all buckets.
    pub fn len(&self) -> usize {
        self.grid.values().map(|b| b.points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Insert a color. Duplicates are ignored; population weighting lives in
    /// the histogram, the grid holds each distinct color once.
    pub fn add(&mut self, point: WideRgb) {
        let location = self.location(point);
        match self.grid.get(&location) {
            Some(bucket) if bucket.points.contains(&point) => return,
            Some(_) => {}
            None => {
                self.grid.insert(location, Bucket::new());
                self.cache_insert(NO_PAIR, location);
            }
        }

        // Offer the new point to every bucket in the neighborhood; any whose
        // best pair improves gets re-keyed in the cache. Strict improvement
        // only, so equal-distance pairs keep the first one found.
        for cell in self.local_buckets(location) {
            let Some(bucket) = self.grid.get(&cell) else {
                continue;
            };
            let mut best = bucket.best;
            for &q in &bucket.points {
                let pair = ClosePair::new(q, point);
                if pair.distance < best.distance {
                    best = pair;
                }
            }
            if best.distance < bucket.best.distance {
                let old = bucket.best.distance;
                self.cache_remove(old, cell);
                self.cache_insert(best.distance, cell);
                if let Some(bucket) = self.grid.get_mut(&cell) {
                    bucket.best = best;
                }
            }
        }

        if let Some(bucket) = self.grid.get_mut(&location) {
            bucket.points.insert(point);
        }
    }

    /// Remove a color. Emptied buckets leave the grid and the cache within
    /// this call; neighbors whose best pair involved the point rescan their
    /// neighborhood by brute force (bounded by local density).
    pub fn remove(&mut self, point: WideRgb) {
        let location = self.location(point);
        let Some(bucket) = self.grid.get_mut(&location) else {
            return;
        };
        if !bucket.points.remove(&point) {
            return;
        }
        if bucket.points.is_empty() {
            let old = bucket.best.distance;
            self.grid.remove(&location);
            self.cache_remove(old, location);
        }

        for cell in self.local_buckets(location) {
            let Some(old) = self
                .grid
                .get(&cell)
                .and_then(|b| b.best.contains(point).then_some(b.best.distance))
            else {
                continue;
            };

            let local = self.local_points(cell);
            let own: Vec<WideRgb> = match self.grid.get(&cell) {
                Some(b) => b.points.iter().copied().collect(),
                None => continue,
            };
            let mut best = ClosePair::NONE;
            for &lp in &local {
                for &q in &own {
                    if q == lp {
                        continue;
                    }
                    let pair = ClosePair::new(q, lp);
                    if pair.distance < best.distance {
                        best = pair;
                    }
                }
            }

            self.cache_remove(old, cell);
            self.cache_insert(best.distance, cell);
            if let Some(bucket) = self.grid.get_mut(&cell) {
                bucket.best = best;
            }
        }
    }

    /// The closest resolvable pair of live colors, or `None` once no pair
    /// exists at any resolution (zero or one point left).
    ///
    /// Implemented as an explicit rebuild loop rather than recursion: when
    /// the smallest cache key is the no-pair sentinel and the resolution can
    /// still drop, all points are extracted and reinserted one level coarser.
    pub fn nearest(&mut self) -> Option<(WideRgb, WideRgb)> {
        loop {
            let (distance, cell) = match self.cache.iter().next() {
                Some((&distance, cells)) => (distance, cells.iter().next().copied()),
                None => return None,
            };

            if distance != NO_PAIR {
                let bucket = self.grid.get(&cell?)?;
                return Some((bucket.best.a, bucket.best.b));
            }
            if self.resolution == 0 {
                return None;
            }

            let points: Vec<WideRgb> = self
                .grid
                .values()
                .flat_map(|b| b.points.iter().copied())
                .collect();
            self.grid.clear();
            self.cache.clear();
            self.resolution -= 1;
            self.cell_size = cell_size_for(self.resolution);
            for point in points {
                self.add(point);
            }
        }
    }

    fn location(&self, point: WideRgb) -> Cell {
        [
            point.r as u32 / self.cell_size,
            point.g as u32 / self.cell_size,
            point.b as u32 / self.cell_size,
        ]
    }

    /// Existing bucket cells in the 3×3×3 neighborhood of `location`,
    /// clamped at the coordinate floor.
    fn local_buckets(&self, location: Cell) -> Vec<Cell> {
        let mut result = Vec::with_capacity(27);
        let min = location.map(|c| c.saturating_sub(1));
        let max = location.map(|c| c + 1);
        for x in min[0]..=max[0] {
            for y in min[1]..=max[1] {
                for z in min[2]..=max[2] {
                    let cell = [x, y, z];
                    if self.grid.contains_key(&cell) {
                        result.push(cell);
                    }
                }
            }
        }
        result
    }

    fn local_points(&self, location: Cell) -> Vec<WideRgb> {
        self.local_buckets(location)
            .into_iter()
            .filter_map(|cell| self.grid.get(&cell))
            .flat_map(|b| b.points.iter().copied())
            .collect()
    }

    fn cache_insert(&mut self, distance: u64, cell: Cell) {
        self.cache.entry(distance).or_default().insert(cell);
    }

    fn cache_remove(&mut self, distance: u64, cell: Cell) {
        if let Some(cells) = self.cache.get_mut(&distance) {
            cells.remove(&cell);
            if cells.is_empty() {
                self.cache.remove(&distance);
            }
        }
    }
}

fn cell_size_for(resolution: u16) -> u32 {
    ((u16::MAX as u32) >> resolution).max(1)
}
