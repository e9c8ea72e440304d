extern crate alloc;
use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use rgb::RGB;

/// Byte length of the singleton-color header.
pub const HEADER_LEN: usize = 3;
/// Byte length of one merge record: merged color, child A, child B.
pub const RECORD_LEN: usize = 9;

/// One merge, narrowed to 8 bits per channel.
///
/// Records are stored in reverse-chronological order: record 0 is the last
/// merge the builder performed, so replaying records forward *undoes* the
/// clustering one split at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRecord {
    pub merged: RGB<u8>,
    pub a: RGB<u8>,
    pub b: RGB<u8>,
}

impl MergeRecord {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            merged: RGB {
                r: bytes[0],
                g: bytes[1],
                b: bytes[2],
            },
            a: RGB {
                r: bytes[3],
                g: bytes[4],
                b: bytes[5],
            },
            b: RGB {
                r: bytes[6],
                g: bytes[7],
                b: bytes[8],
            },
        }
    }
}

/// Read-only view over an encoded merge buffer.
///
/// Decoding is best-effort: a buffer that is not exactly
/// `HEADER_LEN + RECORD_LEN * m` bytes is treated as holding no clustering at
/// all, never as an error.
#[derive(Debug, Clone, Copy)]
pub struct Dendrogram<'a> {
    buffer: &'a [u8],
}

impl<'a> Dendrogram<'a> {
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < HEADER_LEN || (buffer.len() - HEADER_LEN) % RECORD_LEN != 0 {
            return None;
        }
        Some(Self { buffer })
    }

    /// The k=1 color: the root of the merge tree.
    pub fn root(&self) -> RGB<u8> {
        RGB {
            r: self.buffer[0],
            g: self.buffer[1],
            b: self.buffer[2],
        }
    }

    pub fn merge_count(&self) -> usize {
        (self.buffer.len() - HEADER_LEN) / RECORD_LEN
    }

    pub fn record(&self, index: usize) -> MergeRecord {
        let offset = HEADER_LEN + index * RECORD_LEN;
        MergeRecord::from_bytes(&self.buffer[offset..offset + RECORD_LEN])
    }

    pub fn records(&self) -> impl Iterator<Item = MergeRecord> + 'a {
        let records: &'a [u8] = &self.buffer[HEADER_LEN..];
        records.chunks_exact(RECORD_LEN).map(MergeRecord::from_bytes)
    }
}

/// Rebuild the palette of size `k` by replaying the most recent merges.
///
/// Starts from the root color and undoes `min(k - 1, merge_count)` merges,
/// each replacing a merged color with its two children. `k` larger than the
/// number of distinct leaf colors clamps; `k == 0` or a malformed buffer
/// yields an empty palette. The result is sorted lexicographically, so equal
/// inputs always produce identical output.
pub fn extract_palette(clustering: &[u8], k: u32) -> Vec<RGB<u8>> {
    let Some(dendrogram) = Dendrogram::parse(clustering) else {
        return Vec::new();
    };
    if k == 0 {
        return Vec::new();
    }

    let splits = ((k - 1) as usize).min(dendrogram.merge_count());
    let mut colors: BTreeSet<RGB<u8>> = BTreeSet::new();
    colors.insert(dendrogram.root());

    for index in 0..splits {
        let record = dendrogram.record(index);
        colors.remove(&record.merged);
        colors.insert(record.a);
        colors.insert(record.b);
    }

    colors.into_iter().collect()
}
