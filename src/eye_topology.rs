//! Fixed landmark topology for eye contours.
//!
//! Eye points arrive as consecutive 28-point blocks, one per eye. Each block
//! holds three closed rings: iris `0..=7`, eyelid `8..=19`, pupil `20..=27`.
//! A point links to its successor except at a ring end, where it wraps back
//! to the ring start.

/// Which part of the eye a contour segment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourKind {
    /// Iris and pupil rings
    IrisPupil,
    Eyelid,
}

/// One entry of the per-block topology table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeLink {
    pub index: usize,
    pub paired: usize,
    /// True where the ring closes instead of continuing linearly
    pub is_boundary: bool,
    pub kind: ContourKind,
}

/// A resolved segment between two indices of the eye point sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyePair {
    pub from: usize,
    pub to: usize,
    pub kind: ContourKind,
}

/// Ring layout of a single eye block: inclusive (start, end) index ranges
#[derive(Debug, Clone, Copy)]
pub struct EyeTopology {
    pub block_len: usize,
    pub rings: &'static [(usize, usize)],
    /// Inclusive range of eyelid indices within a block
    pub eyelid: (usize, usize),
}

pub const EYE_RINGS: [(usize, usize); 3] = [(0, 7), (8, 19), (20, 27)];

/// The 28-point-per-eye layout produced by the tracker
pub const TRACKER_EYE_TOPOLOGY: EyeTopology = EyeTopology {
    block_len: 28,
    rings: &EYE_RINGS,
    eyelid: (8, 19),
};

impl Default for EyeTopology {
    fn default() -> Self {
        TRACKER_EYE_TOPOLOGY
    }
}

impl EyeTopology {
    /// Classification by index local to its block: `< 8` or `> 19` is iris/pupil
    pub fn kind(&self, local: usize) -> ContourKind {
        if local < self.eyelid.0 || local > self.eyelid.1 {
            ContourKind::IrisPupil
        } else {
            ContourKind::Eyelid
        }
    }

    /// The topology of one block as data
    pub fn links(&self) -> Vec<EyeLink> {
        (0..self.block_len)
            .map(|index| {
                let ring_start = self
                    .rings
                    .iter()
                    .find(|&&(_, end)| end == index)
                    .map(|&(start, _)| start);
                EyeLink {
                    index,
                    paired: ring_start.unwrap_or(index + 1),
                    is_boundary: ring_start.is_some(),
                    kind: self.kind(index),
                }
            })
            .collect()
    }

    /// Segments for `len` points laid out in consecutive blocks.
    /// Pairs whose partner falls outside the sequence are skipped.
    pub fn pairs(&self, len: usize) -> Vec<EyePair> {
        if self.block_len == 0 {
            return Vec::new();
        }
        let links = self.links();
        (0..len)
            .filter_map(|i| {
                let base = i - i % self.block_len;
                let link = links[i % self.block_len];
                let to = base + link.paired;
                (to < len).then_some(EyePair {
                    from: i,
                    to,
                    kind: link.kind,
                })
            })
            .collect()
    }
}
