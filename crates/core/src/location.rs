use serde::{Deserialize, Serialize};

/// A block of consecutive residue positions, inclusive and 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub start: usize,
    pub end: usize,
}

impl Block {
    pub fn new(start: usize, end: usize) -> Self {
        Block { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// A set of residue positions held as ordered, disjoint, inclusive blocks.
/// Positions are 1-based throughout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub blocks: Vec<Block>,
}

impl Location {
    pub fn empty() -> Self {
        Location { blocks: vec![] }
    }

    /// Single contiguous range.
    pub fn range(start: usize, end: usize) -> Self {
        Location {
            blocks: vec![Block::new(start, end)],
        }
    }

    /// From arbitrary (start, end) pairs; overlapping or touching ranges are
    /// merged and the result is sorted.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut sorted: Vec<(usize, usize)> = ranges.into_iter().collect();
        sorted.sort_unstable();
        let mut blocks: Vec<Block> = Vec::new();
        for (start, end) in sorted {
            match blocks.last_mut() {
                Some(last) if start <= last.end + 1 => last.end = last.end.max(end),
                _ => blocks.push(Block::new(start, end)),
            }
        }
        Location { blocks }
    }

    /// From single positions, collapsing runs of consecutive values.
    pub fn from_positions(positions: impl IntoIterator<Item = usize>) -> Self {
        Self::from_ranges(positions.into_iter().map(|p| (p, p)))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// First position, 0 when empty.
    pub fn start(&self) -> usize {
        self.blocks.first().map_or(0, |b| b.start)
    }

    /// Last position, 0 when empty.
    pub fn end(&self) -> usize {
        self.blocks.last().map_or(0, |b| b.end)
    }

    /// Total number of positions covered.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// Binary search over the ordered blocks.
    pub fn contains(&self, pos: usize) -> bool {
        self.blocks
            .binary_search_by(|b| {
                if pos < b.start {
                    std::cmp::Ordering::Greater
                } else if pos > b.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().flat_map(|b| b.start..=b.end)
    }

    pub fn union(&self, other: &Location) -> Location {
        Location::from_ranges(
            self.blocks
                .iter()
                .chain(other.blocks.iter())
                .map(|b| (b.start, b.end)),
        )
    }

    /// True when the two locations share at least one position.
    pub fn intersects(&self, other: &Location) -> bool {
        let (mut a, mut b) = (self.blocks.iter().peekable(), other.blocks.iter().peekable());
        while let (Some(x), Some(y)) = (a.peek(), b.peek()) {
            if x.end < y.start {
                a.next();
            } else if y.end < x.start {
                b.next();
            } else {
                return true;
            }
        }
        false
    }

    /// Positions of `self` not present in `other`.
    pub fn difference(&self, other: &Location) -> Location {
        Location::from_positions(self.positions().filter(|&p| !other.contains(p)))
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .blocks
            .iter()
            .map(|b| {
                if b.start == b.end {
                    b.start.to_string()
                } else {
                    format!("{}:{}", b.start, b.end)
                }
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
