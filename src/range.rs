use std::fmt;

/// An inclusive block interval scanned by a single provider query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    pub from_block: u64,
    pub to_block: u64,
}

impl ScanRange {
    /// Returns `None` when `from_block > to_block`.
    pub fn new(from_block: u64, to_block: u64) -> Option<Self> {
        (from_block <= to_block).then_some(ScanRange {
            from_block,
            to_block,
        })
    }

    /// Number of blocks covered (always at least one).
    pub fn len(&self) -> u64 {
        self.to_block - self.from_block + 1
    }

    pub fn is_single_block(&self) -> bool {
        self.from_block == self.to_block
    }

    /// Splits into `[from, last]` and `[last + 1, to]`.
    ///
    /// A `last` outside `[from, to)` falls back to the midpoint. Single-block
    /// ranges cannot be split.
    pub fn split_at(&self, last: Option<u64>) -> Option<(ScanRange, ScanRange)> {
        if self.is_single_block() {
            return None;
        }
        let midpoint = self.from_block + (self.to_block - self.from_block) / 2;
        let last = last
            .filter(|b| *b >= self.from_block && *b < self.to_block)
            .unwrap_or(midpoint);
        Some((
            ScanRange {
                from_block: self.from_block,
                to_block: last,
            },
            ScanRange {
                from_block: last + 1,
                to_block: self.to_block,
            },
        ))
    }
}

impl fmt::Display for ScanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from_block, self.to_block)
    }
}

/// Consecutive ranges covering `[start, end]` in ascending order, each at most
/// `chunk_size` blocks. Empty when `start > end`.
pub fn partition(start: u64, end: u64, chunk_size: u64) -> Vec<ScanRange> {
    let chunk_size = chunk_size.max(1);
    let mut ranges = Vec::new();
    let mut from = start;

    while from <= end {
        let to = from.saturating_add(chunk_size - 1).min(end);
        ranges.push(ScanRange {
            from_block: from,
            to_block: to,
        });
        if to == u64::MAX {
            break;
        }
        from = to + 1;
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_respects_chunk_size() {
        let ranges = partition(100, 220, 50);
        assert_eq!(
            ranges,
            vec![
                ScanRange::new(100, 149).unwrap(),
                ScanRange::new(150, 199).unwrap(),
                ScanRange::new(200, 220).unwrap(),
            ]
        );
        assert!(ranges.iter().all(|r| r.len() <= 50));
    }

    #[test]
    fn partition_single_block_and_empty() {
        assert_eq!(partition(7, 7, 1000), vec![ScanRange::new(7, 7).unwrap()]);
        assert!(partition(8, 7, 1000).is_empty());
    }

    #[test]
    fn partition_treats_zero_chunk_as_one() {
        assert_eq!(partition(1, 3, 0).len(), 3);
    }

    #[test]
    fn split_uses_hint_inside_range() {
        let range = ScanRange::new(100, 199).unwrap();
        let (lo, hi) = range.split_at(Some(120)).unwrap();
        assert_eq!((lo.from_block, lo.to_block), (100, 120));
        assert_eq!((hi.from_block, hi.to_block), (121, 199));
    }

    #[test]
    fn split_falls_back_to_midpoint() {
        let range = ScanRange::new(100, 199).unwrap();
        let (lo, hi) = range.split_at(Some(500)).unwrap();
        assert_eq!(lo.to_block, 149);
        assert_eq!(hi.from_block, 150);
        assert!(ScanRange::new(5, 5).unwrap().split_at(None).is_none());
    }
}
