//! Chunk type and byte-range splitting.

/// A byte range `[start, end)` (half-open) of the remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Chunk {
    /// Length of this chunk in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// curl range spec (inclusive end), e.g. `0-99`. Sent as `Range: bytes=0-99`.
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end.saturating_sub(1))
    }

    /// HTTP Range header value (inclusive end): `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}", self.curl_range())
    }
}

/// Splits `[0, total)` into `parts` contiguous chunks of `total / parts` bytes;
/// the last chunk absorbs the remainder.
///
/// Returns fewer chunks when `total < parts` so no chunk is empty, and an
/// empty vec if `total` or `parts` is 0.
pub fn split_chunks(total: u64, parts: usize) -> Vec<Chunk> {
    if total == 0 || parts == 0 {
        return Vec::new();
    }

    let parts = (parts as u64).min(total);
    let base = total / parts;

    (0..parts)
        .map(|i| {
            let start = i * base;
            let end = if i == parts - 1 { total } else { start + base };
            Chunk { start, end }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(chunks: &[Chunk], total: u64) {
        let mut next = 0;
        for c in chunks {
            assert_eq!(c.start, next, "gap or overlap at {}", c.start);
            assert!(!c.is_empty());
            next = c.end;
        }
        assert_eq!(next, total);
    }

    #[test]
    fn split_even() {
        let chunks = split_chunks(1000, 4);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], Chunk { start: 0, end: 250 });
        assert_eq!(chunks[3], Chunk { start: 750, end: 1000 });
        assert_exact_cover(&chunks, 1000);
    }

    #[test]
    fn last_chunk_absorbs_remainder() {
        let chunks = split_chunks(10, 4);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], Chunk { start: 0, end: 2 });
        assert_eq!(chunks[1], Chunk { start: 2, end: 4 });
        assert_eq!(chunks[2], Chunk { start: 4, end: 6 });
        assert_eq!(chunks[3], Chunk { start: 6, end: 10 });
    }

    #[test]
    fn cover_holds_for_many_sizes() {
        for total in [1u64, 3, 4, 5, 1023, 1 << 20, 50 * 1024 * 1024 + 7] {
            for parts in 1..=9 {
                assert_exact_cover(&split_chunks(total, parts), total);
            }
        }
    }

    #[test]
    fn fewer_chunks_than_parts_for_tiny_totals() {
        let chunks = split_chunks(3, 4);
        assert_eq!(chunks.len(), 3);
        assert_exact_cover(&chunks, 3);
    }

    #[test]
    fn split_empty() {
        assert!(split_chunks(0, 4).is_empty());
        assert!(split_chunks(100, 0).is_empty());
    }

    #[test]
    fn chunk_range_header() {
        let c = Chunk { start: 0, end: 99 };
        assert_eq!(c.range_header_value(), "bytes=0-98");
        assert_eq!(c.len(), 99);
        let single = Chunk { start: 42, end: 43 };
        assert_eq!(single.curl_range(), "42-42");
    }
}
