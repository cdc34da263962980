/// Per-row offset/height bookkeeping for one row of the processed sequence.
///
/// Invariant (maintained transactionally by [`PositionCache`]):
/// `entry[i].offset == entry[i-1].offset + entry[i-1].height` for all `i > 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionEntry {
    /// Cumulative pixel distance from the top of the scrollable content.
    pub offset: f64,
    /// Resolved height of this row.
    pub height: f64,
    /// Whether `height` came from an actual rendered measurement rather than
    /// an estimate.
    pub measured: bool,
}

/// Sub-pixel deltas below this are treated as float jitter, not real resizes.
pub const HEIGHT_JITTER_PX: f64 = 1.0;

/// Per-row offset/height lookup table supporting O(log n) row-at-offset
/// queries and single-entry height updates with a cascading offset shift.
///
/// The cache is rebuilt wholesale when the row sequence is replaced and
/// updated incrementally when one row's height changes; there is no repair
/// path because offsets are always recomputed transactionally.
#[derive(Clone, Debug, Default)]
pub struct PositionCache {
    entries: Vec<PositionEntry>,
    total: f64,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the cache in a single forward pass. `resolve(i)` returns the
    /// resolved height for row `i` plus whether that height is a real
    /// measurement.
    pub fn rebuild(count: usize, mut resolve: impl FnMut(usize) -> (f64, bool)) -> Self {
        let mut entries = Vec::with_capacity(count);
        let mut offset = 0.0f64;
        for i in 0..count {
            let (height, measured) = resolve(i);
            debug_assert!(height >= 0.0, "negative row height at index {i}");
            entries.push(PositionEntry {
                offset,
                height,
                measured,
            });
            offset += height;
        }
        Self {
            entries,
            total: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&PositionEntry> {
        self.entries.get(index)
    }

    pub fn offset_of(&self, index: usize) -> f64 {
        match self.entries.get(index) {
            Some(e) => e.offset,
            None => self.total,
        }
    }

    pub fn height_of(&self, index: usize) -> f64 {
        self.entries.get(index).map(|e| e.height).unwrap_or(0.0)
    }

    pub fn is_measured(&self, index: usize) -> bool {
        self.entries.get(index).map(|e| e.measured).unwrap_or(false)
    }

    pub fn total_height(&self) -> f64 {
        self.total
    }

    /// Sets row `index` to `new_height` and shifts the offset of every later
    /// entry by the delta. Deltas under [`HEIGHT_JITTER_PX`] are ignored to
    /// avoid churn from sub-pixel measurement noise.
    ///
    /// Returns whether the cache changed. O(n - index) worst case, but only
    /// runs on actual measured deltas, never per frame.
    pub fn update_height(&mut self, index: usize, new_height: f64) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        let delta = new_height - entry.height;
        if delta.abs() < HEIGHT_JITTER_PX {
            return false;
        }
        entry.height = new_height;
        for later in &mut self.entries[index + 1..] {
            later.offset += delta;
        }
        self.total += delta;
        true
    }

    pub fn set_measured(&mut self, index: usize, measured: bool) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.measured = measured;
        }
    }

    /// Binary search for the greatest index whose `offset <= target`.
    /// Returns `None` when the cache is empty. O(log n).
    pub fn row_index_at_offset(&self, target: f64) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        if target <= 0.0 {
            return Some(0);
        }
        let mut lo = 0usize;
        let mut hi = self.entries.len(); // exclusive
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.entries[mid].offset <= target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(lo)
    }
}
