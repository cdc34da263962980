use std::collections::{HashMap, HashSet};

use crate::position::PositionCache;
use crate::window::{self, WindowHooks};
use crate::{
    RowIdentity, RowKey, RowRange, ScrollGeometry, VirtualOptions, VirtualState, WindowOutcome,
};

/// Height inputs for one row during a rebuild, resolved by the caller from
/// the plugin pipeline and the user's height function.
///
/// Resolution order: `plugin_height`, else `provided_height`, else a durable
/// cached measurement for `key`, else the estimate (running measured average
/// when available, else the configured base row height).
#[derive(Clone, Debug)]
pub struct RowProbe<K = RowKey> {
    pub key: K,
    /// Height supplied by a plugin (e.g. an expanded detail panel). Such
    /// rows are "managed" and excluded from average-height statistics, which
    /// would otherwise skew the estimate used for never-measured rows.
    pub plugin_height: Option<f64>,
    /// Height supplied by the host's per-row height function.
    pub provided_height: Option<f64>,
}

impl<K> RowProbe<K> {
    pub fn new(key: K) -> Self {
        Self {
            key,
            plugin_height: None,
            provided_height: None,
        }
    }
}

/// The headless virtualization engine for a single vertical scroll axis.
///
/// This type is intentionally UI-agnostic:
/// - It does not hold row payloads or any UI objects; rows are externally
///   owned and referenced only by index and identity key.
/// - An orchestration layer drives it with viewport geometry, scroll offsets
///   and rendered-height measurements, and consumes [`WindowOutcome`]s.
///
/// For the plugin hook contract and the render-phase scheduler, see the
/// `gridvirt-pipeline` crate.
#[derive(Clone, Debug)]
pub struct RowVirtualizer<K = RowKey> {
    options: VirtualOptions,
    positions: PositionCache,
    keys: Vec<K>,
    managed: Vec<bool>,
    /// Durable measurements keyed by row identity. Survives row-sequence
    /// rebuilds so scrolling away and back never remeasures unchanged rows.
    height_cache: HashMap<K, f64>,
    /// Keys whose cached measurement is included in the running average.
    /// Invariant: `k in counted` implies `avg_sum` contains exactly
    /// `height_cache[k]`. Managed rows and out-of-band resizes record
    /// measurements without entering the statistics, so cache membership
    /// alone cannot stand in for "already counted".
    counted: HashSet<K>,
    avg_sum: f64,
    avg_count: usize,
    range: RowRange,
}

impl<K: RowIdentity> RowVirtualizer<K> {
    pub fn new(options: VirtualOptions) -> Self {
        gdebug!(
            count = options.count,
            enabled = options.enabled,
            variable = options.variable_heights,
            "RowVirtualizer::new"
        );
        Self {
            options,
            positions: PositionCache::new(),
            keys: Vec::new(),
            managed: Vec::new(),
            height_cache: HashMap::new(),
            counted: HashSet::new(),
            avg_sum: 0.0,
            avg_count: 0,
            range: RowRange::default(),
        }
    }

    pub fn options(&self) -> &VirtualOptions {
        &self.options
    }

    /// Replaces the configuration. The position cache is not rebuilt here;
    /// callers follow up with [`Self::rebuild_rows`] on structural changes.
    pub fn set_options(&mut self, options: VirtualOptions) {
        self.options = options;
        self.range.start = self.range.start.min(self.options.count);
        self.range.end = self.range.end.min(self.options.count);
    }

    pub fn update_options(&mut self, f: impl FnOnce(&mut VirtualOptions)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn count(&self) -> usize {
        self.options.count
    }

    /// Rebuilds the position cache for a replaced row sequence in a single
    /// forward pass. `probe(i)` supplies the identity key and any plugin or
    /// host-provided height for row `i`.
    pub fn rebuild_rows(&mut self, count: usize, mut probe: impl FnMut(usize) -> RowProbe<K>) {
        gdebug!(count, cached = self.height_cache.len(), "rebuild_rows");
        self.options.count = count;
        self.keys.clear();
        self.managed.clear();
        self.keys.reserve_exact(count);
        self.managed.reserve_exact(count);

        let estimate = self.estimate_height();
        let mut resolved = Vec::with_capacity(count);
        for i in 0..count {
            let p = probe(i);
            let (height, measured, managed) = if let Some(h) = p.plugin_height {
                (h, false, true)
            } else if let Some(h) = p.provided_height {
                (h, false, false)
            } else if let Some(&h) = self.height_cache.get(&p.key) {
                (h, true, false)
            } else {
                (estimate, false, false)
            };
            self.keys.push(p.key);
            self.managed.push(managed);
            resolved.push((height, measured));
        }
        self.positions = PositionCache::rebuild(count, |i| resolved[i]);
        self.range.start = self.range.start.min(count);
        self.range.end = self.range.end.min(count);
    }

    /// Applies rendered-height measurements for currently materialized rows.
    ///
    /// Each material delta updates the position cache (cascading later
    /// offsets) and is recorded into the durable height cache. Returns
    /// whether anything materially changed, so the caller knows to
    /// recalculate the scrollbar spacer.
    pub fn measure_rows(&mut self, measurements: impl IntoIterator<Item = (usize, f64)>) -> bool {
        let mut changed = false;
        for (index, px) in measurements {
            if index >= self.keys.len() {
                continue;
            }
            gtrace!(index, px, "measure row");
            if self.managed[index] {
                // A managed row's height is plugin-driven; evict any
                // contribution left from when the row was unmanaged.
                self.uncount(index);
            } else if self.counted.insert(self.keys[index].clone()) {
                self.avg_sum += px;
                self.avg_count += 1;
            } else if let Some(prev) = self.height_cache.get(&self.keys[index]) {
                self.avg_sum += px - prev;
            }
            self.height_cache.insert(self.keys[index].clone(), px);
            changed |= self.positions.update_height(index, px);
            self.positions.set_measured(index, true);
        }
        changed
    }

    /// Out-of-band height change for plugins that resize a row between
    /// refreshes (expand/collapse). `None` drops the durable measurement and
    /// falls back to the estimate.
    pub fn invalidate_row_height(&mut self, index: usize, new_height: Option<f64>) {
        if index >= self.keys.len() {
            return;
        }
        match new_height {
            Some(px) => {
                // Out-of-band resizes are plugin-driven; they must not skew
                // the estimate, so the row leaves the statistics until a
                // real measurement re-counts it.
                self.uncount(index);
                self.height_cache.insert(self.keys[index].clone(), px);
                self.positions.update_height(index, px);
                self.positions.set_measured(index, true);
            }
            None => {
                self.uncount(index);
                self.height_cache.remove(&self.keys[index]);
                let estimate = self.estimate_height();
                self.positions.update_height(index, estimate);
                self.positions.set_measured(index, false);
            }
        }
    }

    /// Removes row `index`'s contribution from the running average, if any.
    fn uncount(&mut self, index: usize) {
        let key = &self.keys[index];
        if self.counted.remove(key) {
            if let Some(prev) = self.height_cache.get(key) {
                self.avg_sum -= prev;
            }
            self.avg_count -= 1;
        }
    }

    /// Drops all durable measurements and statistics.
    pub fn reset_measurements(&mut self) {
        self.height_cache.clear();
        self.counted.clear();
        self.avg_sum = 0.0;
        self.avg_count = 0;
    }

    pub fn measurement_cache_len(&self) -> usize {
        self.height_cache.len()
    }

    /// Exports the durable measurements as a `Vec` (useful for persistence).
    pub fn export_measurement_cache(&self) -> Vec<(K, f64)> {
        self.height_cache
            .iter()
            .map(|(k, &v)| (k.clone(), v))
            .collect()
    }

    /// Replaces the durable measurements and re-resolves the heights of any
    /// currently known rows whose key now has a cached measurement. Average
    /// statistics restart; imported rows re-enter them on their next real
    /// measurement.
    pub fn import_measurement_cache(&mut self, entries: impl IntoIterator<Item = (K, f64)>) {
        self.height_cache.clear();
        self.counted.clear();
        self.avg_sum = 0.0;
        self.avg_count = 0;
        for (k, v) in entries {
            self.height_cache.insert(k, v);
        }
        gdebug!(entries = self.height_cache.len(), "import_measurement_cache");
        for i in 0..self.keys.len() {
            if let Some(&px) = self.height_cache.get(&self.keys[i]) {
                self.positions.update_height(i, px);
                self.positions.set_measured(i, true);
            }
        }
    }

    /// The height estimate for never-measured rows: running measured average
    /// when available, else the configured base row height.
    pub fn estimate_height(&self) -> f64 {
        if self.avg_count > 0 {
            self.avg_sum / self.avg_count as f64
        } else {
            self.options.row_height
        }
    }

    /// Resolved height of one row.
    pub fn row_height_of(&self, index: usize) -> f64 {
        if self.options.variable_heights {
            self.positions.height_of(index)
        } else {
            self.options.row_height
        }
    }

    pub fn offset_of(&self, index: usize) -> f64 {
        if self.options.variable_heights {
            self.positions.offset_of(index)
        } else {
            index as f64 * self.options.row_height
        }
    }

    /// Pure row content height (no chrome or plugin extra height).
    pub fn total_height(&self) -> f64 {
        if self.options.variable_heights {
            self.positions.total_height()
        } else {
            self.options.count as f64 * self.options.row_height
        }
    }

    pub fn max_scroll_offset(&self, viewport_height: f64) -> f64 {
        (self.total_height() - viewport_height).max(0.0)
    }

    pub fn clamp_scroll_offset(&self, offset: f64, viewport_height: f64) -> f64 {
        offset.clamp(0.0, self.max_scroll_offset(viewport_height))
    }

    /// The currently materialized row range, as last applied by the caller.
    pub fn range(&self) -> RowRange {
        self.range
    }

    /// Records the materialized range after a window plan has been applied.
    pub fn set_range(&mut self, range: RowRange) {
        debug_assert!(
            range.start <= range.end && range.end <= self.options.count,
            "range {}..{} out of bounds (count={})",
            range.start,
            range.end,
            self.options.count
        );
        self.range = range;
    }

    pub fn positions(&self) -> &PositionCache {
        &self.positions
    }

    pub fn state(&self) -> VirtualState {
        VirtualState {
            enabled: self.options.enabled,
            row_height: self.options.row_height,
            bypass_threshold: self.options.bypass_threshold,
            start: self.range.start,
            end: self.range.end,
            variable_heights: self.options.variable_heights,
            average_height: self.estimate_height(),
            measured_count: self.avg_count,
        }
    }

    /// Computes the row window for the current geometry. Pure with respect
    /// to the engine's state; callers apply the resulting plan and record
    /// the materialized range via [`Self::set_range`].
    ///
    /// `force` distinguishes a structural refresh (data/column/plugin
    /// change) from a scroll-triggered one; bypass plans only reset the
    /// container transform when structural.
    pub fn plan_window(
        &self,
        geometry: ScrollGeometry,
        force: bool,
        hooks: &dyn WindowHooks,
    ) -> WindowOutcome {
        debug_assert!(
            !self.options.variable_heights || self.positions.len() == self.options.count,
            "variable-height planning requires a rebuilt position cache"
        );
        window::plan(&self.options, &self.positions, geometry, force, hooks)
    }
}
