use std::collections::HashSet;

/// Scroll information handed to `on_scroll` hooks for each settled scroll
/// batch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollMetrics {
    pub offset: f64,
    /// Signed change since the previous scroll event.
    pub delta: f64,
    pub viewport_height: f64,
}

/// Per-controller registry of injected plugin styles.
///
/// Plugins that inject style sheets into the render target use this to do so
/// once per target instead of once per render; ownership is tied to the
/// controller's lifetime, never process-wide static state.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    injected: HashSet<String>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `key` is seen; callers inject their
    /// style exactly when this returns `true`.
    pub fn ensure(&mut self, key: &str) -> bool {
        self.injected.insert(key.to_owned())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.injected.contains(key)
    }

    pub fn len(&self) -> usize {
        self.injected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.injected.is_empty()
    }

    pub fn clear(&mut self) {
        self.injected.clear();
    }
}

/// The hook contract independent grid extensions implement.
///
/// Every hook has a neutral default body, so plugins implement only the
/// subset they care about. Hooks are called at fixed pipeline stages in
/// plugin registration order; transforming hooks compose by chaining (each
/// plugin sees the previous plugin's output, not the original input).
///
/// A hook that panics is a defective extension; the pipeline does not catch
/// it, because scheduling a retry would mask the bug rather than fix it.
///
/// Type parameters: `R` is the externally owned row handle, `C` the column
/// type, `S` the per-row render surface of the target.
pub trait GridPlugin<R, C, S> {
    /// Stable plugin name, used to key [`StyleRegistry`] entries.
    fn name(&self) -> &'static str;

    /// Transforms the row sequence (may change length, order, annotations).
    fn process_rows(&mut self, rows: Vec<R>) -> Vec<R> {
        rows
    }

    /// Transforms the visible column sequence.
    fn process_columns(&mut self, columns: Vec<C>) -> Vec<C> {
        columns
    }

    /// Renders one materialized row. Returning `true` claims the row: the
    /// core's default row rendering is skipped for it.
    fn render_row(&mut self, _row: &R, _surface: &mut S, _index: usize) -> bool {
        false
    }

    /// Runs once per structural refresh after rows and columns are in
    /// place, never for scroll-only refreshes. The style registry is the
    /// place to inject one-time style sheets.
    fn after_render(&mut self, _styles: &mut StyleRegistry) {}

    /// Scroll metrics for each settled scroll batch.
    fn on_scroll(&mut self, _metrics: &ScrollMetrics) {}

    /// Reapply visual state to recycled surfaces after the window shifted.
    fn on_scroll_render(&mut self) {}

    /// Authoritative height for a row this plugin manages (e.g. an expanded
    /// detail panel). The first plugin returning `Some` wins.
    fn row_height(&self, _row: &R, _index: usize) -> Option<f64> {
        None
    }

    /// Pulls the window start backward to keep a row rendered; the smallest
    /// answer across plugins wins. Forward pushes are ignored.
    fn adjust_virtual_start(
        &self,
        _start: usize,
        _scroll_offset: f64,
        _base_height: f64,
    ) -> Option<usize> {
        None
    }

    /// Total height this plugin contributes beyond base row heights.
    /// Summed across plugins; consulted in fixed-height mode only.
    fn extra_height(&self) -> f64 {
        0.0
    }

    /// The share of [`Self::extra_height`] contributed by rows before
    /// `index`.
    fn extra_height_before(&self, _index: usize) -> f64 {
        0.0
    }
}
