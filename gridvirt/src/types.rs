/// How the virtualization window is being computed for the current refresh.
///
/// The mode is chosen per refresh from the row count and configuration, never
/// fixed at startup: shrinking a dataset below the bypass threshold switches
/// the next refresh to bypass without any reconfiguration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VirtualMode {
    /// Virtualization turned off: every row is rendered.
    Disabled,
    /// Row count at or below the bypass threshold: every row is rendered,
    /// but spacer sizing still reflects true content height.
    Bypass,
    /// Only the rows intersecting the viewport (plus overscan) are rendered.
    Windowed,
}

/// A half-open row index range (`start..end`) over the processed row sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "invalid range {start}..{end}");
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// A read-only snapshot of the render target's scroll geometry, captured by
/// the adapter at the start of a refresh.
///
/// `chrome_delta` compensates for headers/footers/horizontal scrollbar
/// consuming vertical space inside the scroll container but not inside the
/// sibling scrollbar track.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollGeometry {
    pub scroll_offset: f64,
    pub viewport_height: f64,
    /// Height of the element hosting the scrollbar spacer. Zero while the
    /// viewport reports non-zero height indicates detached/stale references.
    pub scrollbar_track_height: f64,
    pub chrome_delta: f64,
    pub h_scrollbar_compensation: f64,
}

impl ScrollGeometry {
    pub fn new(scroll_offset: f64, viewport_height: f64) -> Self {
        Self {
            scroll_offset,
            viewport_height,
            scrollbar_track_height: viewport_height,
            chrome_delta: 0.0,
            h_scrollbar_compensation: 0.0,
        }
    }
}

/// The outcome of one window computation: which rows to materialize and how
/// to position/size the render surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowPlan {
    pub mode: VirtualMode,
    pub range: RowRange,
    /// Translation to apply to the rendered row container. `None` means
    /// "leave the current transform alone" (bypass/disabled refreshes that
    /// were triggered by scroll only, to avoid fighting the scroll handler).
    pub transform_offset: Option<f64>,
    /// Height the scrollbar spacer should be set to.
    pub spacer_height: f64,
    /// Pure row content height, before chrome/extra-height compensation.
    pub row_content_height: f64,
}

/// Result of [`crate::RowVirtualizer::plan_window`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowOutcome {
    Ready(WindowPlan),
    /// The render target reported inconsistent geometry (zero-height spacer
    /// track with a non-zero viewport), typically mid structural DOM rebuild.
    /// The caller should re-request the refresh on the next scheduler tick
    /// instead of computing with stale references.
    StaleGeometry,
}
