/// Configuration for [`crate::RowVirtualizer`].
///
/// Plain data, cheap to clone. Adapters typically tweak a few fields and call
/// `RowVirtualizer::set_options`, letting the virtualizer decide what needs
/// rebuilding.
#[derive(Clone, Debug, PartialEq)]
pub struct VirtualOptions {
    /// Number of rows in the processed row sequence.
    pub count: usize,

    /// Enables/disables windowing. When disabled, every row is planned for
    /// rendering (the widget degrades, it never fails).
    pub enabled: bool,

    /// Base/estimated row height in pixels. Fixed-height mode uses this for
    /// all rows; variable-height mode uses it for never-measured rows until
    /// a running measured average is available.
    pub row_height: f64,

    /// When true, the window planner consults the position cache instead of
    /// doing fixed-height arithmetic.
    pub variable_heights: bool,

    /// Datasets at or below this row count render fully (no windowing).
    pub bypass_threshold: usize,

    /// Rows rendered beyond the viewport. Sub-pixel transform offsets
    /// remove the need for large overscan buffers, so this stays small.
    pub overscan_rows: usize,

    /// Iteration cap for the fixed-mode start-index correction loop. The
    /// loop re-subtracts plugin extra height until the start index
    /// stabilizes; at the cap it keeps the best estimate found so far.
    pub start_correction_cap: usize,
}

impl VirtualOptions {
    pub fn new(row_height: f64) -> Self {
        Self {
            count: 0,
            enabled: true,
            row_height,
            variable_heights: false,
            bypass_threshold: 24,
            overscan_rows: 3,
            start_correction_cap: 8,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_variable_heights(mut self, variable_heights: bool) -> Self {
        self.variable_heights = variable_heights;
        self
    }

    pub fn with_bypass_threshold(mut self, bypass_threshold: usize) -> Self {
        self.bypass_threshold = bypass_threshold;
        self
    }

    pub fn with_overscan_rows(mut self, overscan_rows: usize) -> Self {
        self.overscan_rows = overscan_rows;
        self
    }

    pub fn with_start_correction_cap(mut self, cap: usize) -> Self {
        self.start_correction_cap = cap;
        self
    }
}
