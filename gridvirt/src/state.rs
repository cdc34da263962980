/// A lightweight, serializable snapshot of the virtualization state.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`,
/// which is useful for debugging dumps and for restoring UI state across
/// sessions without coupling the engine to any specific UI framework.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualState {
    pub enabled: bool,
    /// Base/estimated row height used for fixed-mode math and as the
    /// fallback estimate for never-measured rows.
    pub row_height: f64,
    pub bypass_threshold: usize,
    /// Start of the currently materialized row range (inclusive).
    pub start: usize,
    /// End of the currently materialized row range (exclusive).
    pub end: usize,
    pub variable_heights: bool,
    /// Running average of measured heights, excluding plugin-managed rows.
    pub average_height: f64,
    pub measured_count: usize,
}
