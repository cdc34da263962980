use gridvirt::ScrollGeometry;

use crate::column::GridColumn;

/// The rendering collaborator the controller drives.
///
/// The pipeline never creates or diffs visual elements itself; it tells the
/// target which rows to materialize, how tall the scrollbar spacer is, and
/// where to translate the row container. The target owns surface recycling
/// and all layout/theming concerns.
pub trait RenderTarget {
    /// Externally owned row handle. Cloning must be cheap (a reference or
    /// id, not a deep copy of row data).
    type Row: Clone;
    type Column: GridColumn + Clone;
    /// Per-row render surface handed to plugin `render_row` hooks.
    type Surface;

    /// Snapshot of the current scroll geometry. Must be cheap; it is read
    /// once per refresh.
    fn geometry(&self) -> ScrollGeometry;

    /// Sizes the scrollbar spacer that drives native scrollbar proportions.
    fn set_spacer_height(&mut self, px: f64);

    /// Translates the rendered row container. Never implemented by resetting
    /// native scroll: old content must stay visibly in place until new
    /// content finishes rendering.
    fn set_transform_offset(&mut self, px: f64);

    /// Total processed row count, for accessibility-style bookkeeping.
    /// Called on structural refreshes only.
    fn set_row_count(&mut self, count: usize);

    /// The recycled surface for the row at `index`.
    fn surface_mut(&mut self, index: usize) -> &mut Self::Surface;

    /// Default row rendering, used when no plugin claimed the row.
    fn render_row(&mut self, row: &Self::Row, index: usize);

    fn render_header(&mut self, columns: &[Self::Column]);

    /// Updates the column layout template (track sizing etc.).
    fn update_layout(&mut self, columns: &[Self::Column]);

    /// Actual rendered height of the materialized row at `index`, if the
    /// surface is attached and measurable.
    fn measure_row(&self, index: usize) -> Option<f64>;

    /// Merge configuration sources. Configuration shape is an external
    /// concern; the default does nothing.
    fn merge_config(&mut self) {}

    /// Style-phase work (refresh computed style state). Default does
    /// nothing.
    fn apply_styles(&mut self) {}
}
