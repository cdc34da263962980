use std::collections::HashSet;

use gridvirt::WindowHooks;

use crate::column::{ColumnsOutcome, GridColumn};
use crate::plugin::{GridPlugin, ScrollMetrics, StyleRegistry};

/// An explicit, ordered plugin chain.
///
/// The orchestrator folds each hook's result back into its own state
/// immediately after the call; plugins never share hidden mutable state with
/// the host or each other.
pub struct PluginPipeline<R, C, S> {
    plugins: Vec<Box<dyn GridPlugin<R, C, S>>>,
}

impl<R, C, S> Default for PluginPipeline<R, C, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C, S> PluginPipeline<R, C, S> {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Box<dyn GridPlugin<R, C, S>>) {
        pdebug!(name = plugin.name(), "register plugin");
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Chains the row sequence through every plugin in order.
    pub fn process_rows(&mut self, rows: Vec<R>) -> Vec<R> {
        self.plugins
            .iter_mut()
            .fold(rows, |rows, plugin| plugin.process_rows(rows))
    }

    /// Chains the visible columns through every plugin, keeping hidden
    /// columns out of the chain and re-appending them unchanged.
    ///
    /// When the chain's output shares no column key with the visible input,
    /// the output is treated as a wholesale replacement (e.g. a pivot
    /// transform): it stands alone and hidden columns are dropped.
    pub fn process_columns(&mut self, columns: &[C]) -> ColumnsOutcome<C>
    where
        C: GridColumn + Clone,
    {
        let visible: Vec<C> = columns.iter().filter(|c| !c.hidden()).cloned().collect();
        let hidden: Vec<C> = columns.iter().filter(|c| c.hidden()).cloned().collect();
        let input_keys: HashSet<String> = visible.iter().map(|c| c.key().to_owned()).collect();

        let chained = self
            .plugins
            .iter_mut()
            .fold(visible, |cols, plugin| plugin.process_columns(cols));

        let replaced =
            !chained.is_empty() && chained.iter().all(|c| !input_keys.contains(c.key()));
        if replaced {
            ptrace!(columns = chained.len(), "column chain replaced the model");
            return ColumnsOutcome::Replaced(chained);
        }

        let mut merged = chained;
        merged.extend(hidden);
        ColumnsOutcome::Merged(merged)
    }

    /// Invokes every plugin's `render_row`; any `true` claims the row.
    /// All plugins run regardless, so decorators later in the chain still
    /// see every row.
    pub fn render_row(&mut self, row: &R, surface: &mut S, index: usize) -> bool {
        let mut handled = false;
        for plugin in &mut self.plugins {
            handled |= plugin.render_row(row, surface, index);
        }
        handled
    }

    pub fn after_render(&mut self, styles: &mut StyleRegistry) {
        for plugin in &mut self.plugins {
            plugin.after_render(styles);
        }
    }

    pub fn on_scroll(&mut self, metrics: &ScrollMetrics) {
        for plugin in &mut self.plugins {
            plugin.on_scroll(metrics);
        }
    }

    pub fn on_scroll_render(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_scroll_render();
        }
    }

    /// First plugin with an answer wins; later plugins are not consulted.
    pub fn row_height(&self, row: &R, index: usize) -> Option<f64> {
        self.plugins
            .iter()
            .find_map(|plugin| plugin.row_height(row, index))
    }
}

impl<R, C, S> WindowHooks for PluginPipeline<R, C, S> {
    fn extra_height(&self) -> f64 {
        self.plugins.iter().map(|p| p.extra_height()).sum()
    }

    fn extra_height_before(&self, index: usize) -> f64 {
        self.plugins.iter().map(|p| p.extra_height_before(index)).sum()
    }

    fn adjust_start(&self, start: usize, scroll_offset: f64, base_height: f64) -> Option<usize> {
        self.plugins
            .iter()
            .filter_map(|p| p.adjust_virtual_start(start, scroll_offset, base_height))
            .min()
    }
}

impl<R, C, S> core::fmt::Debug for PluginPipeline<R, C, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PluginPipeline")
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}
