use std::sync::Arc;

use gridvirt::{
    RowKey, RowProbe, RowRange, RowVirtualizer, VirtualOptions, VirtualState, WindowOutcome,
};

use crate::column::ColumnsOutcome;
use crate::phase::{RenderPhase, RenderScheduler};
use crate::pipeline::PluginPipeline;
use crate::plugin::{GridPlugin, ScrollMetrics, StyleRegistry};
use crate::target::RenderTarget;

/// Identity resolver for row handles; keys the durable height cache.
pub type RowKeyFn<R> = Arc<dyn Fn(&R) -> RowKey + Send + Sync>;

/// Host-supplied per-row height function (below plugin heights, above cached
/// measurements in the resolution order).
pub type RowHeightFn<R> = Arc<dyn Fn(&R, usize) -> Option<f64> + Send + Sync>;

struct IdleTask<T> {
    deadline_ms: u64,
    run: Box<dyn FnOnce(&mut T)>,
}

/// A framework-neutral controller that wraps a [`RowVirtualizer`] and drives
/// the full render pipeline: plugin chaining, phase scheduling, window
/// planning and debounced remeasurement.
///
/// This type does not own any UI loop. The host drives it by calling:
/// - mutators (`set_rows`, `set_columns`, `register_plugin`, ...) when its
///   model changes
/// - `on_scroll(offset, now_ms)` when the scroll position moves
/// - `on_animation_frame(now_ms)` whenever [`Self::needs_frame`] is set,
///   from its animation-frame primitive
/// - `tick(now_ms)` on a timer, for debounced post-scroll remeasurement and
///   idle-task timeout fallbacks
///
/// Everything runs on the host's single thread; phases execute in
/// increasing-scope order and at most once per frame.
pub struct GridController<T: RenderTarget> {
    target: T,
    virt: RowVirtualizer<RowKey>,
    plugins: PluginPipeline<T::Row, T::Column, T::Surface>,
    scheduler: RenderScheduler,
    styles: StyleRegistry,

    row_key: RowKeyFn<T::Row>,
    row_height_fn: Option<RowHeightFn<T::Row>>,

    source_rows: Vec<T::Row>,
    rows: Vec<T::Row>,
    columns: Vec<T::Column>,
    processed_columns: Vec<T::Column>,
    columns_replaced: bool,

    frame_requested: bool,
    scroll_pending: bool,
    last_metrics: ScrollMetrics,
    remeasure_delay_ms: u64,
    remeasure_at_ms: Option<u64>,
    idle_tasks: Vec<IdleTask<T>>,
    connected: bool,
}

impl<T: RenderTarget> GridController<T> {
    pub fn new(
        target: T,
        options: VirtualOptions,
        row_key: impl Fn(&T::Row) -> RowKey + Send + Sync + 'static,
    ) -> Self {
        Self {
            target,
            virt: RowVirtualizer::new(options),
            plugins: PluginPipeline::new(),
            scheduler: RenderScheduler::new(),
            styles: StyleRegistry::new(),
            row_key: Arc::new(row_key),
            row_height_fn: None,
            source_rows: Vec::new(),
            rows: Vec::new(),
            columns: Vec::new(),
            processed_columns: Vec::new(),
            columns_replaced: false,
            frame_requested: false,
            scroll_pending: false,
            last_metrics: ScrollMetrics::default(),
            remeasure_delay_ms: 150,
            remeasure_at_ms: None,
            idle_tasks: Vec::new(),
            connected: true,
        }
    }

    // --- model mutation -------------------------------------------------

    /// Replaces the source row sequence. Rows are externally owned handles;
    /// the controller never mutates row payloads.
    pub fn set_rows(&mut self, rows: Vec<T::Row>) {
        self.source_rows = rows;
        self.request_phase(RenderPhase::Rows, "rows replaced");
    }

    pub fn set_columns(&mut self, columns: Vec<T::Column>) {
        self.columns = columns;
        self.request_phase(RenderPhase::Columns, "columns replaced");
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn GridPlugin<T::Row, T::Column, T::Surface>>) {
        self.plugins.register(plugin);
        self.request_phase(RenderPhase::Full, "plugin registered");
    }

    pub fn set_row_height_fn(&mut self, f: Option<RowHeightFn<T::Row>>) {
        self.row_height_fn = f;
        self.request_phase(RenderPhase::Rows, "row height fn changed");
    }

    pub fn update_options(&mut self, f: impl FnOnce(&mut VirtualOptions)) {
        self.virt.update_options(f);
        self.request_phase(RenderPhase::Full, "options changed");
    }

    /// Out-of-band row resize from a plugin (expand/collapse) between
    /// refreshes.
    pub fn invalidate_row_height(&mut self, index: usize, new_height: Option<f64>) {
        self.virt.invalidate_row_height(index, new_height);
        self.request_phase(RenderPhase::Virtualization, "row height invalidated");
    }

    // --- scheduling -----------------------------------------------------

    pub fn request_phase(&mut self, phase: RenderPhase, reason: &'static str) {
        if !self.connected {
            return;
        }
        if self.scheduler.request_phase(phase, reason) {
            self.frame_requested = true;
        }
    }

    /// Whether the host must arrange an `on_animation_frame` call.
    pub fn needs_frame(&self) -> bool {
        self.frame_requested
    }

    pub fn is_ready(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Runs `f` once all currently pending render work has executed (or
    /// immediately when idle).
    pub fn when_ready(&mut self, f: impl FnOnce() + 'static) {
        self.scheduler.when_ready(f);
    }

    /// Defers `f` until the host reports idle time, with `deadline_ms` as a
    /// timeout fallback so the task never starves on a busy host.
    pub fn schedule_idle(&mut self, deadline_ms: u64, f: impl FnOnce(&mut T) + 'static) {
        self.idle_tasks.push(IdleTask {
            deadline_ms,
            run: Box::new(f),
        });
    }

    /// Host idle callback: runs all deferred tasks now.
    pub fn on_idle(&mut self) {
        for task in self.idle_tasks.drain(..) {
            (task.run)(&mut self.target);
        }
    }

    /// Disconnects the widget: aborts pending frames, waiters, idle work
    /// and debounce timers through one shared cancellation path.
    pub fn disconnect(&mut self) {
        pdebug!("disconnect");
        self.connected = false;
        self.scheduler.cancel();
        self.idle_tasks.clear();
        self.remeasure_at_ms = None;
        self.scroll_pending = false;
        self.frame_requested = false;
    }

    // --- events ---------------------------------------------------------

    /// Scroll input from the host. Coalesced into a Virtualization-phase
    /// frame; a pending structural phase strictly supersedes it.
    pub fn on_scroll(&mut self, offset: f64, now_ms: u64) {
        if !self.connected {
            return;
        }
        let geometry = self.target.geometry();
        self.last_metrics = ScrollMetrics {
            offset,
            delta: offset - self.last_metrics.offset,
            viewport_height: geometry.viewport_height,
        };
        self.scroll_pending = true;
        // Measuring mid-flight is wasted work; wait for a quiet period.
        self.remeasure_at_ms = Some(now_ms + self.remeasure_delay_ms);
        self.request_phase(RenderPhase::Virtualization, "scroll");
    }

    /// Executes the pending phase's stage list, once. Stages run in fixed
    /// order, gated by phase scope; a higher phase implies all lower-phase
    /// stages.
    pub fn on_animation_frame(&mut self, now_ms: u64) {
        if !self.connected {
            return;
        }
        self.frame_requested = false;
        let Some((phase, reason)) = self.scheduler.begin_frame() else {
            return;
        };
        pdebug!(?phase, reason, "frame");

        let structural = phase >= RenderPhase::Rows;
        if phase >= RenderPhase::Full {
            self.target.merge_config();
        }
        if phase >= RenderPhase::Columns {
            self.process_columns_stage();
        }
        if phase >= RenderPhase::Rows {
            self.process_rows_stage();
        }
        if phase >= RenderPhase::Columns {
            self.target.render_header(&self.processed_columns);
            self.target.update_layout(&self.processed_columns);
        }
        if phase >= RenderPhase::Virtualization {
            self.refresh_virtual_window(structural, false);
            self.remeasure_at_ms = Some(now_ms + self.remeasure_delay_ms);
        }
        self.target.apply_styles();

        if self.scroll_pending {
            let metrics = self.last_metrics;
            self.plugins.on_scroll(&metrics);
            self.plugins.on_scroll_render();
            self.scroll_pending = false;
        }

        self.scheduler.finish_frame();
        if !self.scheduler.is_idle() {
            // A hook re-requested work; run it in a fresh frame rather than
            // recursing, so this frame completes with consistent state.
            self.frame_requested = true;
        }
    }

    /// Timer tick: debounced post-scroll remeasurement and idle-task
    /// deadline fallback.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.connected {
            return;
        }
        if let Some(at) = self.remeasure_at_ms {
            if now_ms >= at {
                self.remeasure_at_ms = None;
                self.remeasure_rendered();
            }
        }
        if self.idle_tasks.iter().any(|t| t.deadline_ms <= now_ms) {
            let mut due = Vec::new();
            let mut rest = Vec::new();
            for task in self.idle_tasks.drain(..) {
                if task.deadline_ms <= now_ms {
                    due.push(task);
                } else {
                    rest.push(task);
                }
            }
            self.idle_tasks = rest;
            for task in due {
                (task.run)(&mut self.target);
            }
        }
    }

    // --- pipeline stages ------------------------------------------------

    fn process_columns_stage(&mut self) {
        match self.plugins.process_columns(&self.columns) {
            ColumnsOutcome::Merged(columns) => {
                self.processed_columns = columns;
                self.columns_replaced = false;
            }
            ColumnsOutcome::Replaced(columns) => {
                self.processed_columns = columns;
                self.columns_replaced = true;
            }
        }
    }

    fn process_rows_stage(&mut self) {
        self.rows = self.plugins.process_rows(self.source_rows.clone());
        let count = self.rows.len();
        let rows = &self.rows;
        let plugins = &self.plugins;
        let row_key = &self.row_key;
        let row_height_fn = self.row_height_fn.as_ref();
        self.virt.rebuild_rows(count, |i| {
            let row = &rows[i];
            RowProbe {
                key: row_key(row),
                plugin_height: plugins.row_height(row, i),
                provided_height: row_height_fn.and_then(|f| f(row, i)),
            }
        });
    }

    /// Recomputes and applies the virtual window. `force` marks a
    /// structural refresh: spacer height and row-count bookkeeping are
    /// reset and `after_render` hooks run; scroll-triggered refreshes only
    /// update the transform and the materialized range.
    pub fn refresh_virtual_window(&mut self, force: bool, skip_after_render: bool) {
        let geometry = self.target.geometry();
        let plan = match self.virt.plan_window(geometry, force, &self.plugins) {
            WindowOutcome::Ready(plan) => plan,
            WindowOutcome::StaleGeometry => {
                // Recompute on the next scheduler tick instead of rendering
                // against detached references.
                self.request_phase(RenderPhase::Virtualization, "stale geometry");
                return;
            }
        };

        if force {
            self.target.set_spacer_height(plan.spacer_height);
            self.target.set_row_count(self.rows.len());
        }
        if let Some(transform) = plan.transform_offset {
            self.target.set_transform_offset(transform);
        }

        let end = plan.range.end.min(self.rows.len());
        for index in plan.range.start..end {
            let handled =
                self.plugins
                    .render_row(&self.rows[index], self.target.surface_mut(index), index);
            if !handled {
                self.target.render_row(&self.rows[index], index);
            }
        }
        self.virt.set_range(plan.range);

        if force && !skip_after_render {
            self.plugins.after_render(&mut self.styles);
        }
    }

    /// Reads actual rendered heights for the materialized range and feeds
    /// them back into the position cache. Spacer sizing is refreshed only
    /// when a measurement materially changed.
    fn remeasure_rendered(&mut self) {
        let range = self.virt.range();
        let mut measurements = Vec::new();
        for index in range.start..range.end {
            if let Some(px) = self.target.measure_row(index) {
                measurements.push((index, px));
            }
        }
        if measurements.is_empty() {
            return;
        }
        let changed = self.virt.measure_rows(measurements);
        if changed {
            ptrace!(start = range.start, end = range.end, "measured heights changed");
            let geometry = self.target.geometry();
            let extra = if self.virt.options().variable_heights {
                0.0
            } else {
                gridvirt::WindowHooks::extra_height(&self.plugins)
            };
            self.target.set_spacer_height(
                self.virt.total_height()
                    + geometry.chrome_delta
                    + extra
                    + geometry.h_scrollbar_compensation,
            );
            self.request_phase(RenderPhase::Virtualization, "heights remeasured");
        }
    }

    // --- accessors ------------------------------------------------------

    pub fn range(&self) -> RowRange {
        self.virt.range()
    }

    pub fn row_height_of(&self, index: usize) -> f64 {
        self.virt.row_height_of(index)
    }

    pub fn state(&self) -> VirtualState {
        self.virt.state()
    }

    pub fn rows(&self) -> &[T::Row] {
        &self.rows
    }

    pub fn processed_columns(&self) -> &[T::Column] {
        &self.processed_columns
    }

    pub fn columns_replaced(&self) -> bool {
        self.columns_replaced
    }

    pub fn virtualizer(&self) -> &RowVirtualizer<RowKey> {
        &self.virt
    }

    pub fn virtualizer_mut(&mut self) -> &mut RowVirtualizer<RowKey> {
        &mut self.virt
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }
}
