use crate::position::PositionCache;
use crate::{RowRange, ScrollGeometry, VirtualMode, VirtualOptions, WindowOutcome, WindowPlan};

/// Inputs the window planner solicits from the plugin pipeline.
///
/// All methods default to a neutral response, so a bare `&NoHooks` is a valid
/// argument for hosts without plugins.
pub trait WindowHooks {
    /// Total additional height plugins contribute beyond base row height
    /// (e.g. expanded detail panels). Consulted in fixed-height mode only;
    /// variable-height positions already embed it.
    fn extra_height(&self) -> f64 {
        0.0
    }

    /// Additional height contributed by rows before `index`. Used by the
    /// fixed-mode start correction: the scroll offset already includes these
    /// heights, so the raw `offset / row_height` start overshoots.
    fn extra_height_before(&self, _index: usize) -> f64 {
        0.0
    }

    /// Lets plugins pull the start index backward (never forward), e.g. to
    /// keep a row with expanded content rendered while it scrolls out.
    fn adjust_start(&self, _start: usize, _scroll_offset: f64, _base_height: f64) -> Option<usize> {
        None
    }
}

/// Neutral hook set for hosts without a plugin pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl WindowHooks for NoHooks {}

/// Rounds a window start down to the nearest even index.
///
/// Rendered row surfaces are recycled into a fixed-parity pool where zebra
/// striping is assigned by pool-slot parity. Keeping the window start even
/// guarantees slot parity always matches data parity, so stripes never
/// flicker when the window shifts by an odd amount.
pub(crate) fn align_start_even(start: usize) -> usize {
    start - start % 2
}

pub(crate) fn plan(
    options: &VirtualOptions,
    positions: &PositionCache,
    geometry: ScrollGeometry,
    force: bool,
    hooks: &dyn WindowHooks,
) -> WindowOutcome {
    let count = options.count;
    let h = options.row_height.max(1.0);

    // Zero-height spacer track with a visible viewport means the target is
    // mid structural rebuild; computing against it would use stale geometry.
    if geometry.scrollbar_track_height == 0.0 && geometry.viewport_height > 0.0 {
        gdebug!(
            viewport = geometry.viewport_height,
            "window plan aborted: stale geometry"
        );
        return WindowOutcome::StaleGeometry;
    }

    let content_height = if options.variable_heights {
        positions.total_height()
    } else {
        count as f64 * h
    };

    if !options.enabled || count <= options.bypass_threshold {
        // Extra height only applies in fixed mode; variable positions
        // already include plugin heights.
        let extra = if options.variable_heights {
            0.0
        } else {
            hooks.extra_height()
        };
        return WindowOutcome::Ready(WindowPlan {
            mode: if options.enabled {
                VirtualMode::Bypass
            } else {
                VirtualMode::Disabled
            },
            range: RowRange::new(0, count),
            // Reset the transform on structural refreshes only; a scroll
            // refresh resetting it would fight the scroll handler.
            transform_offset: if force { Some(0.0) } else { None },
            spacer_height: content_height
                + geometry.chrome_delta
                + extra
                + geometry.h_scrollbar_compensation,
            row_content_height: content_height,
        });
    }

    let scroll = geometry.scroll_offset.max(0.0);
    let viewport = geometry.viewport_height.max(0.0);
    let overscan = options.overscan_rows;
    let min_rows = (viewport / h).ceil() as usize + overscan;

    let (start, start_real_offset) = if options.variable_heights {
        let mut start = positions.row_index_at_offset(scroll).unwrap_or(0);
        start = align_start_even(start);
        start = apply_adjustment(start, scroll, h, hooks);
        (start, positions.offset_of(start))
    } else {
        let mut start = corrected_fixed_start(scroll, h, options.start_correction_cap, hooks);
        // Clamp before aligning: an overshooting scroll with an odd count
        // must still land on an even start.
        start = align_start_even(start.min(count));
        start = apply_adjustment(start, scroll, h, hooks);
        (start, start as f64 * h + hooks.extra_height_before(start))
    };

    let end = if options.variable_heights {
        // Walk real heights until the viewport plus overscan is covered,
        // with a row-count floor so all-tiny-row datasets can't leave blank
        // space below the viewport.
        let target = scroll + viewport + overscan as f64 * h;
        let mut end = start;
        while end < count && positions.offset_of(end) < target {
            end += 1;
        }
        end.max(start.saturating_add(min_rows)).min(count)
    } else {
        start.saturating_add(min_rows).min(count)
    };

    let extra = if options.variable_heights {
        0.0
    } else {
        hooks.extra_height()
    };

    gtrace!(
        start,
        end,
        scroll,
        force,
        variable = options.variable_heights,
        "window plan"
    );

    WindowOutcome::Ready(WindowPlan {
        mode: VirtualMode::Windowed,
        range: RowRange::new(start, end),
        // Applied as a translation on the row container, never by resetting
        // native scroll, so old content stays in place until new content
        // finishes rendering.
        transform_offset: Some(-(scroll - start_real_offset)),
        spacer_height: content_height
            + geometry.chrome_delta
            + extra
            + geometry.h_scrollbar_compensation,
        row_content_height: content_height,
    })
}

/// Fixed-mode start index: `floor(scroll / h)`, then iteratively subtract the
/// extra height reported before that index until the result stabilizes or
/// the cap is hit. The scroll offset already includes plugin extra heights,
/// so the raw quotient overshoots whenever expanded rows sit above the
/// viewport. At the cap the best estimate so far wins; bounded imprecision
/// beats an unbounded loop.
fn corrected_fixed_start(scroll: f64, h: f64, cap: usize, hooks: &dyn WindowHooks) -> usize {
    let mut start = (scroll / h).floor() as usize;
    for _ in 0..cap {
        let extra = hooks.extra_height_before(start);
        let next = ((scroll - extra).max(0.0) / h).floor() as usize;
        if next == start {
            return start;
        }
        start = next;
    }
    start
}

fn apply_adjustment(start: usize, scroll: f64, h: f64, hooks: &dyn WindowHooks) -> usize {
    match hooks.adjust_start(start, scroll, h) {
        // Backward pulls only; plugins must not push rows out of view.
        Some(adjusted) if adjusted < start => align_start_even(adjusted),
        _ => start,
    }
}
