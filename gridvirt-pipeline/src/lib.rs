//! Plugin pipeline and render-phase scheduler on top of [`gridvirt`].
//!
//! [`gridvirt`] answers "which rows, at which offsets"; this crate owns the
//! orchestration around that answer:
//!
//! - [`GridPlugin`]: the hook contract independent grid extensions implement
//!   (row/column transforms, row rendering overrides, height management,
//!   scroll observation).
//! - [`PluginPipeline`]: an ordered chain that composes registered plugins
//!   at fixed pipeline stages.
//! - [`RenderScheduler`] and [`RenderPhase`]: coalesce bursts of render
//!   requests into one maximal unit of work per animation frame.
//! - [`GridController`]: drives a host-supplied [`RenderTarget`] through
//!   the full cycle of processing, window planning, rendering and debounced
//!   remeasurement.
//!
//! The crate is framework neutral. It never talks to a UI toolkit or an
//! event loop; the host forwards scroll events, animation frames and timer
//! ticks, and implements [`RenderTarget`] over its own widgets.

#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod column;
mod controller;
mod phase;
mod pipeline;
mod plugin;
mod target;


pub use column::{ColumnsOutcome, GridColumn};
pub use controller::{GridController, RowHeightFn, RowKeyFn};
pub use phase::{RenderPhase, RenderScheduler};
pub use pipeline::PluginPipeline;
pub use plugin::{GridPlugin, ScrollMetrics, StyleRegistry};
pub use target::RenderTarget;

pub use gridvirt;
