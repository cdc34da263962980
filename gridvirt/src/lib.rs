//! A headless row-virtualization engine for tabular grids.
//!
//! This crate focuses on the core algorithms needed to render massive row
//! datasets at interactive frame rates: per-row offset/height bookkeeping,
//! fast offset → row-index lookup, windowed range planning under fixed and
//! variable row heights, and durable height measurement caching.
//!
//! It is UI-agnostic. A rendering layer is expected to provide:
//! - viewport geometry and scroll offsets
//! - rendered-height measurements (optional, for variable heights)
//! - plugin hook inputs via [`WindowHooks`]
//!
//! For the plugin pipeline contract and the render-phase scheduler that
//! drive this engine, see the `gridvirt-pipeline` crate.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod key;
mod options;
mod position;
mod state;
mod types;
mod virtualizer;
mod window;

#[cfg(test)]
mod tests;

pub use key::{RowIdentity, RowKey};
pub use options::VirtualOptions;
pub use position::{HEIGHT_JITTER_PX, PositionCache, PositionEntry};
pub use state::VirtualState;
pub use types::{RowRange, ScrollGeometry, VirtualMode, WindowOutcome, WindowPlan};
pub use virtualizer::{RowProbe, RowVirtualizer};
pub use window::{NoHooks, WindowHooks};
