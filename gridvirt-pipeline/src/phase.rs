/// Severity of pending render work, ordered by increasing scope. A higher
/// phase implies all lower-phase work: executing `Full` runs the column and
/// row stages, the virtual-window refresh, and the style pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderPhase {
    /// Refresh style state only.
    Style,
    /// Recompute the virtual window (scroll-level refresh).
    Virtualization,
    /// Re-run row processing, then everything below.
    Rows,
    /// Re-run column processing, then everything below.
    Columns,
    /// Merge configuration, then everything below.
    Full,
}

/// Coalesces render requests from property setters, scroll events, resize
/// observers and plugins into one unit of work per animation frame.
///
/// A small explicit state machine: idle, or frame-scheduled with a single
/// pending slot holding the maximum-scope request seen so far. Requests
/// arriving before the frame fires merge by `max`; the pending phase is
/// consumed exactly once per frame.
pub struct RenderScheduler {
    pending: Option<(RenderPhase, &'static str)>,
    waiters: Vec<Box<dyn FnOnce()>>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self {
            pending: None,
            waiters: Vec::new(),
        }
    }

    /// Records a render request. Returns `true` when the scheduler moved
    /// from idle to frame-scheduled, i.e. the host must arrange an
    /// animation-frame callback. Requests made while a frame is already
    /// scheduled coalesce into the pending slot and return `false`.
    pub fn request_phase(&mut self, phase: RenderPhase, reason: &'static str) -> bool {
        match self.pending {
            Some((current, _)) => {
                if phase > current {
                    ptrace!(?phase, ?current, reason, "phase absorbed pending request");
                    self.pending = Some((phase, reason));
                } else {
                    ptrace!(?phase, ?current, reason, "phase coalesced into pending request");
                }
                false
            }
            None => {
                ptrace!(?phase, reason, "phase scheduled");
                self.pending = Some((phase, reason));
                true
            }
        }
    }

    pub fn pending_phase(&self) -> Option<RenderPhase> {
        self.pending.map(|(phase, _)| phase)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Consumes the pending phase at frame start. Hooks that call
    /// [`Self::request_phase`] during the frame start a fresh pending slot
    /// (and a fresh frame) instead of recursing into the current one.
    pub fn begin_frame(&mut self) -> Option<(RenderPhase, &'static str)> {
        self.pending.take()
    }

    /// Runs `f` immediately when idle, otherwise queues it until the frame
    /// that drains the pending work completes.
    pub fn when_ready(&mut self, f: impl FnOnce() + 'static) {
        if self.pending.is_none() {
            f();
        } else {
            self.waiters.push(Box::new(f));
        }
    }

    /// Flushes `when_ready` waiters after frame work, unless a hook
    /// re-requested a phase during the frame (waiters then hold for the
    /// follow-up frame).
    pub fn finish_frame(&mut self) {
        if self.pending.is_none() {
            for waiter in self.waiters.drain(..) {
                waiter();
            }
        }
    }

    /// Drops all pending work and waiters. Used when the widget
    /// disconnects; no partial cleanup paths.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.waiters.clear();
    }
}

impl core::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("pending", &self.pending)
            .field("waiters", &self.waiters.len())
            .finish()
    }
}
