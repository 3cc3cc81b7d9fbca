#![forbid(unsafe_code)]

//! Lifecycle of the continuously rendered backdrop surface.
//!
//! ```text
//!            Attach            Visible
//! Detached ─────────▶ Attached ─────────▶ Rendering ◀──┐
//!                                            │         │ Visible
//!                                            │ Hidden  │
//!                                            ▼         │
//!                                          Paused ─────┘
//!
//! any ── Detach | Destroy ──▶ Destroyed (terminal)
//! ```
//!
//! Any other signal is ignored and leaves the state unchanged.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceLifecycleState {
    #[default]
    Detached,
    Attached,
    /// Frames are produced on the render thread.
    Rendering,
    /// Render thread parked until the host is visible again.
    Paused,
    Destroyed,
}

impl SurfaceLifecycleState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Attached => "attached",
            Self::Rendering => "rendering",
            Self::Paused => "paused",
            Self::Destroyed => "destroyed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Destroyed)
    }

    #[must_use]
    pub const fn produces_frames(self) -> bool {
        matches!(self, Self::Rendering)
    }

    /// State after `signal`, or `None` if the signal does not apply here.
    #[must_use]
    pub const fn on(self, signal: SurfaceSignal) -> Option<Self> {
        use SurfaceLifecycleState::*;
        use SurfaceSignal::*;
        match (self, signal) {
            (Destroyed, _) => None,
            (_, Detach | Destroy) => Some(Destroyed),
            (Detached, Attach) => Some(Attached),
            (Attached, Visible) | (Paused, Visible) => Some(Rendering),
            (Rendering, Hidden) => Some(Paused),
            _ => None,
        }
    }
}

impl fmt::Display for SurfaceLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host events forwarded to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceSignal {
    /// Inserted into the dialog's view tree.
    Attach,
    /// Host window became visible.
    Visible,
    /// Host window lost visibility.
    Hidden,
    /// Removed from the view tree.
    Detach,
    /// Dialog dismissed.
    Destroy,
}

impl SurfaceSignal {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Detach => "detach",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for SurfaceSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to deliver a lifecycle request to the render thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The render thread could not be started.
    Spawn(String),
    /// The render thread exited without acknowledging the request.
    RenderThreadLost { signal: SurfaceSignal },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(msg) => write!(f, "failed to start surface render thread: {msg}"),
            Self::RenderThreadLost { signal } => {
                write!(f, "render thread gone before acknowledging {signal}")
            }
        }
    }
}

impl std::error::Error for TransitionError {}
