//! Prelude module for Caliper.
//!
//! This module re-exports the most commonly used types for convenient
//! importing:
//!
//! ```ignore
//! use caliper::prelude::*;
//! ```

// ============================================================================
// Signal/Slot System and Scheduling
// ============================================================================

pub use caliper_core::{ConnectionId, SharedTaskScheduler, Signal, VetoSignal};

// ============================================================================
// Geometry
// ============================================================================

pub use crate::geometry::{Point, Rect, Size};

// ============================================================================
// Pointer Events and Relays
// ============================================================================

pub use crate::events::{
    KeyboardModifiers, PointerButton, PointerEvent, PointerMoveEvent, PointerPressEvent,
    PointerReleaseEvent,
};
pub use crate::relay::{ElementId, HandlerId, PointerRelay};

// ============================================================================
// Drag Tracking
// ============================================================================

pub use crate::tracker::{
    AutoStart, ConstrainMode, DragHandler, DragTracker, DragTrackerConfig, TrackError,
};
