//! Caliper - A Rust-native pointer interaction tracking toolkit.
//!
//! Caliper turns raw pointer events into drag lifecycles. Hosts feed
//! platform events into [`PointerRelay`]s (usually through
//! [`mouse::PointerInputState`]), and a [`DragTracker`] bound to an element
//! watches its presses, applies a movement tolerance, and notifies
//! composing widgets through typed signals and overridable hooks.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use caliper::prelude::*;
//!
//! let document = Arc::new(PointerRelay::new());
//! let element = Arc::new(PointerRelay::new());
//! let scheduler = Arc::new(SharedTaskScheduler::new());
//!
//! let tracker = DragTracker::new(
//!     document.clone(),
//!     scheduler.clone(),
//!     DragTrackerConfig::default(),
//! );
//! tracker.attach(element.clone()).unwrap();
//!
//! tracker.signals().drag.connect(|event| {
//!     println!("dragging at {:?}", event.position);
//! });
//! ```
//!
//! [`PointerRelay`]: crate::relay::PointerRelay
//! [`DragTracker`]: crate::tracker::DragTracker

pub use caliper_core::*;

pub mod events;
pub mod geometry;
pub mod mouse;
pub mod prelude;
pub mod relay;
pub mod tracker;
