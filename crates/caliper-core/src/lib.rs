//! Core systems for Caliper.
//!
//! This crate provides the foundational components of the Caliper
//! interaction toolkit:
//!
//! - **Signal/Slot System**: Type-safe inter-object communication, including
//!   vetoable pre-notifications
//! - **Task Scheduler**: Cancellable one-shot deferred callbacks, drained by
//!   the host event loop
//!
//! Caliper assumes a single logical thread of execution: all dispatch
//! happens synchronously inside whatever handler the host event loop is
//! currently running. The types here are nonetheless `Send + Sync` so that
//! hosts with multi-threaded plumbing can share them safely.
//!
//! # Signal/Slot Example
//!
//! ```
//! use caliper_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Veto Example
//!
//! ```
//! use caliper_core::VetoSignal;
//!
//! let about_to_start = VetoSignal::<i32>::new();
//! about_to_start.connect(|&n| n >= 0); // negative values are refused
//!
//! assert!(about_to_start.emit(1));
//! assert!(!about_to_start.emit(-1));
//! ```
//!
//! # Scheduler Example
//!
//! ```
//! use caliper_core::SharedTaskScheduler;
//! use std::time::Duration;
//!
//! let scheduler = SharedTaskScheduler::new();
//! let id = scheduler.schedule_once(Duration::from_millis(100), || {
//!     println!("deferred work");
//! });
//!
//! // The host loop drains due tasks:
//! scheduler.process_ready();
//!
//! // ...or the task is cancelled before its deadline:
//! let _ = scheduler.cancel(id);
//! ```

mod error;
pub mod logging;
pub mod scheduler;
pub mod signal;

pub use error::{CoreError, Result, SchedulerError, SignalError};
pub use scheduler::{ScheduledTaskId, SharedTaskScheduler, TaskScheduler};
pub use signal::{ConnectionGuard, ConnectionId, Signal, VetoSignal};
