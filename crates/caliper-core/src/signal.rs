//! Signal/slot system for Caliper.
//!
//! This module provides a type-safe signal/slot mechanism for inter-object
//! communication. Signals are emitted by objects when their state changes,
//! and connected slots (callbacks) are invoked in response.
//!
//! Caliper's interaction components run on a single logical thread of
//! execution (the host UI event loop), so every slot is invoked directly on
//! the emitting thread, in registration order.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The main signal type for emitting notifications
//! - [`VetoSignal<Args>`] - A pre-notification signal whose slots may cancel
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Example
//!
//! ```
//! use caliper_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello, World!".to_string());
//!
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via
    /// [`Signal::disconnect`] or [`VetoSignal::disconnect`]. The ID remains
    /// valid until the connection is explicitly disconnected or the signal
    /// is dropped.
    pub struct ConnectionId;
}

/// Internal storage for a single connection.
struct Connection<Slot: ?Sized> {
    /// The slot function to invoke.
    slot: Box<Slot>,
}

/// Shared plumbing for [`Signal`] and [`VetoSignal`].
struct SignalBase<Slot: ?Sized> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Slot>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Slot: ?Sized> SignalBase<Slot> {
    fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    fn insert(&self, slot: Box<Slot>) -> ConnectionId {
        self.connections.lock().insert(Connection { slot })
    }

    fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// Signals are the core of the observer pattern in Caliper. When a signal is
/// emitted, all connected slots are invoked with the provided arguments.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for
///   signals with no arguments, or a tuple for multiple arguments.
///
/// # Related Types
///
/// - [`ConnectionId`] - Returned by [`connect`](Self::connect), used to disconnect
/// - [`ConnectionGuard`] - RAII-style connection that auto-disconnects on drop
/// - [`VetoSignal`] - Variant whose slots may cancel the notified action
pub struct Signal<Args> {
    base: SignalBase<dyn Fn(&Args) + Send + Sync>,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            base: SignalBase::new(),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use caliper_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.base.insert(Box::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.base.disconnect(id)
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.base.disconnect_all();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.base.connection_count()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing. This is useful during
    /// initialization or batch updates to prevent cascading notifications.
    pub fn set_blocked(&self, blocked: bool) {
        self.base.set_blocked(blocked);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.base.is_blocked()
    }

    /// Emit the signal, invoking all connected slots in registration order.
    ///
    /// If the signal is blocked, this does nothing.
    #[tracing::instrument(skip_all, target = "caliper_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "caliper_core::signal", "signal blocked, skipping emit");
            return;
        }

        let connections = self.base.connections.lock();
        tracing::trace!(
            target: "caliper_core::signal",
            connection_count = connections.len(),
            "emitting signal"
        );
        for (_, conn) in connections.iter() {
            (conn.slot)(&args);
        }
    }
}

/// A pre-notification signal whose slots may cancel the action being
/// announced.
///
/// Slots return `bool`: returning `false` vetoes the action. Emission stops
/// at the first veto and [`emit`](Self::emit) reports the outcome to the
/// emitter, which is expected to abandon the action when vetoed.
///
/// # Example
///
/// ```
/// use caliper_core::VetoSignal;
///
/// let about_to_close = VetoSignal::<String>::new();
/// about_to_close.connect(|name| name.as_str() != "scratch");
///
/// assert!(about_to_close.emit("notes".to_string()));
/// assert!(!about_to_close.emit("scratch".to_string()));
/// ```
pub struct VetoSignal<Args> {
    base: SignalBase<dyn Fn(&Args) -> bool + Send + Sync>,
}

impl<Args: Clone + Send + 'static> Default for VetoSignal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> VetoSignal<Args> {
    /// Create a new veto signal with no connections.
    pub fn new() -> Self {
        Self {
            base: SignalBase::new(),
        }
    }

    /// Connect a slot. The slot returns `false` to veto the action.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        self.base.insert(Box::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.base.disconnect(id)
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.base.disconnect_all();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.base.connection_count()
    }

    /// Block signal emission temporarily. A blocked veto signal reports
    /// "not vetoed" without consulting any slot.
    pub fn set_blocked(&self, blocked: bool) {
        self.base.set_blocked(blocked);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.base.is_blocked()
    }

    /// Emit the signal, invoking slots in registration order until one
    /// vetoes.
    ///
    /// Returns `false` if any slot returned `false` (remaining slots are
    /// not consulted), `true` otherwise.
    #[tracing::instrument(skip_all, target = "caliper_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> bool {
        if self.is_blocked() {
            tracing::trace!(target: "caliper_core::signal", "veto signal blocked, skipping emit");
            return true;
        }

        let connections = self.base.connections.lock();
        for (_, conn) in connections.iter() {
            if !(conn.slot)(&args) {
                tracing::trace!(target: "caliper_core::signal", "emission vetoed by slot");
                return false;
            }
        }
        true
    }
}

/// A connection guard that automatically disconnects when dropped.
///
/// This is useful for RAII-style connection management, ensuring connections
/// are cleaned up when the receiver goes out of scope. Created via
/// [`Signal::connect_scoped`].
///
/// # Example
///
/// ```
/// use caliper_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);  // counter = 42
/// }
/// signal.emit(43);  // Nothing happens - connection was dropped
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard<Args: Clone + Send + 'static> {
    signal: *const Signal<Args>,
    id: ConnectionId,
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Connect a slot with automatic disconnection when the guard is dropped.
    ///
    /// # Safety
    ///
    /// The returned guard holds a raw pointer to this signal. The signal must
    /// outlive the guard. Using `Arc<Signal<Args>>` is recommended for shared
    /// ownership.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            signal: self as *const Signal<Args>,
            id,
        }
    }
}

impl<Args: Clone + Send + 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        // SAFETY: The signal pointer is valid if the guard is used correctly.
        // The caller must ensure the signal outlives the guard.
        unsafe {
            if !self.signal.is_null() {
                let _ = (*self.signal).disconnect(self.id);
            }
        }
    }
}

// SAFETY: ConnectionGuard is Send + Sync because:
// - The raw pointer `signal` is only dereferenced in `drop()`.
// - Signal<Args> itself is Send + Sync (Mutex-protected connections).
// - The ConnectionId is a simple Copy type (slotmap key).
// - The guard's safety contract (documented in `connect_scoped`) requires
//   the Signal to outlive the guard, which the caller must ensure.
unsafe impl<Args: Clone + Send + 'static> Send for ConnectionGuard<Args> {}
unsafe impl<Args: Clone + Send + 'static> Sync for ConnectionGuard<Args> {}

static_assertions::assert_impl_all!(Signal<i32>: Send, Sync);
static_assertions::assert_impl_all!(VetoSignal<i32>: Send, Sync);
