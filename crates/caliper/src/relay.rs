//! Pointer event relays.
//!
//! A [`PointerRelay`] is the event surface of one tracked element, or of the
//! document-level coordinate space that pointer capture falls back to while
//! a press is in progress. Hosts own the relays, feed them events (usually
//! converted from the platform by [`crate::mouse::PointerInputState`]), and
//! hand them to interaction components as constructor parameters.
//!
//! There is deliberately no global document singleton: the document-level
//! relay is injected wherever it is needed, so tests can substitute doubles.
//!
//! # Usage
//!
//! ```
//! use caliper::events::{PointerEvent, PointerMoveEvent, KeyboardModifiers};
//! use caliper::geometry::Point;
//! use caliper::relay::PointerRelay;
//!
//! let relay = PointerRelay::new();
//!
//! let id = relay.on_move(|event| {
//!     println!("pointer at {:?}", event.position);
//! });
//!
//! let mut event = PointerEvent::Move(PointerMoveEvent::new(
//!     Point::new(10.0, 20.0),
//!     0,
//!     KeyboardModifiers::NONE,
//! ));
//! relay.dispatch(&mut event);
//!
//! relay.un(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::events::{
    PointerEvent, PointerEventKind, PointerMoveEvent, PointerPressEvent, PointerReleaseEvent,
    SelectStartEvent,
};
use crate::geometry::Rect;

/// An opaque identifier for a tracked element.
///
/// Identities are process-unique and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

impl ElementId {
    /// Allocate a fresh element identity.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

new_key_type! {
    /// A unique identifier for one handler subscription on a relay.
    pub struct HandlerId;
}

/// A boxed event handler.
type BoxedHandler = Box<dyn FnMut(&mut PointerEvent) + Send>;

/// Internal storage for one subscription.
struct HandlerEntry {
    /// The event kind this handler receives.
    kind: PointerEventKind,
    /// The handler, shared so dispatch can run it without holding the
    /// registry lock.
    handler: Arc<Mutex<BoxedHandler>>,
}

/// The event surface of a tracked element or of the document-level space.
///
/// Handlers are registered per event kind and invoked in registration order.
/// Dispatch does not hold the registry lock while running handlers, so a
/// handler may subscribe or unsubscribe (including itself) re-entrantly;
/// handlers removed mid-dispatch are skipped. Dispatch stops early once a
/// handler stops propagation.
pub struct PointerRelay {
    /// This element's identity.
    id: ElementId,
    /// All active subscriptions.
    handlers: Mutex<SlotMap<HandlerId, HandlerEntry>>,
    /// The element's on-screen region, when known.
    bounds: Mutex<Option<Rect>>,
}

impl Default for PointerRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerRelay {
    /// Create a relay with a fresh element identity.
    pub fn new() -> Self {
        Self {
            id: ElementId::next(),
            handlers: Mutex::new(SlotMap::with_key()),
            bounds: Mutex::new(None),
        }
    }

    /// This relay's element identity.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Set the element's on-screen region.
    pub fn set_bounds(&self, bounds: Rect) {
        *self.bounds.lock() = Some(bounds);
    }

    /// The element's on-screen region, if one has been set.
    pub fn bounds(&self) -> Option<Rect> {
        *self.bounds.lock()
    }

    /// Subscribe to press events.
    pub fn on_press<F>(&self, mut handler: F) -> HandlerId
    where
        F: FnMut(&mut PointerPressEvent) + Send + 'static,
    {
        self.subscribe(
            PointerEventKind::Press,
            Box::new(move |event| {
                if let PointerEvent::Press(e) = event {
                    handler(e);
                }
            }),
        )
    }

    /// Subscribe to move events.
    pub fn on_move<F>(&self, mut handler: F) -> HandlerId
    where
        F: FnMut(&mut PointerMoveEvent) + Send + 'static,
    {
        self.subscribe(
            PointerEventKind::Move,
            Box::new(move |event| {
                if let PointerEvent::Move(e) = event {
                    handler(e);
                }
            }),
        )
    }

    /// Subscribe to release events.
    pub fn on_release<F>(&self, mut handler: F) -> HandlerId
    where
        F: FnMut(&mut PointerReleaseEvent) + Send + 'static,
    {
        self.subscribe(
            PointerEventKind::Release,
            Box::new(move |event| {
                if let PointerEvent::Release(e) = event {
                    handler(e);
                }
            }),
        )
    }

    /// Subscribe to selection-start events.
    pub fn on_select_start<F>(&self, mut handler: F) -> HandlerId
    where
        F: FnMut(&mut SelectStartEvent) + Send + 'static,
    {
        self.subscribe(
            PointerEventKind::SelectStart,
            Box::new(move |event| {
                if let PointerEvent::SelectStart(e) = event {
                    handler(e);
                }
            }),
        )
    }

    fn subscribe(&self, kind: PointerEventKind, handler: BoxedHandler) -> HandlerId {
        self.handlers.lock().insert(HandlerEntry {
            kind,
            handler: Arc::new(Mutex::new(handler)),
        })
    }

    /// Remove a subscription.
    ///
    /// Returns `true` if the subscription was found and removed.
    pub fn un(&self, id: HandlerId) -> bool {
        self.handlers.lock().remove(id).is_some()
    }

    /// The number of subscriptions for an event kind.
    pub fn handler_count(&self, kind: PointerEventKind) -> usize {
        self.handlers
            .lock()
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .count()
    }

    /// Deliver an event to every handler subscribed to its kind.
    ///
    /// Handlers run in registration order without the registry lock held.
    /// Delivery stops as soon as a handler stops the event's propagation.
    #[tracing::instrument(skip_all, target = "caliper::relay", level = "trace")]
    pub fn dispatch(&self, event: &mut PointerEvent) {
        let kind = event.kind();
        let snapshot: Vec<(HandlerId, Arc<Mutex<BoxedHandler>>)> = self
            .handlers
            .lock()
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(id, entry)| (id, entry.handler.clone()))
            .collect();

        tracing::trace!(
            target: "caliper::relay",
            element = ?self.id,
            ?kind,
            handlers = snapshot.len(),
            "dispatching pointer event"
        );

        for (id, handler) in snapshot {
            if event.base().is_propagation_stopped() {
                break;
            }
            // Skip handlers unsubscribed by an earlier handler this dispatch.
            if !self.handlers.lock().contains_key(id) {
                continue;
            }
            (handler.lock())(event);
        }
    }
}

static_assertions::assert_impl_all!(PointerRelay: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KeyboardModifiers, PointerButton};
    use crate::geometry::Point;

    fn move_event(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Move(PointerMoveEvent::new(
            Point::new(x, y),
            0,
            KeyboardModifiers::NONE,
        ))
    }

    #[test]
    fn test_element_ids_are_unique() {
        let a = PointerRelay::new();
        let b = PointerRelay::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let relay = PointerRelay::new();
        let moves = Arc::new(Mutex::new(0));
        let presses = Arc::new(Mutex::new(0));

        let moves_clone = moves.clone();
        relay.on_move(move |_| *moves_clone.lock() += 1);
        let presses_clone = presses.clone();
        relay.on_press(move |_| *presses_clone.lock() += 1);

        relay.dispatch(&mut move_event(1.0, 1.0));
        relay.dispatch(&mut move_event(2.0, 2.0));
        relay.dispatch(&mut PointerEvent::Press(PointerPressEvent::new(
            PointerButton::Primary,
            Point::ZERO,
            relay.id(),
            KeyboardModifiers::NONE,
        )));

        assert_eq!(*moves.lock(), 2);
        assert_eq!(*presses.lock(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let relay = PointerRelay::new();
        let count = Arc::new(Mutex::new(0));

        let count_clone = count.clone();
        let id = relay.on_move(move |_| *count_clone.lock() += 1);
        assert_eq!(relay.handler_count(PointerEventKind::Move), 1);

        relay.dispatch(&mut move_event(1.0, 1.0));
        assert!(relay.un(id));
        assert!(!relay.un(id));
        relay.dispatch(&mut move_event(2.0, 2.0));

        assert_eq!(*count.lock(), 1);
        assert_eq!(relay.handler_count(PointerEventKind::Move), 0);
    }

    #[test]
    fn test_handler_can_unsubscribe_reentrantly() {
        let relay = Arc::new(PointerRelay::new());
        let later_calls = Arc::new(Mutex::new(0));

        // First handler removes the second during dispatch.
        let removed_id = Arc::new(Mutex::new(None::<HandlerId>));
        let relay_clone = relay.clone();
        let removed_clone = removed_id.clone();
        relay.on_move(move |_| {
            if let Some(id) = removed_clone.lock().take() {
                relay_clone.un(id);
            }
        });

        let later_clone = later_calls.clone();
        let id = relay.on_move(move |_| *later_clone.lock() += 1);
        *removed_id.lock() = Some(id);

        relay.dispatch(&mut move_event(1.0, 1.0));
        // The second handler was removed before its turn.
        assert_eq!(*later_calls.lock(), 0);

        relay.dispatch(&mut move_event(2.0, 2.0));
        assert_eq!(*later_calls.lock(), 0);
    }

    #[test]
    fn test_stop_propagation_halts_dispatch() {
        let relay = PointerRelay::new();
        let reached = Arc::new(Mutex::new(false));

        relay.on_move(|event| event.base.stop_propagation());
        let reached_clone = reached.clone();
        relay.on_move(move |_| *reached_clone.lock() = true);

        let mut event = move_event(1.0, 1.0);
        relay.dispatch(&mut event);

        assert!(event.base().is_propagation_stopped());
        assert!(!*reached.lock());
    }

    #[test]
    fn test_bounds() {
        let relay = PointerRelay::new();
        assert!(relay.bounds().is_none());

        relay.set_bounds(Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(relay.bounds(), Some(Rect::new(0.0, 0.0, 200.0, 200.0)));
    }
}
