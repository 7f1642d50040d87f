//! Press-to-drag tracking.
//!
//! [`DragTracker`] watches presses on a bound element and promotes them to a
//! drag once the pointer travels past a movement tolerance (or after an
//! optional auto-start delay). Composing widgets such as sliders, resizers
//! and window movers either connect to its lifecycle signals or override its
//! [`DragHandler`] hooks.
//!
//! A press cycle walks three phases:
//!
//! 1. **Pressed** - a primary press was accepted. The tracker records the
//!    start position and listens on the document-level relay for moves and
//!    the release.
//! 2. **Dragging** - the pointer left the tolerance box around the start
//!    position, or the auto-start delay elapsed. `dragstart` has fired.
//! 3. Back to idle on release, which always fires `mouseup` and `dragend`;
//!    `dragend` fires even when the cycle never left the pressed phase.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use caliper::relay::PointerRelay;
//! use caliper::tracker::{DragTracker, DragTrackerConfig};
//! use caliper_core::SharedTaskScheduler;
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
//! tracker.signals().dragstart.connect(|start| {
//!     println!("drag started at {:?}", start);
//! });
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use caliper_core::{ScheduledTaskId, SharedTaskScheduler, Signal, VetoSignal};

use crate::events::{
    PointerButton, PointerMoveEvent, PointerPressEvent, PointerReleaseEvent,
};
use crate::geometry::{Point, Rect};
use crate::relay::{ElementId, HandlerId, PointerRelay};

/// Default movement tolerance in pixels.
///
/// The pointer must travel further than this from the press origin, on
/// either axis, before the press becomes a drag.
pub const DEFAULT_TOLERANCE: f32 = 5.0;

/// Default auto-start delay when [`AutoStart::Default`] is configured.
pub const DEFAULT_AUTO_START_DELAY: Duration = Duration::from_millis(1000);

/// Tracker-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// The tracker is already attached to an element.
    #[error("tracker is already attached to an element")]
    AlreadyAttached,

    /// The tracker is not attached to an element.
    #[error("tracker is not attached to an element")]
    NotAttached,
}

/// Auto-start behavior for a press cycle.
///
/// When enabled, a drag is forced to start once the delay elapses, even if
/// the pointer never leaves the tolerance box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoStart {
    /// Drags start on movement only.
    #[default]
    Off,
    /// Force-start after [`DEFAULT_AUTO_START_DELAY`].
    Default,
    /// Force-start after the given delay.
    After(Duration),
}

impl AutoStart {
    /// The configured delay, or `None` when auto-start is off.
    pub fn delay(self) -> Option<Duration> {
        match self {
            Self::Off => None,
            Self::Default => Some(DEFAULT_AUTO_START_DELAY),
            Self::After(delay) => Some(delay),
        }
    }
}

/// Predicate selecting which descendant elements may begin a drag when
/// event delegation is configured.
pub type DelegateFilter = Arc<dyn Fn(ElementId) -> bool + Send + Sync>;

/// Configuration recognized by [`DragTracker`] at construction.
#[derive(Clone)]
pub struct DragTrackerConfig {
    /// Minimum movement from the press origin, in pixels on either axis,
    /// before a press becomes a drag.
    pub tolerance: f32,
    /// Optional forced drag start after a delay.
    pub auto_start: AutoStart,
    /// When set, only presses whose target satisfies the filter open a
    /// cycle, and that target becomes the drag target instead of the bound
    /// element.
    pub delegate: Option<DelegateFilter>,
}

impl Default for DragTrackerConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            auto_start: AutoStart::Off,
            delegate: None,
        }
    }
}

impl std::fmt::Debug for DragTrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragTrackerConfig")
            .field("tolerance", &self.tolerance)
            .field("auto_start", &self.auto_start)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

/// Overridable extension points for composing widgets.
///
/// All hooks default to no-ops. A widget that moves itself during a drag
/// implements `on_drag`; one that needs to refuse certain presses
/// implements `before_start`.
///
/// Hooks run with the tracker's handler slot locked; they may query the
/// tracker (`position`, `offset`, `is_active`) but must not replace the
/// handler from within themselves.
pub trait DragHandler: Send {
    /// Called after the `mousedown` notification, before any state changes.
    /// Return `false` to refuse the press.
    fn before_start(&mut self, _event: &PointerPressEvent) -> bool {
        true
    }

    /// Called when the drag starts, with the press origin.
    fn on_start(&mut self, _start: Point) {}

    /// Called for every move while the drag is active, between the
    /// `mousemove` and `drag` notifications.
    fn on_drag(&mut self, _event: &PointerMoveEvent) {}

    /// Called on release, between the `mouseup` and `dragend` notifications.
    fn on_end(&mut self, _event: &PointerReleaseEvent) {}
}

/// The default handler: every hook is a no-op.
struct NoopHandler;

impl DragHandler for NoopHandler {}

/// Constrain modes for coordinate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstrainMode {
    /// Clamp the reported point into the bound element's region.
    Point,
}

/// The tracker's lifecycle notifications.
///
/// Only `mousedown` is cancellable: a slot returning `false` refuses the
/// press and nothing else happens. The rest are plain notifications, in the
/// order they fire during a cycle: `mousedown`, then per qualifying move
/// `mousemove`/`drag` (preceded by `dragstart` for the first one), then
/// `mouseup` and `dragend` on release.
pub struct TrackerSignals {
    /// A press was received on the bound element. Cancellable.
    pub mousedown: VetoSignal<PointerPressEvent>,
    /// The press ended.
    pub mouseup: Signal<PointerReleaseEvent>,
    /// The pointer moved while the drag was active.
    pub mousemove: Signal<PointerMoveEvent>,
    /// The press became a drag; carries the press origin.
    pub dragstart: Signal<Point>,
    /// The cycle closed. Fires on every release, drag or not.
    pub dragend: Signal<PointerReleaseEvent>,
    /// A drag step; fires after `mousemove` for the same move event.
    pub drag: Signal<PointerMoveEvent>,
}

impl TrackerSignals {
    fn new() -> Self {
        Self {
            mousedown: VetoSignal::new(),
            mouseup: Signal::new(),
            mousemove: Signal::new(),
            dragstart: Signal::new(),
            dragend: Signal::new(),
            drag: Signal::new(),
        }
    }
}

/// Document-level subscriptions held while a cycle is open.
struct DocSubscriptions {
    motion: HandlerId,
    release: HandlerId,
    select: HandlerId,
}

/// State of one open press cycle.
struct Cycle {
    /// Where the press landed.
    start: Point,
    /// Last observed pointer position.
    last: Point,
    /// The element considered "being dragged".
    drag_target: ElementId,
    /// True once the drag has started.
    active: bool,
    /// Document-level listeners, removed exactly once when the cycle closes.
    doc_subs: DocSubscriptions,
    /// Pending auto-start task; cleared before any drag start and on release.
    auto_start_task: Option<ScheduledTaskId>,
    /// Bound element region, cached on first constrained read per cycle.
    constrain_cache: Option<Rect>,
}

/// The bound element and our press subscription on it.
struct Attachment {
    element: Arc<PointerRelay>,
    press_handler: HandlerId,
}

#[derive(Default)]
struct TrackerState {
    attachment: Option<Attachment>,
    cycle: Option<Cycle>,
}

struct TrackerShared {
    document: Arc<PointerRelay>,
    scheduler: Arc<SharedTaskScheduler>,
    config: DragTrackerConfig,
    signals: TrackerSignals,
    handler: Mutex<Box<dyn DragHandler>>,
    state: Mutex<TrackerState>,
}

impl TrackerShared {
    /// Element press listener. Runs the accept chain and opens a cycle.
    fn handle_press(shared: &Arc<Self>, event: &mut PointerPressEvent) {
        if event.button != PointerButton::Primary {
            return;
        }
        if let Some(filter) = &shared.config.delegate {
            if !filter(event.target) {
                return;
            }
        }

        // At most one cycle at a time; a press arriving while one is open
        // is dropped before any notification.
        let bound_id = {
            let state = shared.state.lock();
            if state.cycle.is_some() {
                return;
            }
            match &state.attachment {
                Some(attachment) => attachment.element.id(),
                None => return,
            }
        };

        if !shared.signals.mousedown.emit(*event) {
            tracing::trace!(target: "caliper::tracker", "press vetoed by mousedown slot");
            return;
        }
        if !shared.handler.lock().before_start(event) {
            tracing::trace!(target: "caliper::tracker", "press refused by before_start hook");
            return;
        }

        event.base.prevent_default();

        let weak = Arc::downgrade(shared);
        let motion = shared.document.on_move(move |e| {
            if let Some(shared) = weak.upgrade() {
                Self::handle_move(&shared, e);
            }
        });
        let weak = Arc::downgrade(shared);
        let release = shared.document.on_release(move |e| {
            if let Some(shared) = weak.upgrade() {
                Self::handle_release(&shared, e);
            }
        });
        let select = shared.document.on_select_start(|e| {
            // A drag in progress must not also sweep out a text selection.
            e.base.prevent_default();
            e.base.stop_propagation();
        });

        let auto_start_task = shared.config.auto_start.delay().map(|delay| {
            let weak = Arc::downgrade(shared);
            shared.scheduler.schedule_once(delay, move || {
                if let Some(shared) = weak.upgrade() {
                    shared.trigger_start(true);
                }
            })
        });

        tracing::debug!(
            target: "caliper::tracker",
            position = ?event.position,
            element = ?event.target,
            "press accepted, cycle open"
        );

        shared.state.lock().cycle = Some(Cycle {
            start: event.position,
            last: event.position,
            drag_target: if shared.config.delegate.is_some() {
                event.target
            } else {
                bound_id
            },
            active: false,
            doc_subs: DocSubscriptions {
                motion,
                release,
                select,
            },
            auto_start_task,
            constrain_cache: None,
        });
    }

    /// Document move listener for the open cycle.
    fn handle_move(shared: &Arc<Self>, event: &mut PointerMoveEvent) {
        enum MoveAction {
            Ignore,
            ImplicitRelease,
            Report { starting: bool },
        }

        let action = {
            let mut state = shared.state.lock();
            let Some(cycle) = state.cycle.as_mut() else {
                return;
            };

            if cycle.active && !event.is_button_pressed(PointerButton::Primary) {
                // The platform dropped the release. Close the cycle as if
                // one had arrived.
                MoveAction::ImplicitRelease
            } else {
                cycle.last = event.position;
                if cycle.active {
                    MoveAction::Report { starting: false }
                } else {
                    let dx = (event.position.x - cycle.start.x).abs();
                    let dy = (event.position.y - cycle.start.y).abs();
                    if dx > shared.config.tolerance || dy > shared.config.tolerance {
                        MoveAction::Report { starting: true }
                    } else {
                        MoveAction::Ignore
                    }
                }
            }
        };

        match action {
            MoveAction::ImplicitRelease => {
                event.base.prevent_default();
                tracing::debug!(
                    target: "caliper::tracker",
                    "move with no pressed primary button while active, treating as release"
                );
                let mut synthetic = PointerReleaseEvent::new(
                    PointerButton::Primary,
                    event.position,
                    event.modifiers,
                );
                Self::handle_release(shared, &mut synthetic);
            }
            MoveAction::Ignore => {
                event.base.prevent_default();
            }
            MoveAction::Report { starting } => {
                event.base.prevent_default();
                if starting {
                    shared.trigger_start(false);
                }
                // The move that crosses the tolerance is reported too.
                shared.signals.mousemove.emit(*event);
                shared.handler.lock().on_drag(event);
                shared.signals.drag.emit(*event);
            }
        }
    }

    /// Document release listener. Closes the cycle from any open phase.
    fn handle_release(shared: &Arc<Self>, event: &mut PointerReleaseEvent) {
        let cycle = shared.state.lock().cycle.take();
        let Some(cycle) = cycle else {
            return;
        };

        // Remove document listeners exactly once per cycle.
        shared.document.un(cycle.doc_subs.motion);
        shared.document.un(cycle.doc_subs.release);
        shared.document.un(cycle.doc_subs.select);

        event.base.prevent_default();

        if let Some(task) = cycle.auto_start_task {
            let _ = shared.scheduler.cancel(task);
        }

        tracing::debug!(
            target: "caliper::tracker",
            position = ?event.position,
            was_active = cycle.active,
            "press cycle closed"
        );

        shared.signals.mouseup.emit(*event);
        shared.handler.lock().on_end(event);
        // dragend fires whether or not the cycle ever became a drag.
        shared.signals.dragend.emit(*event);
    }

    /// Promote the open cycle to an active drag.
    ///
    /// `from_timer` is true on the auto-start path, where the one-shot task
    /// has already been retired by the scheduler and must not be cancelled
    /// from inside its own callback.
    fn trigger_start(&self, from_timer: bool) {
        let start = {
            let mut state = self.state.lock();
            let Some(cycle) = state.cycle.as_mut() else {
                return;
            };
            if cycle.active {
                return;
            }
            if let Some(task) = cycle.auto_start_task.take() {
                if !from_timer {
                    let _ = self.scheduler.cancel(task);
                }
            }
            cycle.active = true;
            cycle.start
        };

        tracing::debug!(target: "caliper::tracker", ?start, from_timer, "drag started");

        self.handler.lock().on_start(start);
        self.signals.dragstart.emit(start);
    }

    /// Position query over the locked state. Returns `(start, position)`.
    fn query_locked(
        state: &mut TrackerState,
        constrain: Option<ConstrainMode>,
    ) -> Option<(Point, Point)> {
        let TrackerState { attachment, cycle } = state;
        let cycle = cycle.as_mut()?;

        let position = match constrain {
            None => cycle.last,
            Some(ConstrainMode::Point) => {
                let bounds = match cycle.constrain_cache {
                    Some(bounds) => Some(bounds),
                    None => {
                        let bounds = attachment.as_ref().and_then(|a| a.element.bounds());
                        cycle.constrain_cache = bounds;
                        bounds
                    }
                };
                match bounds {
                    Some(bounds) => bounds.clamp_point(cycle.last),
                    // The bound element has no region to constrain into.
                    None => cycle.last,
                }
            }
        };

        Some((cycle.start, position))
    }
}

/// Tracks presses on a bound element and promotes them to drags.
///
/// See the [module documentation](self) for the lifecycle. One tracker
/// serves one element; construct it with the document-level relay and the
/// shared scheduler of the host, then [`attach`](Self::attach) the element.
///
/// Dropping the tracker removes every listener it installed.
pub struct DragTracker {
    shared: Arc<TrackerShared>,
}

impl DragTracker {
    /// Create a tracker with no-op hooks.
    ///
    /// `document` is the document-level relay that observes pointer events
    /// everywhere while a cycle is open; `scheduler` runs the optional
    /// auto-start delay.
    pub fn new(
        document: Arc<PointerRelay>,
        scheduler: Arc<SharedTaskScheduler>,
        config: DragTrackerConfig,
    ) -> Self {
        Self::with_handler(document, scheduler, config, NoopHandler)
    }

    /// Create a tracker with custom hooks.
    pub fn with_handler<H>(
        document: Arc<PointerRelay>,
        scheduler: Arc<SharedTaskScheduler>,
        config: DragTrackerConfig,
        handler: H,
    ) -> Self
    where
        H: DragHandler + 'static,
    {
        Self {
            shared: Arc::new(TrackerShared {
                document,
                scheduler,
                config,
                signals: TrackerSignals::new(),
                handler: Mutex::new(Box::new(handler)),
                state: Mutex::new(TrackerState::default()),
            }),
        }
    }

    /// Replace the hook handler.
    pub fn set_handler<H>(&self, handler: H)
    where
        H: DragHandler + 'static,
    {
        *self.shared.handler.lock() = Box::new(handler);
    }

    /// The tracker's lifecycle notifications.
    pub fn signals(&self) -> &TrackerSignals {
        &self.shared.signals
    }

    /// The configuration this tracker was constructed with.
    pub fn config(&self) -> &DragTrackerConfig {
        &self.shared.config
    }

    /// Bind the tracker to an element: presses on this relay may open a
    /// press cycle from now on.
    pub fn attach(&self, element: Arc<PointerRelay>) -> Result<(), TrackError> {
        let mut state = self.shared.state.lock();
        if state.attachment.is_some() {
            return Err(TrackError::AlreadyAttached);
        }

        let weak = Arc::downgrade(&self.shared);
        let press_handler = element.on_press(move |event| {
            if let Some(shared) = weak.upgrade() {
                TrackerShared::handle_press(&shared, event);
            }
        });

        tracing::debug!(target: "caliper::tracker", element = ?element.id(), "tracker attached");

        state.attachment = Some(Attachment {
            element,
            press_handler,
        });
        Ok(())
    }

    /// Unbind the tracker from its element.
    ///
    /// An open cycle is left to finish through the document listeners; no
    /// new cycle can begin afterwards.
    pub fn detach(&self) -> Result<(), TrackError> {
        let attachment = self.shared.state.lock().attachment.take();
        let Some(attachment) = attachment else {
            return Err(TrackError::NotAttached);
        };
        attachment.element.un(attachment.press_handler);
        tracing::debug!(
            target: "caliper::tracker",
            element = ?attachment.element.id(),
            "tracker detached"
        );
        Ok(())
    }

    /// Whether the tracker is currently bound to an element.
    pub fn is_attached(&self) -> bool {
        self.shared.state.lock().attachment.is_some()
    }

    /// True only between drag start and release.
    pub fn is_active(&self) -> bool {
        self.shared
            .state
            .lock()
            .cycle
            .as_ref()
            .is_some_and(|cycle| cycle.active)
    }

    /// The element being dragged: the delegate target when delegation is
    /// configured, the bound element otherwise. `None` outside a cycle.
    pub fn drag_target(&self) -> Option<ElementId> {
        self.shared
            .state
            .lock()
            .cycle
            .as_ref()
            .map(|cycle| cycle.drag_target)
    }

    /// The last known pointer position, optionally clamped into the bound
    /// element's region. `None` outside a cycle.
    ///
    /// The region is read once per cycle on the first constrained query and
    /// cached until release.
    pub fn position(&self, constrain: Option<ConstrainMode>) -> Option<Point> {
        let mut state = self.shared.state.lock();
        TrackerShared::query_locked(&mut state, constrain).map(|(_, position)| position)
    }

    /// The vector from the current (possibly clamped) position back to the
    /// press origin: `start - current`, per axis. `None` outside a cycle.
    pub fn offset(&self, constrain: Option<ConstrainMode>) -> Option<Point> {
        let mut state = self.shared.state.lock();
        TrackerShared::query_locked(&mut state, constrain)
            .map(|(start, position)| Point::new(start.x - position.x, start.y - position.y))
    }
}

impl Drop for DragTracker {
    fn drop(&mut self) {
        let (attachment, cycle) = {
            let mut state = self.shared.state.lock();
            (state.attachment.take(), state.cycle.take())
        };
        if let Some(cycle) = cycle {
            self.shared.document.un(cycle.doc_subs.motion);
            self.shared.document.un(cycle.doc_subs.release);
            self.shared.document.un(cycle.doc_subs.select);
            if let Some(task) = cycle.auto_start_task {
                let _ = self.shared.scheduler.cancel(task);
            }
        }
        if let Some(attachment) = attachment {
            attachment.element.un(attachment.press_handler);
        }
    }
}

static_assertions::assert_impl_all!(DragTracker: Send, Sync);
