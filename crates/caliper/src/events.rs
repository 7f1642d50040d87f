//! Pointer event types.
//!
//! This module defines the events that flow through a [`PointerRelay`] and
//! into interaction components such as [`DragTracker`].
//!
//! Handlers receive events as `&mut`, so they can mark an event accepted,
//! suppress its default platform action (e.g. starting a text selection), or
//! stop further propagation.
//!
//! [`PointerRelay`]: crate::relay::PointerRelay
//! [`DragTracker`]: crate::tracker::DragTracker

use crate::geometry::Point;
use crate::relay::ElementId;

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held (Cmd on macOS).
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta/Super key is held (Windows key, Cmd on macOS).
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PointerButton {
    /// Primary button (usually left).
    Primary = 0,
    /// Secondary button (usually right).
    Secondary = 1,
    /// Middle button (scroll wheel click).
    Middle = 2,
    /// Additional button 1 (e.g., browser back).
    Button4 = 3,
    /// Additional button 2 (e.g., browser forward).
    Button5 = 4,
}

impl PointerButton {
    /// The bitfield mask for this button.
    #[inline]
    pub fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Common data for all pointer events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventBase {
    /// Whether the event has been accepted (handled).
    accepted: bool,
    /// Whether the default platform action has been suppressed.
    default_prevented: bool,
    /// Whether propagation to further handlers has been stopped.
    propagation_stopped: bool,
}

impl EventBase {
    /// Create a new event base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the event has been accepted.
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Accept the event, marking it as handled.
    pub fn accept(&mut self) {
        self.accepted = true;
    }

    /// Ignore the event, clearing the handled mark.
    pub fn ignore(&mut self) {
        self.accepted = false;
    }

    /// Suppress the default platform action for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Check if the default platform action has been suppressed.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop this event from reaching further handlers.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Check if propagation has been stopped.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Pointer press event.
#[derive(Debug, Clone, Copy)]
pub struct PointerPressEvent {
    /// Base event data.
    pub base: EventBase,
    /// The button that was pressed.
    pub button: PointerButton,
    /// Position in the shared tracking coordinate space.
    pub position: Point,
    /// The element the press actually landed on (a descendant of the
    /// element the listener is bound to, when delegation is in play).
    pub target: ElementId,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl PointerPressEvent {
    /// Create a new pointer press event.
    pub fn new(
        button: PointerButton,
        position: Point,
        target: ElementId,
        modifiers: KeyboardModifiers,
    ) -> Self {
        Self {
            base: EventBase::new(),
            button,
            position,
            target,
            modifiers,
        }
    }
}

/// Pointer move event.
#[derive(Debug, Clone, Copy)]
pub struct PointerMoveEvent {
    /// Base event data.
    pub base: EventBase,
    /// Position in the shared tracking coordinate space.
    pub position: Point,
    /// Pointer buttons currently held, as a bitfield.
    pub buttons: u8,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl PointerMoveEvent {
    /// Create a new pointer move event.
    pub fn new(position: Point, buttons: u8, modifiers: KeyboardModifiers) -> Self {
        Self {
            base: EventBase::new(),
            position,
            buttons,
            modifiers,
        }
    }

    /// Check if a specific button is pressed.
    pub fn is_button_pressed(&self, button: PointerButton) -> bool {
        (self.buttons & button.mask()) != 0
    }
}

/// Pointer release event.
#[derive(Debug, Clone, Copy)]
pub struct PointerReleaseEvent {
    /// Base event data.
    pub base: EventBase,
    /// The button that was released.
    pub button: PointerButton,
    /// Position in the shared tracking coordinate space.
    pub position: Point,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
}

impl PointerReleaseEvent {
    /// Create a new pointer release event.
    pub fn new(button: PointerButton, position: Point, modifiers: KeyboardModifiers) -> Self {
        Self {
            base: EventBase::new(),
            button,
            position,
            modifiers,
        }
    }
}

/// Selection-start event, sent when the platform is about to begin a text
/// selection at the pointer position.
///
/// Interaction components suppress this while a press cycle is open so the
/// drag does not also sweep out a selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectStartEvent {
    /// Base event data.
    pub base: EventBase,
    /// Position in the shared tracking coordinate space.
    pub position: Point,
}

impl SelectStartEvent {
    /// Create a new selection-start event.
    pub fn new(position: Point) -> Self {
        Self {
            base: EventBase::new(),
            position,
        }
    }
}

/// The kind of a pointer event, used for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// A button was pressed.
    Press,
    /// The pointer moved.
    Move,
    /// A button was released.
    Release,
    /// A text selection is about to begin.
    SelectStart,
}

/// A pointer event delivered through a relay.
#[derive(Debug, Clone, Copy)]
pub enum PointerEvent {
    /// A button was pressed.
    Press(PointerPressEvent),
    /// The pointer moved.
    Move(PointerMoveEvent),
    /// A button was released.
    Release(PointerReleaseEvent),
    /// A text selection is about to begin.
    SelectStart(SelectStartEvent),
}

impl PointerEvent {
    /// The kind of this event.
    pub fn kind(&self) -> PointerEventKind {
        match self {
            Self::Press(_) => PointerEventKind::Press,
            Self::Move(_) => PointerEventKind::Move,
            Self::Release(_) => PointerEventKind::Release,
            Self::SelectStart(_) => PointerEventKind::SelectStart,
        }
    }

    /// The event position in the shared tracking coordinate space.
    pub fn position(&self) -> Point {
        match self {
            Self::Press(e) => e.position,
            Self::Move(e) => e.position,
            Self::Release(e) => e.position,
            Self::SelectStart(e) => e.position,
        }
    }

    /// Shared access to the base event data.
    pub fn base(&self) -> &EventBase {
        match self {
            Self::Press(e) => &e.base,
            Self::Move(e) => &e.base,
            Self::Release(e) => &e.base,
            Self::SelectStart(e) => &e.base,
        }
    }

    /// Mutable access to the base event data.
    pub fn base_mut(&mut self) -> &mut EventBase {
        match self {
            Self::Press(e) => &mut e.base,
            Self::Move(e) => &mut e.base,
            Self::Release(e) => &mut e.base,
            Self::SelectStart(e) => &mut e.base,
        }
    }
}
