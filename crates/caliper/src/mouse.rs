//! Mouse input handling and conversion from platform events.
//!
//! This module translates platform-level mouse events (from winit) into
//! Caliper pointer events suitable for [`PointerRelay::dispatch`].
//!
//! # Usage
//!
//! ```ignore
//! use caliper::mouse::PointerInputState;
//!
//! let mut input = PointerInputState::new();
//!
//! // When receiving a winit cursor moved event:
//! let mut event = input.handle_cursor_moved(position);
//! document_relay.dispatch(&mut event);
//!
//! // When receiving a winit mouse input event:
//! if let Some(mut event) = input.handle_button(state, button, element_id) {
//!     element_relay.dispatch(&mut event);
//! }
//! ```
//!
//! [`PointerRelay::dispatch`]: crate::relay::PointerRelay::dispatch

use winit::event::{ElementState, MouseButton as WinitMouseButton};
use winit::keyboard::ModifiersState;

use crate::events::{
    KeyboardModifiers, PointerButton, PointerEvent, PointerMoveEvent, PointerPressEvent,
    PointerReleaseEvent,
};
use crate::geometry::Point;
use crate::relay::ElementId;

/// Converts a winit mouse button to a Caliper PointerButton.
pub fn from_winit_pointer_button(button: WinitMouseButton) -> Option<PointerButton> {
    match button {
        WinitMouseButton::Left => Some(PointerButton::Primary),
        WinitMouseButton::Right => Some(PointerButton::Secondary),
        WinitMouseButton::Middle => Some(PointerButton::Middle),
        WinitMouseButton::Back => Some(PointerButton::Button4),
        WinitMouseButton::Forward => Some(PointerButton::Button5),
        WinitMouseButton::Other(_) => None, // Unknown button
    }
}

/// Converts winit modifiers to Caliper KeyboardModifiers.
pub fn from_winit_modifiers(state: ModifiersState) -> KeyboardModifiers {
    KeyboardModifiers {
        shift: state.shift_key(),
        control: state.control_key(),
        alt: state.alt_key(),
        meta: state.super_key(),
    }
}

/// Stateful converter from winit mouse events to Caliper pointer events.
///
/// Tracks the current pointer position, the pressed-button bitfield and the
/// keyboard modifier state, and stamps them onto the events it produces.
/// The bitfield matters: move events carry it, and interaction components
/// use it to detect a release that the platform lost.
#[derive(Debug)]
pub struct PointerInputState {
    /// Current pointer position.
    current_position: Point,
    /// Previous pointer position for delta calculations.
    previous_position: Point,
    /// Currently pressed buttons as a bitfield.
    pressed_buttons: u8,
    /// Current keyboard modifier state.
    modifiers: KeyboardModifiers,
}

impl Default for PointerInputState {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerInputState {
    /// Creates a new pointer input state.
    pub fn new() -> Self {
        Self {
            current_position: Point::ZERO,
            previous_position: Point::ZERO,
            pressed_buttons: 0,
            modifiers: KeyboardModifiers::NONE,
        }
    }

    /// Gets the current pointer position.
    pub fn position(&self) -> Point {
        self.current_position
    }

    /// Gets the delta movement since the last position update.
    pub fn delta(&self) -> Point {
        Point::new(
            self.current_position.x - self.previous_position.x,
            self.current_position.y - self.previous_position.y,
        )
    }

    /// Gets the currently pressed buttons as a bitfield.
    pub fn pressed_buttons(&self) -> u8 {
        self.pressed_buttons
    }

    /// Checks if a specific button is currently pressed.
    pub fn is_button_pressed(&self, button: PointerButton) -> bool {
        (self.pressed_buttons & button.mask()) != 0
    }

    /// Updates the keyboard modifier state.
    pub fn update_modifiers(&mut self, modifiers: KeyboardModifiers) {
        self.modifiers = modifiers;
    }

    /// Gets the current keyboard modifier state.
    pub fn modifiers(&self) -> KeyboardModifiers {
        self.modifiers
    }

    /// Handles a cursor moved event from winit.
    ///
    /// Returns a move event carrying the current button bitfield.
    pub fn handle_cursor_moved(&mut self, position: Point) -> PointerEvent {
        self.previous_position = self.current_position;
        self.current_position = position;

        PointerEvent::Move(PointerMoveEvent::new(
            position,
            self.pressed_buttons,
            self.modifiers,
        ))
    }

    /// Handles a mouse input (button press/release) event from winit.
    ///
    /// `target` is the element the event landed on, as hit-tested by the
    /// host. Returns `None` for buttons Caliper does not model.
    pub fn handle_button(
        &mut self,
        state: ElementState,
        button: WinitMouseButton,
        target: ElementId,
    ) -> Option<PointerEvent> {
        let button = from_winit_pointer_button(button)?;

        match state {
            ElementState::Pressed => {
                self.pressed_buttons |= button.mask();

                Some(PointerEvent::Press(PointerPressEvent::new(
                    button,
                    self.current_position,
                    target,
                    self.modifiers,
                )))
            }
            ElementState::Released => {
                self.pressed_buttons &= !button.mask();

                Some(PointerEvent::Release(PointerReleaseEvent::new(
                    button,
                    self.current_position,
                    self.modifiers,
                )))
            }
        }
    }

    /// Resets the input state.
    ///
    /// This clears the button bitfield and position history.
    pub fn reset(&mut self) {
        self.current_position = Point::ZERO;
        self.previous_position = Point::ZERO;
        self.pressed_buttons = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_button_conversion() {
        assert_eq!(
            from_winit_pointer_button(WinitMouseButton::Left),
            Some(PointerButton::Primary)
        );
        assert_eq!(
            from_winit_pointer_button(WinitMouseButton::Right),
            Some(PointerButton::Secondary)
        );
        assert_eq!(
            from_winit_pointer_button(WinitMouseButton::Middle),
            Some(PointerButton::Middle)
        );
        assert_eq!(
            from_winit_pointer_button(WinitMouseButton::Back),
            Some(PointerButton::Button4)
        );
        assert_eq!(
            from_winit_pointer_button(WinitMouseButton::Forward),
            Some(PointerButton::Button5)
        );
        assert_eq!(from_winit_pointer_button(WinitMouseButton::Other(99)), None);
    }

    #[test]
    fn test_button_state_tracking() {
        let mut input = PointerInputState::new();
        let target = ElementId::next();

        assert!(!input.is_button_pressed(PointerButton::Primary));

        let event = input.handle_button(ElementState::Pressed, WinitMouseButton::Left, target);
        assert!(matches!(event, Some(PointerEvent::Press(_))));
        assert!(input.is_button_pressed(PointerButton::Primary));

        input.handle_button(ElementState::Pressed, WinitMouseButton::Right, target);
        assert!(input.is_button_pressed(PointerButton::Primary));
        assert!(input.is_button_pressed(PointerButton::Secondary));

        let event = input.handle_button(ElementState::Released, WinitMouseButton::Left, target);
        assert!(matches!(event, Some(PointerEvent::Release(_))));
        assert!(!input.is_button_pressed(PointerButton::Primary));
        assert!(input.is_button_pressed(PointerButton::Secondary));
    }

    #[test]
    fn test_cursor_movement_carries_buttons() {
        let mut input = PointerInputState::new();
        let target = ElementId::next();

        input.handle_button(ElementState::Pressed, WinitMouseButton::Left, target);
        let event = input.handle_cursor_moved(Point::new(100.0, 200.0));

        let PointerEvent::Move(e) = event else {
            panic!("expected move event");
        };
        assert_eq!(e.position, Point::new(100.0, 200.0));
        assert!(e.is_button_pressed(PointerButton::Primary));
        assert_eq!(input.position(), Point::new(100.0, 200.0));

        input.handle_cursor_moved(Point::new(150.0, 250.0));
        assert_eq!(input.delta(), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_move_after_release_has_no_buttons() {
        let mut input = PointerInputState::new();
        let target = ElementId::next();

        input.handle_button(ElementState::Pressed, WinitMouseButton::Left, target);
        input.handle_button(ElementState::Released, WinitMouseButton::Left, target);

        let event = input.handle_cursor_moved(Point::new(5.0, 5.0));
        let PointerEvent::Move(e) = event else {
            panic!("expected move event");
        };
        assert_eq!(e.buttons, 0);
    }

    #[test]
    fn test_unknown_button_ignored() {
        let mut input = PointerInputState::new();
        let target = ElementId::next();

        let event = input.handle_button(ElementState::Pressed, WinitMouseButton::Other(7), target);
        assert!(event.is_none());
        assert_eq!(input.pressed_buttons(), 0);
    }

    #[test]
    fn test_modifier_conversion() {
        let state = ModifiersState::SHIFT | ModifiersState::CONTROL;
        let modifiers = from_winit_modifiers(state);
        assert!(modifiers.shift);
        assert!(modifiers.control);
        assert!(!modifiers.alt);
        assert!(!modifiers.meta);
    }

    #[test]
    fn test_reset() {
        let mut input = PointerInputState::new();
        let target = ElementId::next();

        input.handle_cursor_moved(Point::new(100.0, 100.0));
        input.handle_button(ElementState::Pressed, WinitMouseButton::Left, target);

        input.reset();

        assert_eq!(input.position(), Point::ZERO);
        assert_eq!(input.pressed_buttons(), 0);
    }
}
