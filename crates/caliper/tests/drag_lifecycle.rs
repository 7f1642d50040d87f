//! Integration tests for the full press-to-drag lifecycle, driven through
//! the winit conversion layer and pointer relays the way a host would.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use winit::event::{ElementState, MouseButton};

use caliper::events::{PointerEvent, PointerEventKind};
use caliper::geometry::{Point, Rect};
use caliper::mouse::PointerInputState;
use caliper::relay::PointerRelay;
use caliper::tracker::{AutoStart, ConstrainMode, DragTracker, DragTrackerConfig};
use caliper_core::SharedTaskScheduler;

/// A host double: one element, the document space, the scheduler, and the
/// winit-facing input state.
struct TestRig {
    document: Arc<PointerRelay>,
    element: Arc<PointerRelay>,
    scheduler: Arc<SharedTaskScheduler>,
    tracker: DragTracker,
    input: PointerInputState,
    log: Arc<Mutex<Vec<String>>>,
}

impl TestRig {
    fn new(config: DragTrackerConfig) -> Self {
        // Honor RUST_LOG when debugging a failing run.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let document = Arc::new(PointerRelay::new());
        let element = Arc::new(PointerRelay::new());
        let scheduler = Arc::new(SharedTaskScheduler::new());
        let tracker = DragTracker::new(document.clone(), scheduler.clone(), config);
        tracker.attach(element.clone()).unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let signals = tracker.signals();
        {
            let log = log.clone();
            signals.mousedown.connect(move |_| {
                log.lock().push("mousedown".to_string());
                true
            });
        }
        {
            let log = log.clone();
            signals
                .dragstart
                .connect(move |start| log.lock().push(format!("dragstart@{},{}", start.x, start.y)));
        }
        for (name, signal) in [("mousemove", &signals.mousemove), ("drag", &signals.drag)] {
            let log = log.clone();
            signal.connect(move |_| log.lock().push(name.to_string()));
        }
        for (name, signal) in [("mouseup", &signals.mouseup), ("dragend", &signals.dragend)] {
            let log = log.clone();
            signal.connect(move |_| log.lock().push(name.to_string()));
        }

        Self {
            document,
            element,
            scheduler,
            tracker,
            input: PointerInputState::new(),
            log,
        }
    }

    /// Move the cursor; the host forwards moves to the document space.
    fn cursor_moved(&mut self, x: f32, y: f32) {
        let mut event = self.input.handle_cursor_moved(Point::new(x, y));
        self.document.dispatch(&mut event);
    }

    /// Press the primary button over the tracked element.
    fn press(&mut self) {
        let mut event = self
            .input
            .handle_button(ElementState::Pressed, MouseButton::Left, self.element.id())
            .unwrap();
        self.element.dispatch(&mut event);
    }

    /// Release the primary button; the host forwards releases to the
    /// document space.
    fn release(&mut self) {
        let mut event = self
            .input
            .handle_button(ElementState::Released, MouseButton::Left, self.element.id())
            .unwrap();
        self.document.dispatch(&mut event);
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn doc_subscriptions(&self) -> usize {
        self.document.handler_count(PointerEventKind::Move)
            + self.document.handler_count(PointerEventKind::Release)
            + self.document.handler_count(PointerEventKind::SelectStart)
    }
}

#[test]
fn full_drag_lifecycle() {
    let mut rig = TestRig::new(DragTrackerConfig::default());

    rig.cursor_moved(100.0, 100.0);
    rig.press();
    rig.cursor_moved(103.0, 100.0); // within tolerance, ignored
    rig.cursor_moved(110.0, 100.0); // crosses tolerance
    rig.cursor_moved(130.0, 85.0);

    assert!(rig.tracker.is_active());
    assert_eq!(rig.tracker.offset(None), Some(Point::new(-30.0, 15.0)));

    rig.release();

    assert_eq!(
        rig.log(),
        vec![
            "mousedown",
            "dragstart@100,100",
            "mousemove",
            "drag",
            "mousemove",
            "drag",
            "mouseup",
            "dragend",
        ]
    );
    assert!(!rig.tracker.is_active());
    assert_eq!(rig.doc_subscriptions(), 0);
}

#[test]
fn click_without_movement_still_closes_with_dragend() {
    let mut rig = TestRig::new(DragTrackerConfig::default());

    rig.cursor_moved(50.0, 50.0);
    rig.press();
    rig.release();

    assert_eq!(rig.log(), vec!["mousedown", "mouseup", "dragend"]);
}

#[test]
fn stray_release_after_cycle_is_silent() {
    let mut rig = TestRig::new(DragTrackerConfig::default());

    rig.cursor_moved(0.0, 0.0);
    rig.press();
    rig.cursor_moved(20.0, 0.0);
    rig.release();

    let after_first = rig.log();

    // The host delivers another release; nothing is listening anymore.
    let event = rig
        .input
        .handle_button(ElementState::Pressed, MouseButton::Left, rig.element.id())
        .unwrap();
    drop(event); // the press never reaches the element (e.g. another window)
    let mut event = rig
        .input
        .handle_button(ElementState::Released, MouseButton::Left, rig.element.id())
        .unwrap();
    rig.document.dispatch(&mut event);

    assert_eq!(rig.log(), after_first);
}

#[test]
fn auto_start_drives_drag_from_scheduler() {
    let mut rig = TestRig::new(DragTrackerConfig {
        auto_start: AutoStart::After(Duration::from_millis(20)),
        ..Default::default()
    });

    rig.cursor_moved(40.0, 60.0);
    rig.press();
    assert_eq!(rig.scheduler.active_count(), 1);

    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(rig.scheduler.process_ready(), 1);

    assert!(rig.tracker.is_active());
    assert_eq!(rig.log(), vec!["mousedown", "dragstart@40,60"]);
    assert_eq!(rig.scheduler.active_count(), 0);

    rig.release();
    assert_eq!(
        rig.log().last().map(String::as_str),
        Some("dragend")
    );
}

#[test]
fn constrained_reads_clamp_into_element_bounds() {
    let mut rig = TestRig::new(DragTrackerConfig::default());
    rig.element.set_bounds(Rect::new(0.0, 0.0, 200.0, 200.0));

    rig.cursor_moved(100.0, 100.0);
    rig.press();
    rig.cursor_moved(250.0, 50.0);

    assert_eq!(rig.tracker.position(None), Some(Point::new(250.0, 50.0)));
    assert_eq!(
        rig.tracker.position(Some(ConstrainMode::Point)),
        Some(Point::new(200.0, 50.0))
    );

    rig.release();
    assert_eq!(rig.tracker.position(None), None);
}

#[test]
fn lost_release_is_recovered_from_button_state() {
    let mut rig = TestRig::new(DragTrackerConfig::default());

    rig.cursor_moved(0.0, 0.0);
    rig.press();
    rig.cursor_moved(20.0, 0.0);
    assert!(rig.tracker.is_active());

    // The release happens where the host cannot see it: the button state
    // clears, but no release event is ever dispatched.
    let _undelivered = rig
        .input
        .handle_button(ElementState::Released, MouseButton::Left, rig.element.id())
        .unwrap();

    // The next observed move carries an empty button bitfield, which the
    // tracker treats as the release.
    rig.cursor_moved(25.0, 0.0);

    assert!(!rig.tracker.is_active());
    assert_eq!(rig.doc_subscriptions(), 0);
    let log = rig.log();
    assert_eq!(&log[log.len() - 2..], ["mouseup", "dragend"]);
}

#[test]
fn secondary_button_never_opens_a_cycle() {
    let mut rig = TestRig::new(DragTrackerConfig::default());

    rig.cursor_moved(10.0, 10.0);
    let mut event = rig
        .input
        .handle_button(ElementState::Pressed, MouseButton::Right, rig.element.id())
        .unwrap();
    rig.element.dispatch(&mut event);

    assert!(rig.log().is_empty());
    assert_eq!(rig.doc_subscriptions(), 0);

    // The move is dispatched into the document space with no cycle open.
    rig.cursor_moved(50.0, 50.0);
    assert!(rig.log().is_empty());
}

#[test]
fn select_start_is_suppressed_only_while_open() {
    let mut rig = TestRig::new(DragTrackerConfig::default());

    rig.cursor_moved(0.0, 0.0);
    rig.press();

    let mut event = PointerEvent::SelectStart(caliper::events::SelectStartEvent::new(Point::new(
        1.0, 1.0,
    )));
    rig.document.dispatch(&mut event);
    assert!(event.base().is_default_prevented());
    assert!(event.base().is_propagation_stopped());

    rig.release();

    let mut event = PointerEvent::SelectStart(caliper::events::SelectStartEvent::new(Point::new(
        1.0, 1.0,
    )));
    rig.document.dispatch(&mut event);
    assert!(!event.base().is_default_prevented());
    assert!(!event.base().is_propagation_stopped());
}
