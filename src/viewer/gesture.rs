//! Gesture interpretation for the photo viewer
//!
//! [`GestureController`] turns raw pointer, touch and wheel input into zoom
//! and pan changes on a [`ViewerState`], and recognises the navigation and
//! zoom-toggle gestures. It holds only in-flight gesture bookkeeping; the
//! state it drives is owned by the caller.

use std::time::{Duration, Instant};

use super::pan::{clamp_pan, clamp_zoom, Size, Vec2, MIN_ZOOM};

/// Zoom change per wheel delta unit.
pub const WHEEL_ZOOM_FACTOR: f64 = 0.002;
/// Zoom a double-tap or click jumps to from the fitted view.
pub const TOGGLE_ZOOM: f64 = 2.0;
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);
/// Minimum horizontal travel for a swipe, in pixels.
pub const SWIPE_MIN_DISTANCE: f64 = 50.0;
/// Horizontal travel must exceed vertical travel by this factor.
pub const SWIPE_DOMINANCE: f64 = 1.5;

/// Zoom and pan of the photo currently on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    pub photo_index: usize,
    pub zoom: f64,
    pub pan: Vec2,
}

impl ViewerState {
    pub fn new(photo_index: usize) -> Self {
        Self {
            photo_index,
            zoom: MIN_ZOOM,
            pan: Vec2::ZERO,
        }
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom > MIN_ZOOM
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = MIN_ZOOM;
        self.pan = Vec2::ZERO;
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Geometry the controller clamps against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    /// Unscaled image size; `None` until the image has been measured.
    pub base: Option<Size>,
    pub viewport: Size,
}

/// Raw input. Touch events carry every contact still on the surface; a
/// touch-end additionally carries the contact that was lifted.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    PointerDown { position: Vec2 },
    PointerMove { position: Vec2 },
    PointerUp,
    Click,
    TouchStart { touches: Vec<Vec2> },
    TouchMove { touches: Vec<Vec2> },
    TouchEnd { touches: Vec<Vec2>, changed: Vec2 },
    Wheel { delta_y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
}

/// What the host should do after an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Handled {
    /// Suppress the platform default (page scroll, native zoom).
    pub prevent_default: bool,
    pub navigate: Option<Navigation>,
}

impl Handled {
    fn consumed() -> Self {
        Self {
            prevent_default: true,
            navigate: None,
        }
    }

    fn navigate(direction: Navigation) -> Self {
        Self {
            prevent_default: true,
            navigate: Some(direction),
        }
    }
}

/// Observable phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    Pinching,
    SwipeTracking,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Dragging {
        anchor: Vec2,
        pan_anchor: Vec2,
        moved: bool,
    },
    Pinching {
        last_distance: f64,
    },
    SwipeTracking {
        start: Vec2,
        moved: bool,
    },
}

#[derive(Debug, Clone)]
pub struct GestureController {
    phase: Phase,
    last_tap: Option<Instant>,
    /// Set when a mouse drag actually moved; swallows the click that follows.
    suppress_click: bool,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            last_tap: None,
            suppress_click: false,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        match self.phase {
            Phase::Idle => GesturePhase::Idle,
            Phase::Dragging { .. } => GesturePhase::Dragging,
            Phase::Pinching { .. } => GesturePhase::Pinching,
            Phase::SwipeTracking { .. } => GesturePhase::SwipeTracking,
        }
    }

    /// Drop any gesture in flight, e.g. when the photo changes.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.last_tap = None;
        self.suppress_click = false;
    }

    pub fn handle(
        &mut self,
        state: &mut ViewerState,
        event: &GestureEvent,
        at: Instant,
        bounds: Bounds,
    ) -> Handled {
        match event {
            GestureEvent::Wheel { delta_y } => {
                let zoom = clamp_zoom(state.zoom - delta_y * WHEEL_ZOOM_FACTOR);
                apply_zoom(state, zoom, bounds);
                Handled::consumed()
            }
            GestureEvent::PointerDown { position } => {
                self.suppress_click = false;
                if state.is_zoomed() {
                    self.start_drag(state, *position);
                }
                Handled::consumed()
            }
            GestureEvent::PointerMove { position } => {
                self.drag_to(state, *position, bounds);
                Handled::consumed()
            }
            GestureEvent::PointerUp => {
                if let Phase::Dragging { moved, .. } = self.phase {
                    self.suppress_click = moved;
                    self.phase = Phase::Idle;
                }
                Handled::consumed()
            }
            GestureEvent::Click => {
                if std::mem::take(&mut self.suppress_click) {
                    return Handled::consumed();
                }
                toggle_zoom(state);
                Handled::consumed()
            }
            GestureEvent::TouchStart { touches } => {
                self.touch_start(state, touches);
                Handled::consumed()
            }
            GestureEvent::TouchMove { touches } => {
                self.touch_move(state, touches, bounds);
                Handled::consumed()
            }
            GestureEvent::TouchEnd { touches, changed } => {
                self.touch_end(state, touches, *changed, at)
            }
        }
    }

    fn start_drag(&mut self, state: &ViewerState, position: Vec2) {
        self.phase = Phase::Dragging {
            anchor: position,
            pan_anchor: state.pan,
            moved: false,
        };
    }

    fn drag_to(&mut self, state: &mut ViewerState, position: Vec2, bounds: Bounds) {
        let Phase::Dragging {
            anchor,
            pan_anchor,
            moved,
        } = &mut self.phase
        else {
            return;
        };

        let delta = position - *anchor;
        if delta != Vec2::ZERO {
            *moved = true;
        }
        state.pan = bounded_pan(*pan_anchor + delta, state.zoom, bounds);
    }

    fn touch_start(&mut self, state: &ViewerState, touches: &[Vec2]) {
        match touches {
            [first, second, ..] => {
                self.phase = Phase::Pinching {
                    last_distance: first.distance(*second),
                };
                self.last_tap = None;
            }
            [only] => {
                if !matches!(self.phase, Phase::Idle) {
                    return;
                }
                if state.is_zoomed() {
                    self.start_drag(state, *only);
                } else {
                    self.phase = Phase::SwipeTracking {
                        start: *only,
                        moved: false,
                    };
                }
            }
            [] => {}
        }
    }

    fn touch_move(&mut self, state: &mut ViewerState, touches: &[Vec2], bounds: Bounds) {
        if let (Phase::Dragging { .. }, [only]) = (&self.phase, touches) {
            self.drag_to(state, *only, bounds);
            return;
        }

        match (&mut self.phase, touches) {
            (Phase::Pinching { last_distance }, [first, second, ..]) => {
                let distance = first.distance(*second);
                if *last_distance > 0.0 && distance > 0.0 {
                    let zoom = clamp_zoom(state.zoom * distance / *last_distance);
                    apply_zoom(state, zoom, bounds);
                }
                *last_distance = distance;
            }
            (Phase::SwipeTracking { start, moved }, [only]) => {
                if *only != *start {
                    *moved = true;
                }
            }
            _ => {}
        }
    }

    fn touch_end(
        &mut self,
        state: &mut ViewerState,
        remaining: &[Vec2],
        changed: Vec2,
        at: Instant,
    ) -> Handled {
        match self.phase {
            Phase::Pinching { .. } => {
                if remaining.len() < 2 {
                    self.phase = Phase::Idle;
                }
                Handled::consumed()
            }
            Phase::Dragging { moved, .. } => {
                self.phase = Phase::Idle;
                if moved {
                    self.last_tap = None;
                } else {
                    self.register_tap(state, at);
                }
                Handled::consumed()
            }
            Phase::SwipeTracking { start, moved } => {
                self.phase = Phase::Idle;

                if let Some(direction) = swipe_direction(changed - start) {
                    self.last_tap = None;
                    return Handled::navigate(direction);
                }
                if moved {
                    self.last_tap = None;
                } else {
                    self.register_tap(state, at);
                }
                Handled::consumed()
            }
            Phase::Idle => Handled::consumed(),
        }
    }

    /// Record a stationary tap; the second inside the window toggles zoom.
    fn register_tap(&mut self, state: &mut ViewerState, at: Instant) {
        match self.last_tap.take() {
            Some(previous) if at.saturating_duration_since(previous) <= DOUBLE_TAP_WINDOW => {
                toggle_zoom(state);
            }
            _ => self.last_tap = Some(at),
        }
    }
}

/// `1 → TOGGLE_ZOOM`, anything zoomed back to 1; pan always recentres.
pub fn toggle_zoom(state: &mut ViewerState) {
    state.zoom = if state.is_zoomed() {
        MIN_ZOOM
    } else {
        TOGGLE_ZOOM
    };
    state.pan = Vec2::ZERO;
}

fn apply_zoom(state: &mut ViewerState, zoom: f64, bounds: Bounds) {
    if zoom <= MIN_ZOOM {
        state.reset_zoom();
        return;
    }
    state.zoom = zoom;
    state.pan = bounded_pan(state.pan, zoom, bounds);
}

/// Clamp when the image size is known; an unmeasured image keeps its pan
/// until the next load re-clamps it.
fn bounded_pan(pan: Vec2, zoom: f64, bounds: Bounds) -> Vec2 {
    if zoom <= MIN_ZOOM {
        return Vec2::ZERO;
    }
    match bounds.base {
        Some(base) => clamp_pan(pan, zoom, base, bounds.viewport),
        None => pan,
    }
}

fn swipe_direction(delta: Vec2) -> Option<Navigation> {
    let (dx, dy) = (delta.x.abs(), delta.y.abs());
    if dx > SWIPE_MIN_DISTANCE && dx > SWIPE_DOMINANCE * dy {
        Some(if delta.x < 0.0 {
            Navigation::Next
        } else {
            Navigation::Previous
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds {
            base: Some(Size::new(800.0, 600.0)),
            viewport: Size::new(800.0, 600.0),
        }
    }

    fn tap(
        controller: &mut GestureController,
        state: &mut ViewerState,
        at: Instant,
        point: Vec2,
    ) -> Handled {
        controller.handle(
            state,
            &GestureEvent::TouchStart {
                touches: vec![point],
            },
            at,
            bounds(),
        );
        controller.handle(
            state,
            &GestureEvent::TouchEnd {
                touches: vec![],
                changed: point,
            },
            at,
            bounds(),
        )
    }

    fn swipe(controller: &mut GestureController, state: &mut ViewerState, dx: f64, dy: f64) -> Handled {
        let now = Instant::now();
        let start = Vec2::new(300.0, 300.0);
        let end = Vec2::new(300.0 + dx, 300.0 + dy);
        controller.handle(
            state,
            &GestureEvent::TouchStart {
                touches: vec![start],
            },
            now,
            bounds(),
        );
        controller.handle(
            state,
            &GestureEvent::TouchMove { touches: vec![end] },
            now,
            bounds(),
        );
        controller.handle(
            state,
            &GestureEvent::TouchEnd {
                touches: vec![],
                changed: end,
            },
            now,
            bounds(),
        )
    }

    #[test]
    fn wheel_zooms_and_clamps() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();
        let now = Instant::now();

        controller.handle(&mut state, &GestureEvent::Wheel { delta_y: -250.0 }, now, bounds());
        assert!((state.zoom - 1.5).abs() < 1e-9);

        controller.handle(&mut state, &GestureEvent::Wheel { delta_y: -5000.0 }, now, bounds());
        assert_eq!(state.zoom, 3.0);

        state.pan = Vec2::new(100.0, 50.0);
        controller.handle(&mut state, &GestureEvent::Wheel { delta_y: 5000.0 }, now, bounds());
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.pan, Vec2::ZERO);
    }

    #[test]
    fn double_tap_twice_returns_to_start() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();
        let t0 = Instant::now();
        let point = Vec2::new(400.0, 300.0);

        tap(&mut controller, &mut state, t0, point);
        tap(&mut controller, &mut state, t0 + Duration::from_millis(200), point);
        assert_eq!(state.zoom, TOGGLE_ZOOM);
        assert_eq!(state.pan, Vec2::ZERO);

        let t1 = t0 + Duration::from_secs(2);
        tap(&mut controller, &mut state, t1, point);
        tap(&mut controller, &mut state, t1 + Duration::from_millis(100), point);
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.pan, Vec2::ZERO);
    }

    #[test]
    fn slow_taps_do_not_toggle() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();
        let t0 = Instant::now();
        let point = Vec2::new(10.0, 10.0);

        tap(&mut controller, &mut state, t0, point);
        tap(&mut controller, &mut state, t0 + Duration::from_millis(450), point);
        assert_eq!(state.zoom, 1.0);
    }

    #[test]
    fn left_swipe_goes_next_right_swipe_goes_previous() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();

        let handled = swipe(&mut controller, &mut state, -80.0, 0.0);
        assert_eq!(handled.navigate, Some(Navigation::Next));

        let handled = swipe(&mut controller, &mut state, 80.0, 0.0);
        assert_eq!(handled.navigate, Some(Navigation::Previous));
        assert_eq!(controller.phase(), GesturePhase::Idle);
    }

    #[test]
    fn short_or_vertical_swipes_do_not_navigate() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();

        assert_eq!(swipe(&mut controller, &mut state, -40.0, 0.0).navigate, None);
        assert_eq!(swipe(&mut controller, &mut state, -80.0, 60.0).navigate, None);
    }

    #[test]
    fn swipe_is_never_half_of_a_double_tap() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();
        let now = Instant::now();
        let point = Vec2::new(300.0, 300.0);

        tap(&mut controller, &mut state, now, point);
        swipe(&mut controller, &mut state, -80.0, 0.0);
        tap(&mut controller, &mut state, now + Duration::from_millis(100), point);
        assert_eq!(state.zoom, 1.0);
    }

    #[test]
    fn pinch_scales_zoom_by_distance_ratio() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();
        let now = Instant::now();

        controller.handle(
            &mut state,
            &GestureEvent::TouchStart {
                touches: vec![Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0)],
            },
            now,
            bounds(),
        );
        assert_eq!(controller.phase(), GesturePhase::Pinching);

        controller.handle(
            &mut state,
            &GestureEvent::TouchMove {
                touches: vec![Vec2::new(50.0, 100.0), Vec2::new(250.0, 100.0)],
            },
            now,
            bounds(),
        );
        assert!((state.zoom - 2.0).abs() < 1e-9);

        controller.handle(
            &mut state,
            &GestureEvent::TouchMove {
                touches: vec![Vec2::new(0.0, 100.0), Vec2::new(400.0, 100.0)],
            },
            now,
            bounds(),
        );
        assert_eq!(state.zoom, 3.0);

        let handled = controller.handle(
            &mut state,
            &GestureEvent::TouchEnd {
                touches: vec![Vec2::new(0.0, 100.0)],
                changed: Vec2::new(400.0, 100.0),
            },
            now,
            bounds(),
        );
        assert_eq!(handled.navigate, None);
        assert_eq!(controller.phase(), GesturePhase::Idle);
    }

    #[test]
    fn drag_pans_within_bounds_when_zoomed() {
        let mut controller = GestureController::new();
        let mut state = ViewerState {
            photo_index: 0,
            zoom: 2.0,
            pan: Vec2::ZERO,
        };
        let now = Instant::now();

        controller.handle(
            &mut state,
            &GestureEvent::PointerDown {
                position: Vec2::new(100.0, 100.0),
            },
            now,
            bounds(),
        );
        assert_eq!(controller.phase(), GesturePhase::Dragging);

        controller.handle(
            &mut state,
            &GestureEvent::PointerMove {
                position: Vec2::new(150.0, 80.0),
            },
            now,
            bounds(),
        );
        assert_eq!(state.pan, Vec2::new(50.0, -20.0));

        // 800x600 at 2x in an 800x600 viewport: at most 400 by 300
        controller.handle(
            &mut state,
            &GestureEvent::PointerMove {
                position: Vec2::new(2000.0, -2000.0),
            },
            now,
            bounds(),
        );
        assert_eq!(state.pan, Vec2::new(400.0, -300.0));
    }

    #[test]
    fn click_after_drag_is_suppressed() {
        let mut controller = GestureController::new();
        let mut state = ViewerState {
            photo_index: 0,
            zoom: 2.0,
            pan: Vec2::ZERO,
        };
        let now = Instant::now();

        controller.handle(
            &mut state,
            &GestureEvent::PointerDown {
                position: Vec2::new(0.0, 0.0),
            },
            now,
            bounds(),
        );
        controller.handle(
            &mut state,
            &GestureEvent::PointerMove {
                position: Vec2::new(30.0, 0.0),
            },
            now,
            bounds(),
        );
        controller.handle(&mut state, &GestureEvent::PointerUp, now, bounds());
        controller.handle(&mut state, &GestureEvent::Click, now, bounds());
        assert_eq!(state.zoom, 2.0);

        // A click without movement toggles back out
        controller.handle(&mut state, &GestureEvent::Click, now, bounds());
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.pan, Vec2::ZERO);
    }

    #[test]
    fn pointer_down_at_fit_does_not_drag() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();
        let now = Instant::now();

        controller.handle(
            &mut state,
            &GestureEvent::PointerDown {
                position: Vec2::new(0.0, 0.0),
            },
            now,
            bounds(),
        );
        controller.handle(
            &mut state,
            &GestureEvent::PointerMove {
                position: Vec2::new(90.0, 40.0),
            },
            now,
            bounds(),
        );
        assert_eq!(controller.phase(), GesturePhase::Idle);
        assert_eq!(state.pan, Vec2::ZERO);
    }

    #[test]
    fn unmeasured_image_keeps_pan_unclamped() {
        let mut controller = GestureController::new();
        let mut state = ViewerState {
            photo_index: 0,
            zoom: 2.0,
            pan: Vec2::ZERO,
        };
        let unmeasured = Bounds {
            base: None,
            viewport: Size::new(800.0, 600.0),
        };
        let now = Instant::now();

        controller.handle(
            &mut state,
            &GestureEvent::PointerDown {
                position: Vec2::ZERO,
            },
            now,
            unmeasured,
        );
        controller.handle(
            &mut state,
            &GestureEvent::PointerMove {
                position: Vec2::new(5000.0, 0.0),
            },
            now,
            unmeasured,
        );
        assert_eq!(state.pan, Vec2::new(5000.0, 0.0));
    }

    #[test]
    fn every_event_prevents_default() {
        let mut controller = GestureController::new();
        let mut state = ViewerState::default();
        let now = Instant::now();

        for event in [
            GestureEvent::Wheel { delta_y: 1.0 },
            GestureEvent::PointerUp,
            GestureEvent::TouchMove { touches: vec![] },
        ] {
            assert!(controller.handle(&mut state, &event, now, bounds()).prevent_default);
        }
    }
}
