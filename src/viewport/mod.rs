//! Pan/zoom controller for the garden canvas.
//!
//! Screen coordinates are relative to the canvas element's top-left corner.
//! World coordinates are the untransformed content layer:
//! `screen = world * scale + offset`.

use crate::models::{Point, ViewState};

pub(crate) const MIN_SCALE: f64 = 0.1;
pub(crate) const MAX_SCALE: f64 = 4.0;

/// Per-pixel wheel sensitivity of [`ZoomCurve::Linear`].
pub(crate) const LINEAR_WHEEL_SENSITIVITY: f64 = 0.001;
/// Exponent rate of [`ZoomCurve::Exponential`].
pub(crate) const EXPONENTIAL_WHEEL_RATE: f64 = 0.0015;

// Two fingers closer than this are treated as one point.
const MIN_PINCH_DISTANCE: f64 = 1e-6;

/// Pixels per line for wheel events reported in lines (`deltaMode == 1`).
const WHEEL_LINE_PX: f64 = 16.0;
const DOM_DELTA_LINE: u32 = 1;
const DOM_DELTA_PAGE: u32 = 2;

/// Normalise a wheel delta to pixels. Page deltas scale by `page_px`.
pub(crate) fn wheel_delta_px(delta: f64, delta_mode: u32, page_px: f64) -> f64 {
    match delta_mode {
        DOM_DELTA_LINE => delta * WHEEL_LINE_PX,
        DOM_DELTA_PAGE => delta * page_px,
        _ => delta,
    }
}

pub(crate) fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum ZoomCurve {
    /// `scale - delta_y * 0.001`
    #[default]
    Linear,
    /// `scale * exp(-delta_y * 0.0015)`
    Exponential,
}

impl ZoomCurve {
    fn next_scale(self, scale: f64, delta_y: f64) -> f64 {
        let raw = match self {
            ZoomCurve::Linear => scale - delta_y * LINEAR_WHEEL_SENSITIVITY,
            ZoomCurve::Exponential => scale * (-delta_y * EXPONENTIAL_WHEEL_RATE).exp(),
        };
        clamp_scale(raw)
    }
}

/// Snapshot taken when a two-finger gesture starts. Every move recomputes
/// from here so rounding does not accumulate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PinchStart {
    pub distance: f64,
    pub scale: f64,
    pub world: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub(crate) enum Gesture {
    #[default]
    Idle,
    Dragging {
        last: Point,
    },
    Pinching(PinchStart),
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub(crate) struct Viewport {
    view: ViewState,
    gesture: Gesture,
    curve: ZoomCurve,
}

impl Viewport {
    pub fn new(view: ViewState, curve: ZoomCurve) -> Self {
        let mut vp = Self {
            curve,
            ..Self::default()
        };
        vp.restore(view);
        vp
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.view.offset.x) / self.view.scale,
            (p.y - self.view.offset.y) / self.view.scale,
        )
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        Point::new(
            p.x * self.view.scale + self.view.offset.x,
            p.y * self.view.scale + self.view.offset.y,
        )
    }

    /// CSS transform for the content layer.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.view.offset.x, self.view.offset.y, self.view.scale
        )
    }

    pub fn reset(&mut self) {
        self.view = ViewState::default();
        self.gesture = Gesture::Idle;
    }

    pub fn restore(&mut self, view: ViewState) {
        self.view = ViewState {
            scale: clamp_scale(view.scale),
            offset: view.offset,
        };
        self.gesture = Gesture::Idle;
    }

    // --- mouse ---

    pub fn pointer_down(&mut self, p: Point) {
        self.gesture = Gesture::Dragging { last: p };
    }

    /// Returns `true` when the view changed.
    pub fn pointer_move(&mut self, p: Point) -> bool {
        let Gesture::Dragging { last } = self.gesture else {
            return false;
        };
        self.view.offset.x += p.x - last.x;
        self.view.offset.y += p.y - last.y;
        self.gesture = Gesture::Dragging { last: p };
        true
    }

    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Zoom around `cursor` so the world point under it stays put.
    ///
    /// Independent of any drag or pinch in progress.
    pub fn wheel(&mut self, cursor: Point, delta_y: f64) {
        let next = self.curve.next_scale(self.view.scale, delta_y);
        self.zoom_to(cursor, next);
    }

    /// Multiply the scale by `factor` around `anchor` (toolbar buttons).
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let next = clamp_scale(self.view.scale * factor);
        self.zoom_to(anchor, next);
    }

    fn zoom_to(&mut self, anchor: Point, scale: f64) {
        let world = self.screen_to_world(anchor);
        self.view.scale = scale;
        self.view.offset = Point::new(anchor.x - world.x * scale, anchor.y - world.y * scale);
    }

    // --- touch ---

    pub fn touch_start(&mut self, touches: &[Point]) {
        match touches {
            [] => self.gesture = Gesture::Idle,
            [one] => self.gesture = Gesture::Dragging { last: *one },
            [a, b, ..] => self.begin_pinch(*a, *b),
        }
    }

    pub fn touch_move(&mut self, touches: &[Point]) -> bool {
        match (self.gesture, touches) {
            (Gesture::Pinching(start), [a, b, ..]) => {
                let distance = a.distance(*b);
                let ratio = if start.distance < MIN_PINCH_DISTANCE {
                    1.0
                } else {
                    distance / start.distance
                };
                let scale = clamp_scale(start.scale * ratio);
                let mid = a.midpoint(*b);
                self.view.scale = scale;
                self.view.offset = Point::new(
                    mid.x - start.world.x * scale,
                    mid.y - start.world.y * scale,
                );
                true
            }
            (Gesture::Dragging { .. }, [one]) => self.pointer_move(*one),
            _ => false,
        }
    }

    /// `remaining` are the touches still on the surface after the lift.
    pub fn touch_end(&mut self, remaining: &[Point]) {
        match remaining {
            [] => self.gesture = Gesture::Idle,
            // Continue as a pan from the finger left down, so the view does
            // not jump to it.
            [one] => self.gesture = Gesture::Dragging { last: *one },
            [a, b, ..] => self.begin_pinch(*a, *b),
        }
    }

    fn begin_pinch(&mut self, a: Point, b: Point) {
        let mid = a.midpoint(b);
        self.gesture = Gesture::Pinching(PinchStart {
            distance: a.distance(b),
            scale: self.view.scale,
            world: self.screen_to_world(mid),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn test_drag_pans_by_pointer_delta() {
        let mut vp = Viewport::default();
        vp.pointer_down(Point::new(10.0, 10.0));
        assert!(vp.pointer_move(Point::new(15.0, 7.0)));
        assert!(vp.pointer_move(Point::new(20.0, 7.0)));
        assert_eq!(vp.view().offset, Point::new(10.0, -3.0));
        vp.pointer_up();
        assert!(vp.is_idle());
        assert!(!vp.pointer_move(Point::new(100.0, 100.0)));
        assert_eq!(vp.view().offset, Point::new(10.0, -3.0));
    }

    #[test]
    fn test_wheel_keeps_world_point_under_cursor() {
        let mut vp = Viewport::default();
        let cursor = Point::new(100.0, 100.0);
        let before = vp.screen_to_world(cursor);
        vp.wheel(cursor, -120.0);
        assert!(vp.view().scale > 1.0);
        assert!(close(vp.screen_to_world(cursor), before));
    }

    #[test]
    fn test_exponential_wheel_keeps_fixed_point() {
        let mut vp = Viewport::new(
            ViewState {
                scale: 0.8,
                offset: Point::new(-40.0, 25.0),
            },
            ZoomCurve::Exponential,
        );
        let cursor = Point::new(321.0, 87.5);
        let before = vp.screen_to_world(cursor);
        vp.wheel(cursor, 200.0);
        assert!(vp.view().scale < 0.8);
        assert!(close(vp.screen_to_world(cursor), before));
    }

    #[test]
    fn test_wheel_clamps_scale() {
        let mut vp = Viewport::default();
        vp.wheel(Point::new(0.0, 0.0), -1_000_000.0);
        assert_eq!(vp.view().scale, MAX_SCALE);
        vp.wheel(Point::new(0.0, 0.0), 1_000_000.0);
        assert_eq!(vp.view().scale, MIN_SCALE);
    }

    #[test]
    fn test_wheel_during_drag_keeps_dragging() {
        let mut vp = Viewport::default();
        vp.pointer_down(Point::new(0.0, 0.0));
        vp.wheel(Point::new(50.0, 50.0), -100.0);
        assert!(matches!(vp.gesture(), Gesture::Dragging { .. }));
    }

    #[test]
    fn test_pinch_zoom_scales_by_distance_ratio() {
        let mut vp = Viewport::default();
        vp.touch_start(&[Point::new(100.0, 100.0), Point::new(200.0, 100.0)]);
        assert!(matches!(vp.gesture(), Gesture::Pinching(_)));

        assert!(vp.touch_move(&[Point::new(50.0, 100.0), Point::new(250.0, 100.0)]));
        assert!((vp.view().scale - 2.0).abs() < EPS);

        // The world point that started under the midpoint is still there.
        let mid = Point::new(150.0, 100.0);
        assert!(close(vp.screen_to_world(mid), Point::new(150.0, 100.0)));
    }

    #[test]
    fn test_pinch_recomputes_from_start_snapshot() {
        let mut vp = Viewport::default();
        let a = Point::new(0.0, 0.0);
        vp.touch_start(&[a, Point::new(100.0, 0.0)]);
        for step in 1..=50 {
            let x = 100.0 + step as f64;
            vp.touch_move(&[a, Point::new(x, 0.0)]);
        }
        vp.touch_move(&[a, Point::new(100.0, 0.0)]);
        assert!((vp.view().scale - 1.0).abs() < EPS);
        assert!(close(vp.view().offset, Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_pinch_scale_is_monotonic_and_clamped() {
        let a = Point::new(0.0, 0.0);
        let mut last = 0.0;
        for d in [0.0, 1.0, 5.0, 20.0, 50.0, 100.0, 400.0, 1_000.0, 100_000.0] {
            let mut vp = Viewport::default();
            vp.touch_start(&[a, Point::new(100.0, 0.0)]);
            vp.touch_move(&[a, Point::new(d, 0.0)]);
            let s = vp.view().scale;
            assert!((MIN_SCALE..=MAX_SCALE).contains(&s), "scale {s} out of range");
            assert!(s >= last);
            last = s;
        }
        assert_eq!(last, MAX_SCALE);
    }

    #[test]
    fn test_pinch_from_coincident_fingers_does_not_produce_nan() {
        let mut vp = Viewport::default();
        let p = Point::new(30.0, 30.0);
        vp.touch_start(&[p, p]);
        vp.touch_move(&[Point::new(0.0, 0.0), Point::new(300.0, 300.0)]);
        let s = vp.view().scale;
        assert!(s.is_finite());
        assert_eq!(s, 1.0);
        assert!(vp.view().offset.x.is_finite());
    }

    #[test]
    fn test_touch_lifecycle() {
        let mut vp = Viewport::default();
        vp.touch_start(&[Point::new(10.0, 10.0)]);
        assert!(matches!(vp.gesture(), Gesture::Dragging { .. }));
        assert!(vp.touch_move(&[Point::new(20.0, 30.0)]));
        assert_eq!(vp.view().offset, Point::new(10.0, 20.0));

        vp.touch_start(&[Point::new(20.0, 30.0), Point::new(60.0, 30.0)]);
        assert!(matches!(vp.gesture(), Gesture::Pinching(_)));

        vp.touch_end(&[Point::new(60.0, 30.0)]);
        assert!(matches!(vp.gesture(), Gesture::Dragging { .. }));
        vp.touch_end(&[]);
        assert!(vp.is_idle());
    }

    #[test]
    fn test_restore_clamps_persisted_scale() {
        let mut vp = Viewport::default();
        vp.restore(ViewState {
            scale: 12.0,
            offset: Point::new(5.0, 6.0),
        });
        assert_eq!(vp.view().scale, MAX_SCALE);
        assert_eq!(vp.view().offset, Point::new(5.0, 6.0));
    }

    #[test]
    fn test_zoom_at_button_keeps_anchor() {
        let mut vp = Viewport::default();
        let anchor = Point::new(400.0, 300.0);
        let before = vp.screen_to_world(anchor);
        vp.zoom_at(anchor, 1.25);
        assert!((vp.view().scale - 1.25).abs() < EPS);
        assert!(close(vp.screen_to_world(anchor), before));
    }

    #[test]
    fn test_world_screen_roundtrip() {
        let vp = Viewport::new(
            ViewState {
                scale: 2.0,
                offset: Point::new(10.0, -5.0),
            },
            ZoomCurve::Linear,
        );
        let p = Point::new(3.0, 4.0);
        assert!(close(vp.screen_to_world(vp.world_to_screen(p)), p));
        assert_eq!(vp.css_transform(), "translate(10px, -5px) scale(2)");
    }

    #[test]
    fn test_pinch_start_snapshots_world_midpoint() {
        let mut vp = Viewport::new(
            ViewState {
                scale: 2.0,
                offset: Point::new(10.0, 20.0),
            },
            ZoomCurve::Linear,
        );
        vp.touch_start(&[Point::new(10.0, 20.0), Point::new(50.0, 20.0)]);
        assert_eq!(
            vp.gesture(),
            Gesture::Pinching(PinchStart {
                distance: 40.0,
                scale: 2.0,
                world: Point::new(10.0, 0.0),
            })
        );
    }

    #[test]
    fn test_line_mode_wheel_zooms_like_pixel_mode() {
        assert_eq!(wheel_delta_px(3.0, 1, 600.0), 48.0);
        assert_eq!(wheel_delta_px(-1.0, 2, 600.0), -600.0);
        assert_eq!(wheel_delta_px(100.0, 0, 600.0), 100.0);

        let mut lines = Viewport::new(ViewState::default(), ZoomCurve::Linear);
        let mut pixels = lines;
        lines.wheel(Point::new(0.0, 0.0), wheel_delta_px(-3.0, 1, 600.0));
        pixels.wheel(Point::new(0.0, 0.0), -48.0);
        assert_eq!(lines.view(), pixels.view());
        assert!(lines.view().scale > 1.04);
    }
}
