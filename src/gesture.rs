//! Two-finger gesture tracking for the try-on overlay.
//!
//! A [`GestureTracker`] consumes touch frames (the list of active contact
//! points) and accumulates a [`Transform`]:
//! - **one finger** pans: the raw screen delta is added to the translation,
//! - **two fingers** pinch and twist: the change in finger distance scales
//!   the overlay multiplicatively and the change in finger angle rotates it.
//!
//! Baselines are only recorded by [`GestureTracker::on_start`]. Any frame that
//! does not match the recorded baseline (finger count changed, no start seen,
//! three or more fingers) is ignored until the next start.
//!
//! The tracker is a plain value owned by the preview session. Hosts that
//! deliver input from several threads use [`SharedGestureTracker`].

use std::sync::{Mutex, MutexGuard};

use log::trace;

use crate::geometry::{angle_degrees, distance, Point};
use crate::transform::Transform;

/// Lower bound for the accumulated scale.
pub const MIN_SCALE: f64 = 0.1;

/// Baseline recorded at gesture start and refreshed by every applied move.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Panning with one finger.
    OneFinger {
        /// Last observed finger position.
        last: Point,
    },
    /// Pinching/rotating with two fingers.
    TwoFinger {
        /// Last observed distance between the fingers.
        distance: f64,
        /// Last observed angle of the finger pair, in degrees.
        angle: f64,
    },
}

impl GestureState {
    /// Baseline for a set of contact points, or `None` for 0 or 3+ points.
    fn baseline(points: &[Point]) -> Option<Self> {
        match *points {
            [p] => Some(Self::OneFinger { last: p }),
            [a, b] => Some(Self::TwoFinger {
                distance: distance(a, b),
                angle: angle_degrees(a, b),
            }),
            _ => None,
        }
    }
}

/// What the host should do with a move event after the tracker handled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct MoveOutcome {
    /// The host must suppress native scrolling/zooming for this event.
    /// Always `true`: the overlay owns every move inside it.
    pub prevent_default: bool,
    /// Whether the transform changed.
    pub applied: bool,
}

/// Gesture session: the accumulated transform plus the current baseline.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    transform: Transform,
    state: GestureState,
}

impl GestureTracker {
    /// A fresh session with the identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current transform snapshot.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Current baseline state.
    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Record the baseline for a new set of contact points.
    ///
    /// One point stores its position, two points store their distance and
    /// angle. Other counts leave the state as it was. The transform is never
    /// touched here.
    pub fn on_start(&mut self, points: &[Point]) {
        if let Some(baseline) = GestureState::baseline(points) {
            trace!("gesture start: {baseline:?}");
            self.state = baseline;
        }
    }

    /// Apply one move frame.
    pub fn on_move(&mut self, points: &[Point]) -> MoveOutcome {
        let applied = match (self.state, points) {
            (GestureState::OneFinger { last }, &[current]) => {
                let (dx, dy) = current.offset_from(last);
                self.transform.translate_x += dx;
                self.transform.translate_y += dy;
                self.state = GestureState::OneFinger { last: current };
                true
            }
            (
                GestureState::TwoFinger {
                    distance: last_distance,
                    angle: last_angle,
                },
                &[a, b],
            ) if last_distance > 0.0 => {
                let new_distance = distance(a, b);
                let new_angle = angle_degrees(a, b);
                let factor = new_distance / last_distance;
                self.transform.scale = (self.transform.scale * factor).max(MIN_SCALE);
                self.transform.rotation += new_angle - last_angle;
                self.state = GestureState::TwoFinger {
                    distance: new_distance,
                    angle: new_angle,
                };
                true
            }
            _ => false,
        };

        if !applied {
            trace!(
                "gesture move ignored: {} point(s) with state {:?}",
                points.len(),
                self.state
            );
        }

        MoveOutcome {
            prevent_default: true,
            applied,
        }
    }

    /// Drop the baseline, whatever fingers remain on the surface.
    pub fn on_end(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Start a new preview session: identity transform, no baseline.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A [`GestureTracker`] behind a single mutex.
///
/// Every event handler holds the lock for the whole read-compute-write cycle,
/// so moves are applied one at a time in lock order. Readers get a complete
/// [`Transform`] copy.
#[derive(Debug, Default)]
pub struct SharedGestureTracker {
    inner: Mutex<GestureTracker>,
}

impl SharedGestureTracker {
    /// Wrap a fresh tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // The tracker holds plain numbers, so a panic mid-update cannot leave it
    // in a state worse than a skipped frame.
    fn lock(&self) -> MutexGuard<'_, GestureTracker> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// See [`GestureTracker::on_start`].
    pub fn on_start(&self, points: &[Point]) {
        self.lock().on_start(points);
    }

    /// See [`GestureTracker::on_move`].
    pub fn on_move(&self, points: &[Point]) -> MoveOutcome {
        self.lock().on_move(points)
    }

    /// See [`GestureTracker::on_end`].
    pub fn on_end(&self) {
        self.lock().on_end();
    }

    /// See [`GestureTracker::reset`].
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Atomic copy of the current transform.
    #[must_use]
    pub fn snapshot(&self) -> Transform {
        self.lock().transform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    /// Two fingers `dist` apart, centered on the origin, at `deg` degrees.
    fn pair(dist: f64, deg: f64) -> [Point; 2] {
        let (sin, cos) = deg.to_radians().sin_cos();
        let h = dist / 2.0;
        [p(-h * cos, -h * sin), p(h * cos, h * sin)]
    }

    #[test]
    fn start_never_mutates_transform() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[p(5.0, 5.0)]);
        tracker.on_start(&pair(100.0, 30.0));
        assert_eq!(tracker.transform(), Transform::IDENTITY);
    }

    #[test]
    fn start_records_baselines() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[p(1.0, 2.0)]);
        assert_eq!(tracker.state(), GestureState::OneFinger { last: p(1.0, 2.0) });

        tracker.on_start(&[p(0.0, 0.0), p(0.0, 10.0)]);
        match tracker.state() {
            GestureState::TwoFinger { distance, angle } => {
                assert_relative_eq!(distance, 10.0);
                assert_relative_eq!(angle, 90.0);
            }
            other => panic!("expected two-finger baseline, got {other:?}"),
        }
    }

    #[test]
    fn start_with_zero_or_three_points_keeps_state() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[]);
        assert_eq!(tracker.state(), GestureState::Idle);

        tracker.on_start(&[p(3.0, 3.0)]);
        tracker.on_start(&[p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0)]);
        assert_eq!(tracker.state(), GestureState::OneFinger { last: p(3.0, 3.0) });
    }

    #[test]
    fn single_finger_accumulates_deltas() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[p(0.0, 0.0)]);
        assert!(tracker.on_move(&[p(5.0, 5.0)]).applied);
        assert!(tracker.on_move(&[p(3.0, 8.0)]).applied);

        let t = tracker.transform();
        assert_relative_eq!(t.translate_x, 3.0);
        assert_relative_eq!(t.translate_y, 8.0);
        assert_relative_eq!(t.scale, 1.0);
        assert_relative_eq!(t.rotation, 0.0);
    }

    #[test]
    fn pan_is_not_affected_by_scale_or_rotation() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&pair(100.0, 0.0));
        let _ = tracker.on_move(&pair(200.0, 45.0));
        tracker.on_end();

        tracker.on_start(&[p(10.0, 10.0)]);
        let _ = tracker.on_move(&[p(20.0, 30.0)]);
        let t = tracker.transform();
        assert_relative_eq!(t.translate_x, 10.0);
        assert_relative_eq!(t.translate_y, 20.0);
    }

    #[test]
    fn pinch_scales_multiplicatively() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&pair(100.0, 0.0));
        let _ = tracker.on_move(&pair(150.0, 0.0));
        let _ = tracker.on_move(&pair(300.0, 0.0));
        assert_relative_eq!(tracker.transform().scale, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn pinch_scale_is_floored() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&pair(100.0, 0.0));
        let _ = tracker.on_move(&pair(10.0, 0.0));
        assert_relative_eq!(tracker.transform().scale, MIN_SCALE, epsilon = 1e-9);

        let _ = tracker.on_move(&pair(1.0, 0.0));
        let _ = tracker.on_move(&pair(0.5, 0.0));
        assert_relative_eq!(tracker.transform().scale, MIN_SCALE);

        // Growing again starts from the floor, not from the unclamped value.
        let _ = tracker.on_move(&pair(1.0, 0.0));
        assert_relative_eq!(tracker.transform().scale, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn rotation_accumulates_without_wrapping() {
        let mut tracker = GestureTracker::new();
        for _ in 0..2 {
            tracker.on_start(&pair(100.0, 0.0));
            let _ = tracker.on_move(&pair(100.0, 170.0));
            tracker.on_end();
        }
        assert_relative_eq!(tracker.transform().rotation, 340.0, epsilon = 1e-9);
    }

    #[test]
    fn successive_rotation_deltas_add_up() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&pair(50.0, 0.0));
        for step in 1..=8 {
            let _ = tracker.on_move(&pair(50.0, f64::from(step) * 20.0));
        }
        tracker.on_end();
        tracker.on_start(&pair(50.0, 0.0));
        for step in 1..=8 {
            let _ = tracker.on_move(&pair(50.0, f64::from(step) * 20.0));
        }
        assert_relative_eq!(tracker.transform().rotation, 320.0, epsilon = 1e-9);
    }

    #[test]
    fn move_after_end_is_noop() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[p(0.0, 0.0)]);
        let _ = tracker.on_move(&[p(4.0, 4.0)]);
        tracker.on_end();
        let before = tracker.transform();

        let outcome = tracker.on_move(&[p(50.0, 50.0)]);
        assert!(!outcome.applied);
        assert!(outcome.prevent_default);
        assert_eq!(tracker.transform(), before);
        assert_eq!(tracker.state(), GestureState::Idle);
    }

    #[test]
    fn two_to_one_finger_without_end_freezes_until_next_start() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&pair(100.0, 0.0));
        let _ = tracker.on_move(&pair(120.0, 10.0));
        let frozen = tracker.transform();

        assert!(!tracker.on_move(&[p(30.0, 30.0)]).applied);
        assert!(!tracker.on_move(&[p(60.0, 40.0)]).applied);
        assert_eq!(tracker.transform(), frozen);

        tracker.on_start(&[p(60.0, 40.0)]);
        assert!(tracker.on_move(&[p(61.0, 42.0)]).applied);
        assert_relative_eq!(tracker.transform().translate_x, 1.0);
        assert_relative_eq!(tracker.transform().translate_y, 2.0);
    }

    #[test]
    fn one_to_two_fingers_without_start_is_noop() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[p(0.0, 0.0)]);
        assert!(!tracker.on_move(&pair(80.0, 20.0)).applied);
        assert_eq!(tracker.transform(), Transform::IDENTITY);
    }

    #[test]
    fn zero_and_three_point_moves_are_noops() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[p(0.0, 0.0)]);
        assert!(!tracker.on_move(&[]).applied);
        assert!(!tracker
            .on_move(&[p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)])
            .applied);
        assert_eq!(tracker.transform(), Transform::IDENTITY);
    }

    #[test]
    fn coincident_start_fingers_do_not_divide_by_zero() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[p(5.0, 5.0), p(5.0, 5.0)]);
        assert!(!tracker.on_move(&pair(40.0, 0.0)).applied);
        let t = tracker.transform();
        assert!(t.scale.is_finite());
        assert_relative_eq!(t.scale, 1.0);
    }

    #[test]
    fn reset_starts_a_new_session() {
        let mut tracker = GestureTracker::new();
        tracker.on_start(&[p(0.0, 0.0)]);
        let _ = tracker.on_move(&[p(9.0, 9.0)]);
        tracker.reset();
        assert_eq!(tracker.transform(), Transform::IDENTITY);
        assert_eq!(tracker.state(), GestureState::Idle);
    }

    #[test]
    fn shared_tracker_applies_moves_from_many_threads() {
        use std::sync::Arc;

        let shared = Arc::new(SharedGestureTracker::new());
        shared.on_start(&[p(0.0, 0.0)]);

        // Each thread moves the finger by +1 along x from wherever it is now,
        // so the total only adds up if every read-modify-write is serialized.
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        let mut guard = shared.lock();
                        let GestureState::OneFinger { last } = guard.state() else {
                            panic!("baseline lost");
                        };
                        let _ = guard.on_move(&[p(last.x + 1.0, last.y)]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let t = shared.snapshot();
        assert_relative_eq!(t.translate_x, 1000.0);
        assert_relative_eq!(t.translate_y, 0.0);

        shared.on_end();
        assert!(!shared.on_move(&[p(0.0, 0.0)]).applied);
        shared.reset();
        assert_eq!(shared.snapshot(), Transform::IDENTITY);
    }
}
