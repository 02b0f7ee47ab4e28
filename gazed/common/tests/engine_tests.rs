//! Behavioral properties of the tracking engine, driven end to end through
//! `GazeTracker::process` with synthetic landmark frames.

use api::{CalibrationEvent, LandmarkSample, LEFT_EYE_RING, LEFT_IRIS, RIGHT_IRIS};
use common::{AffineMapping, GazeProfile, GazeTracker, TrackerConfig, TrackerOutput};
use glam::DVec2;

const SCREEN_W: f64 = 1920.0;
const SCREEN_H: f64 = 1080.0;
const FRAME_MS: f64 = 30.0;

const OPEN_EAR: f64 = 0.30;
const CLOSED_EAR: f64 = 0.05;

/// Build a frame with a chosen eye aspect ratio and iris center. The eye
/// ring spans 0.2 horizontally, so a lid half-height of `ear / 10` produces
/// exactly the requested ratio; both iris clusters are centered on `uv`.
fn sample(ts_ms: f64, ear: f64, uv: DVec2) -> LandmarkSample {
    let h = ear / 10.0;
    let mut points = vec![
        (LEFT_EYE_RING[0], DVec2::new(0.40, 0.50)),
        (LEFT_EYE_RING[1], DVec2::new(0.45, 0.50 - h)),
        (LEFT_EYE_RING[2], DVec2::new(0.55, 0.50 - h)),
        (LEFT_EYE_RING[3], DVec2::new(0.60, 0.50)),
        (LEFT_EYE_RING[4], DVec2::new(0.55, 0.50 + h)),
        (LEFT_EYE_RING[5], DVec2::new(0.45, 0.50 + h)),
    ];
    for cluster in [LEFT_IRIS, RIGHT_IRIS] {
        points.push((cluster[0], DVec2::new(uv.x - 0.01, uv.y)));
        points.push((cluster[1], DVec2::new(uv.x + 0.01, uv.y)));
        points.push((cluster[2], DVec2::new(uv.x, uv.y - 0.01)));
        points.push((cluster[3], DVec2::new(uv.x, uv.y + 0.01)));
    }
    LandmarkSample::with_points(ts_ms, points)
}

/// A tracker with the warm-up and guided calibration already behind it:
/// baseline 0.30, mapping `x = 1920 u, y = 1080 v`.
fn calibrated_tracker() -> GazeTracker {
    let mut tracker = GazeTracker::new(TrackerConfig::default(), SCREEN_W, SCREEN_H);
    tracker.apply_profile(&GazeProfile {
        ear_baseline: Some(OPEN_EAR),
        mapping: Some(AffineMapping {
            ax: SCREEN_W,
            bx: 0.0,
            cx: 0.0,
            ay: 0.0,
            by: SCREEN_H,
            cy: 0.0,
        }),
    });
    tracker
}

/// Feed open-eye frames at a fixed gaze until the cursor settles.
fn settle(tracker: &mut GazeTracker, from_ms: f64, uv: DVec2, frames: usize) -> (f64, TrackerOutput) {
    let mut ts = from_ms;
    let mut last = None;
    for _ in 0..frames {
        last = Some(tracker.process(&sample(ts, OPEN_EAR, uv)));
        ts += FRAME_MS;
    }
    (ts, last.unwrap())
}

mod freeze_invariant {
    use super::*;

    #[test]
    fn closed_frames_re_emit_pre_closure_position_exactly() {
        let mut tracker = calibrated_tracker();
        let gaze = DVec2::new(0.4, 0.4);
        let (mut ts, before) = settle(&mut tracker, 0.0, gaze, 15);

        // Lid down for five frames; the iris points wander meanwhile, which
        // must not matter.
        for i in 0..5 {
            let wander = DVec2::new(0.4 + 0.02 * i as f64, 0.45);
            let out = tracker.process(&sample(ts, CLOSED_EAR, wander));
            assert_eq!(out.x, before.x, "frame {} moved while closed", i);
            assert_eq!(out.y, before.y, "frame {} moved while closed", i);
            assert!(out.click.is_none());
            ts += FRAME_MS;
        }
    }
}

mod duration_filter {
    use super::*;

    fn run_closure(length_ms: f64) -> Vec<TrackerOutput> {
        let mut tracker = calibrated_tracker();
        let gaze = DVec2::new(0.5, 0.5);
        let (close_at, _) = settle(&mut tracker, 0.0, gaze, 15);

        let mut outputs = Vec::new();
        let mut ts = close_at;
        while ts < close_at + length_ms {
            outputs.push(tracker.process(&sample(ts, CLOSED_EAR, gaze)));
            ts += FRAME_MS;
        }
        // Reopen exactly `length_ms` after the closure transition frame.
        outputs.push(tracker.process(&sample(close_at + length_ms, OPEN_EAR, gaze)));
        // And a few trailing open frames.
        for i in 1..10 {
            outputs.push(tracker.process(&sample(close_at + length_ms + i as f64 * FRAME_MS, OPEN_EAR, gaze)));
        }
        outputs
    }

    fn click_count(outputs: &[TrackerOutput]) -> usize {
        outputs.iter().filter(|o| o.click.is_some()).count()
    }

    #[test]
    fn thirty_ms_closure_never_clicks() {
        assert_eq!(click_count(&run_closure(30.0)), 0);
    }

    #[test]
    fn eight_hundred_ms_closure_never_clicks() {
        assert_eq!(click_count(&run_closure(800.0)), 0);
    }

    #[test]
    fn deliberate_blink_clicks_exactly_once() {
        let outputs = run_closure(150.0);
        assert_eq!(click_count(&outputs), 1);

        let click = outputs
            .iter()
            .find_map(|o| o.click)
            .expect("one click present");
        // Click lands on the held pre-closure position.
        assert!((click.x - 0.5 * SCREEN_W).abs() < 1e-6);
        assert!((click.y - 0.5 * SCREEN_H).abs() < 1e-6);
    }
}

mod debounce_invariant {
    use super::*;

    #[test]
    fn clicks_are_never_closer_than_the_cooldown() {
        let mut tracker = calibrated_tracker();
        let gaze = DVec2::new(0.5, 0.5);
        let (mut ts, _) = settle(&mut tracker, 0.0, gaze, 15);

        // Blink furiously: a 150ms closure every 300ms for six seconds.
        let mut click_times = Vec::new();
        let end = ts + 6000.0;
        let mut cycle_start = ts;
        while ts < end {
            let phase = ts - cycle_start;
            let ear = if phase < 150.0 { CLOSED_EAR } else { OPEN_EAR };
            if phase >= 300.0 {
                cycle_start = ts;
            }
            let out = tracker.process(&sample(ts, ear, gaze));
            if out.click.is_some() {
                click_times.push(ts);
            }
            ts += FRAME_MS;
        }

        assert!(click_times.len() >= 2, "expected repeated clicks, got {:?}", click_times);
        for pair in click_times.windows(2) {
            assert!(
                pair[1] - pair[0] >= 600.0,
                "clicks {}ms apart violate the cooldown",
                pair[1] - pair[0]
            );
        }
    }
}

mod fixation_gate {
    use super::*;

    #[test]
    fn blink_while_scanning_is_discarded() {
        let mut tracker = calibrated_tracker();
        // Sweep the gaze across the screen so the candidate buffer is
        // dispersed at closure time.
        let mut ts = 0.0;
        for i in 0..20 {
            let uv = DVec2::new(0.2 + 0.03 * i as f64, 0.4);
            tracker.process(&sample(ts, OPEN_EAR, uv));
            ts += FRAME_MS;
        }

        let close_uv = DVec2::new(0.8, 0.4);
        for _ in 0..5 {
            tracker.process(&sample(ts, CLOSED_EAR, close_uv));
            ts += FRAME_MS;
        }
        let out = tracker.process(&sample(ts, OPEN_EAR, close_uv));
        assert!(out.click.is_none(), "mid-scan blink must not click");
    }
}

mod guided_calibration {
    use super::*;
    use common::CALIBRATION_GRID;

    fn iris_for_target(frac: DVec2) -> DVec2 {
        DVec2::new(0.2 + 0.5 * frac.x, 0.3 + 0.4 * frac.y)
    }

    #[test]
    fn sequence_solves_and_maps_within_tolerance() {
        let mut tracker = GazeTracker::new(TrackerConfig::default(), SCREEN_W, SCREEN_H);
        let idle_uv = DVec2::new(0.45, 0.5);

        // Warm-up first, eyes open and steady.
        let mut ts = 0.0;
        while ts < 2100.0 {
            tracker.process(&sample(ts, OPEN_EAR, idle_uv));
            ts += FRAME_MS;
        }

        tracker.start_calibration();
        assert!(tracker.is_calibrating());

        let mut events = Vec::new();
        let deadline = ts + 20_000.0;
        while ts < deadline {
            let uv = match tracker.active_calibration_point() {
                Some(index) => {
                    let (fx, fy) = CALIBRATION_GRID[index];
                    iris_for_target(DVec2::new(fx, fy))
                }
                None => idle_uv,
            };
            let out = tracker.process(&sample(ts, OPEN_EAR, uv));
            if let Some(ev) = out.calibration {
                events.push(ev);
            }
            ts += FRAME_MS;
            if matches!(events.last(), Some(CalibrationEvent::Finished { .. })) {
                break;
            }
        }

        assert_eq!(
            events.last(),
            Some(&CalibrationEvent::Finished { success: true }),
            "events: {:?}",
            events
        );
        assert!(tracker.is_calibrated());

        let point_indices: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                CalibrationEvent::Point { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(point_indices, (0..CALIBRATION_GRID.len()).collect::<Vec<_>>());

        // Gaze at the lower-right grid point: the cursor must converge on
        // its exact screen position.
        let target_frac = DVec2::new(0.9, 0.9);
        let expected = target_frac * DVec2::new(SCREEN_W, SCREEN_H);
        let (_, out) = settle(&mut tracker, ts, iris_for_target(target_frac), 80);
        assert!(
            (out.x - expected.x).abs() < 1e-6 && (out.y - expected.y).abs() < 1e-6,
            "converged to ({}, {}), expected {:?}",
            out.x,
            out.y,
            expected
        );
        assert!(out.calibrated);
    }

    #[test]
    fn abort_falls_back_without_partial_coefficients() {
        let mut tracker = GazeTracker::new(TrackerConfig::default(), SCREEN_W, SCREEN_H);
        let (ts, _) = settle(&mut tracker, 0.0, DVec2::new(0.5, 0.5), 80);

        tracker.start_calibration();
        // A few frames into the first dwell, then abandon.
        let (ts, _) = settle(&mut tracker, ts, DVec2::new(0.3, 0.3), 5);
        tracker.abort_calibration();

        assert!(!tracker.is_calibrating());
        assert!(!tracker.is_calibrated());
        let out = tracker.process(&sample(ts, OPEN_EAR, DVec2::new(0.5, 0.5)));
        assert!(!out.calibrated);
        assert_eq!(out.calibration, Some(CalibrationEvent::Finished { success: false }));
    }
}

mod screen_resize {
    use super::*;

    #[test]
    fn resize_reclamps_without_dropping_calibration() {
        let mut tracker = calibrated_tracker();
        let (_, out) = settle(&mut tracker, 0.0, DVec2::new(0.95, 0.95), 40);
        assert!(out.x > 1280.0);

        tracker.set_screen_size(1280.0, 720.0);
        assert!(tracker.is_calibrated());

        let out = tracker.process(&sample(10_000.0, OPEN_EAR, DVec2::new(0.95, 0.95)));
        assert!(out.x <= 1280.0 && out.y <= 720.0);
        assert!(out.calibrated);
    }
}

mod degraded_input {
    use super::*;

    #[test]
    fn empty_samples_do_not_halt_tracking() {
        let mut tracker = calibrated_tracker();
        let (mut ts, before) = settle(&mut tracker, 0.0, DVec2::new(0.5, 0.5), 15);

        // Detector dropout: frames with no landmarks at all.
        for _ in 0..10 {
            let out = tracker.process(&LandmarkSample::new(ts));
            assert!(out.x.is_finite() && out.y.is_finite());
            assert!(out.click.is_none());
            ts += FRAME_MS;
        }

        // Recovery: tracking resumes where it left off.
        let out = tracker.process(&sample(ts, OPEN_EAR, DVec2::new(0.5, 0.5)));
        assert!((out.x - before.x).abs() < SCREEN_W);
    }

    #[test]
    fn non_monotonic_timestamps_are_tolerated() {
        let mut tracker = calibrated_tracker();
        let gaze = DVec2::new(0.5, 0.5);
        tracker.process(&sample(100.0, OPEN_EAR, gaze));
        // Duplicate and regressing clocks.
        let out = tracker.process(&sample(100.0, OPEN_EAR, gaze));
        assert!(out.x.is_finite());
        let out = tracker.process(&sample(40.0, OPEN_EAR, gaze));
        assert!(out.x.is_finite());
    }
}
