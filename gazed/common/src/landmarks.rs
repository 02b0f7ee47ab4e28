use api::{LandmarkSample, LEFT_EYE_RING, LEFT_IRIS, RIGHT_IRIS};
use glam::DVec2;

const MIN_EYE_SPAN: f64 = 1e-6;

/// Eye aspect ratio over the six left-eye socket points:
/// `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`. Drops sharply when the lid
/// closes. Returns `None` when the horizontal span is degenerate, which
/// happens when the detector delivered nothing and every point collapsed to
/// the neutral substitute.
pub fn eye_aspect_ratio(sample: &LandmarkSample) -> Option<f64> {
    let p: Vec<DVec2> = LEFT_EYE_RING.iter().map(|&i| sample.point(i)).collect();
    let span = p[0].distance(p[3]);
    if span < MIN_EYE_SPAN {
        return None;
    }
    let vertical = p[1].distance(p[5]) + p[2].distance(p[4]);
    Some(vertical / (2.0 * span))
}

fn centroid(sample: &LandmarkSample, indices: &[u16]) -> DVec2 {
    let sum: DVec2 = indices.iter().map(|&i| sample.point(i)).sum();
    sum / indices.len() as f64
}

/// Gaze proxy: mean of the two iris-boundary centroids, in normalized frame
/// coordinates.
pub fn iris_center(sample: &LandmarkSample) -> DVec2 {
    let left = centroid(sample, &LEFT_IRIS);
    let right = centroid(sample, &RIGHT_IRIS);
    (left + right) * 0.5
}

/// Offset of the left iris from its socket center. Near zero when looking
/// straight at the camera; used by the uncalibrated relative-motion
/// fallback.
pub fn gaze_offset(sample: &LandmarkSample) -> DVec2 {
    centroid(sample, &LEFT_IRIS) - centroid(sample, &LEFT_EYE_RING)
}
