use glam::DVec2;

/// Median of a scalar slice. Averages the two middle values on even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) * 0.5)
    }
}

/// Component-wise median of a point set.
pub fn median_point(points: &[DVec2]) -> Option<DVec2> {
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    Some(DVec2::new(median(&xs)?, median(&ys)?))
}

/// Median absolute deviation: median Euclidean distance from each point to
/// the set's component-wise median. Robust to single-frame outliers where
/// variance is not.
pub fn mad(points: &[DVec2]) -> Option<f64> {
    let center = median_point(points)?;
    let distances: Vec<f64> = points.iter().map(|p| p.distance(center)).collect();
    median(&distances)
}
