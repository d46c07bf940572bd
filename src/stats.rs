use crate::models::{SeriesStats, TimeSeriesPoint};

/// Mean, max, min and first-half/second-half trend over non-null values.
///
/// Points are sorted by year before the halves are taken. For an odd count
/// the middle value belongs to the first half. A zero first-half average
/// leaves the trend undefined rather than infinite.
pub fn series_stats(points: &[TimeSeriesPoint]) -> SeriesStats {
    let mut sorted: Vec<&TimeSeriesPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.year);
    let values: Vec<f64> = sorted
        .iter()
        .filter_map(|p| p.value)
        .filter(|v| v.is_finite())
        .collect();
    stats_of(&values)
}

pub fn stats_of(values: &[f64]) -> SeriesStats {
    if values.is_empty() {
        return SeriesStats::default();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    SeriesStats {
        mean: Some(mean),
        max: Some(max),
        min: Some(min),
        trend: trend(values),
    }
}

/// Percentage change from the first-half average to the second-half average.
pub fn trend(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let split = values.len().div_ceil(2);
    let (first, second) = values.split_at(split);
    let first_avg = average(first)?;
    let second_avg = average(second)?;
    if first_avg == 0.0 {
        return None;
    }
    Some((second_avg - first_avg) / first_avg * 100.0)
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Mean year-over-year change across a series' non-null values.
pub fn mean_slope(points: &[TimeSeriesPoint]) -> f64 {
    let known: Vec<(i32, f64)> = points
        .iter()
        .filter_map(|p| p.value.map(|v| (p.year, v)))
        .collect();
    match (known.first(), known.last()) {
        (Some(&(y0, v0)), Some(&(y1, v1))) if y1 > y0 => (v1 - v0) / (y1 - y0) as f64,
        _ => 0.0,
    }
}
