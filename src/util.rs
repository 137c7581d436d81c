pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// `part / whole` as a percentage rounded to one decimal; 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> f64 {
    match whole {
        0 => 0.0,
        _ => (f64::from(part) / f64::from(whole) * 1000.0).round() / 10.0,
    }
}
