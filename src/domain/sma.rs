//! Simple moving average over a window snapshot.
//!
//! An empty window averages to `0.0`. Downstream, that value means
//! "insufficient data" and forces a HOLD signal.

pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn single_value() {
        assert!((average(&[42.5]) - 42.5).abs() < f64::EPSILON);
    }

    #[test]
    fn three_values() {
        let v = average(&[10.0, 20.0, 45.0]);
        assert!((v - 25.0).abs() < 1e-12);
    }

    #[test]
    fn fractional_mean() {
        let v = average(&[1.0, 2.0]);
        assert!((v - 1.5).abs() < f64::EPSILON);
    }
}
