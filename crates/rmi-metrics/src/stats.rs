//! Small descriptive-statistics helpers. Inputs are never reordered in place.

#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(sum_sq / values.len() as f64)
}

/// Returns a sorted copy of `values` (total order, so NaN-free input sorts stably).
pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile `q` in `[0, 1]` of already-sorted values, linearly interpolated
/// between the closest ranks.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Round to 4 decimal places so serialized aggregates stay compact.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(variance(&[]), None);
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(variance(&values), Some(4.0));
    }

    #[test]
    fn single_value_has_zero_variance() {
        assert_eq!(variance(&[3.5]), Some(0.0));
    }

    #[test]
    fn quantiles_interpolate_between_ranks() {
        let values = sorted(&[40.0, 10.0, 30.0, 20.0]);
        assert_eq!(quantile_sorted(&values, 0.0), Some(10.0));
        assert_eq!(quantile_sorted(&values, 0.5), Some(25.0));
        assert_eq!(quantile_sorted(&values, 1.0), Some(40.0));
        assert_eq!(quantile_sorted(&values, 0.25), Some(17.5));
    }

    #[test]
    fn round4_trims_noise() {
        assert_eq!(round4(0.1 + 0.2), 0.3);
        assert_eq!(round4(1.234_567), 1.2346);
    }
}
