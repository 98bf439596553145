//! Numeric building blocks shared by the profiler, charts and regression.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1), `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile `q` in [0, 1] of already sorted values, linearly interpolated
/// between the two closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Pearson correlation over the rows where both sides are present.
///
/// `None` when fewer than two complete pairs exist or either side is constant.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;
    for &(a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    if den_x == 0.0 || den_y == 0.0 {
        return None;
    }
    Some((num / (den_x * den_y).sqrt()).clamp(-1.0, 1.0))
}

/// Equal-width histogram buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` ascending bucket edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bucket `values` into `bins` equal-width buckets spanning their range.
    /// The last bucket is closed on the right. A constant sample is centred
    /// in a unit-wide range.
    pub fn build(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

        let (mut lo, mut hi) = finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if finite.is_empty() {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for v in finite {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Histogram { edges, counts }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_and_sample_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(mean(&v).unwrap(), 5.0));
        // Sample std of this classic set is sqrt(32 / 7).
        assert!(close(sample_std(&v).unwrap(), (32.0f64 / 7.0).sqrt()));
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_quantile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile_sorted(&v, 0.25).unwrap(), 1.75));
        assert!(close(quantile_sorted(&v, 0.5).unwrap(), 2.5));
        assert!(close(quantile_sorted(&v, 0.75).unwrap(), 3.25));
        assert!(close(quantile_sorted(&v, 1.0).unwrap(), 4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_pearson_uses_complete_pairs() {
        let x = [Some(1.0), Some(2.0), None, Some(4.0)];
        let y = [Some(2.0), Some(4.0), Some(100.0), Some(8.0)];
        assert!(close(pearson(&x, &y).unwrap(), 1.0));

        let neg = [Some(8.0), Some(6.0), Some(0.0), Some(2.0)];
        assert!(close(pearson(&x, &neg).unwrap(), -1.0));

        let constant = [Some(3.0), Some(3.0), Some(3.0), Some(3.0)];
        assert_eq!(pearson(&x, &constant), None);
    }

    #[test]
    fn test_histogram_buckets() {
        let h = Histogram::build(&[0.0, 1.0, 2.0, 3.0, 4.0, 10.0], 5);
        assert_eq!(h.edges.len(), 6);
        assert_eq!(h.counts, vec![2, 2, 1, 0, 1]);
        assert_eq!(h.counts.iter().sum::<usize>(), 6);
        assert_eq!(h.max_count(), 2);
    }

    #[test]
    fn test_histogram_constant_sample() {
        let h = Histogram::build(&[3.0, 3.0], 10);
        assert!(close(h.edges[0], 2.5));
        assert!(close(h.edges[10], 3.5));
        assert_eq!(h.counts.iter().sum::<usize>(), 2);
    }
}
