use super::error::MatrixError;
use super::matrix::DistanceMatrix;
use rayon::prelude::*;

/// Pearson correlation over the positions where both vectors hold a value.
///
/// Returns the coefficient and the number of shared values, or `None` when
/// fewer than two values are shared, either side has zero variance, or a
/// value is not finite. The coefficient is clamped to `[-1, 1]`.
///
/// # Example
/// ```
/// use slink::libs::corr::pearson;
/// let x = [Some(1.0), Some(2.0), None, Some(3.0)];
/// let y = [Some(2.0), Some(4.0), Some(9.0), Some(6.0)];
/// let (r, n) = pearson(&x, &y).unwrap();
/// assert!((r - 1.0).abs() < 1e-12);
/// assert_eq!(n, 3);
/// ```
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<(f64, usize)> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        })
        .collect();

    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let scale_x = binary_scale(pairs.iter().map(|p| p.0));
    let scale_y = binary_scale(pairs.iter().map(|p| p.1));
    if scale_x == 0.0 || scale_y == 0.0 {
        return None;
    }

    let mean_x = pairs.iter().map(|p| p.0 / scale_x).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1 / scale_y).sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in &pairs {
        let dx = a / scale_x - mean_x;
        let dy = b / scale_y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = sxy / (sxx * syy).sqrt();
    if !r.is_finite() {
        return None;
    }
    Some((r.clamp(-1.0, 1.0), n))
}

/// Power of two at or below the largest magnitude in `values`, or zero when
/// all are zero. Dividing by it is exact and keeps squared deviations finite.
fn binary_scale(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, |m, v| m.max(v.abs()));
    if max == 0.0 || !max.is_finite() {
        return max;
    }
    let exp = (max.log2().floor() as i32).clamp(-1000, 1000);
    2.0_f64.powi(exp)
}

/// Distance derived from a correlation: `1 - r`, floored at zero.
/// An undefined correlation counts as no correlation.
pub fn correlation_distance(r: Option<f64>) -> f64 {
    match r {
        Some(r) => {
            let d = 1.0 - r;
            if d < 0.0 {
                0.0
            } else {
                d
            }
        }
        None => 1.0,
    }
}

/// Build the correlation distance matrix of `vectors`, one row per vector.
///
/// The upper triangle is computed in parallel and mirrored, so the result
/// is symmetric by construction.
///
/// # Example
/// ```
/// use slink::libs::corr::correlation_distances;
/// let vectors = vec![
///     vec![Some(1.0), Some(2.0), Some(3.0)],
///     vec![Some(3.0), Some(2.0), Some(1.0)],
/// ];
/// let m = correlation_distances(&vectors).unwrap();
/// assert_eq!(m.get(0, 0), 0.0);
/// assert!((m.get(0, 1) - 2.0).abs() < 1e-12);
/// ```
pub fn correlation_distances(vectors: &[Vec<Option<f64>>]) -> Result<DistanceMatrix, MatrixError> {
    let n = vectors.len();

    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| {
                    let r = pearson(&vectors[i], &vectors[j]);
                    if r.is_none() {
                        log::warn!("Correlation of vectors {} and {} is undefined", i, j);
                    }
                    correlation_distance(r.map(|(r, _)| r))
                })
                .collect()
        })
        .collect();

    let mut rows = vec![vec![0.0; n]; n];
    for (i, tail) in upper.iter().enumerate() {
        for (offset, &d) in tail.iter().enumerate() {
            let j = i + 1 + offset;
            rows[i][j] = d;
            rows[j][i] = d;
        }
    }

    log::debug!("Computed {}x{} correlation distances", n, n);
    DistanceMatrix::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn some(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().map(|&x| Some(x)).collect()
    }

    #[test]
    fn pearson_known_value() {
        let x = some(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = some(&[2.0, 1.0, 4.0, 3.0, 5.0]);
        let (r, n) = pearson(&x, &y).unwrap();
        assert_relative_eq!(r, 0.8, epsilon = 1e-12);
        assert_eq!(n, 5);
    }

    #[test]
    fn pearson_undefined() {
        assert!(pearson(&some(&[1.0]), &some(&[2.0])).is_none());
        assert!(pearson(&some(&[1.0, 1.0, 1.0]), &some(&[1.0, 2.0, 3.0])).is_none());
        assert!(pearson(&[Some(1.0), None], &[None, Some(2.0)]).is_none());
    }

    #[test]
    fn pearson_large_magnitudes() {
        let (r, n) = pearson(&some(&[1e200, 2e200, 3e200]), &some(&[1.0, 2.0, 3.0])).unwrap();
        assert_relative_eq!(r, 1.0, epsilon = 1e-12);
        assert_eq!(n, 3);

        let (r, _) = pearson(&some(&[-1e300, 0.0, 1e300]), &some(&[3e-300, 2e-300, 1e-300])).unwrap();
        assert_relative_eq!(r, -1.0, epsilon = 1e-12);

        let m = correlation_distances(&[some(&[1e200, 2e200, 3e200]), some(&[1.0, 2.0, 3.0])]).unwrap();
        assert!(m.get(0, 1) < 1e-12);
    }

    #[test]
    fn pearson_non_finite() {
        let y = some(&[1.0, 2.0, 3.0]);
        assert!(pearson(&some(&[1.0, 2.0, f64::INFINITY]), &y).is_none());
        assert!(pearson(&some(&[f64::NEG_INFINITY, 2.0, 3.0]), &y).is_none());
        assert!(pearson(&some(&[1.0, f64::NAN, 3.0]), &y).is_none());

        let m = correlation_distances(&[some(&[1.0, 2.0, f64::INFINITY]), y]).unwrap();
        assert_eq!(m.get(0, 1), 1.0);
    }

    #[test]
    fn distance_floor() {
        assert_eq!(correlation_distance(Some(1.0 + 1e-9)), 0.0);
        assert_relative_eq!(correlation_distance(Some(-0.5)), 1.5);
        assert_eq!(correlation_distance(None), 1.0);
    }

    #[test]
    fn matrix_is_valid() {
        let vectors = vec![
            some(&[1.0, 2.0, 3.0, 4.0]),
            some(&[2.0, 4.0, 6.0, 8.1]),
            some(&[4.0, 3.0, 2.0, 1.0]),
            vec![Some(5.0), None, Some(5.0), Some(5.0)],
        ];
        let m = correlation_distances(&vectors).unwrap();
        assert_eq!(m.size(), 4);
        for i in 0..4 {
            assert_eq!(m.get(i, i), 0.0);
            for j in 0..4 {
                assert_eq!(m.get(i, j), m.get(j, i));
                assert!(m.get(i, j) >= 0.0);
            }
        }
        assert!(m.get(0, 1) < 0.01);
        assert_relative_eq!(m.get(0, 2), 2.0, epsilon = 1e-12);
        assert_eq!(m.get(0, 3), 1.0);
    }

    #[test]
    fn no_vectors() {
        assert_eq!(correlation_distances(&[]).unwrap_err().kind(), "Empty");
    }
}
