use serde::Serialize;

/// Ordinary least-squares fit of `y = slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Returns `None` when the inputs differ in length, hold fewer than two points, or `x` has
/// no variance (the slope is undefined).
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut sst = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        sst += dy * dy;
    }
    if sxx <= f64::EPSILON * n {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let resid = yi - (intercept + slope * xi);
            resid * resid
        })
        .sum();

    // A constant target is reproduced exactly by a zero-slope line.
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn exact_line_is_recovered_with_unit_r_squared() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let fit = linear_regression(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < TOLERANCE);
        assert!((fit.intercept + 1.0).abs() < TOLERANCE);
        assert!((fit.r_squared - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn noisy_data_gives_r_squared_below_one() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.5, 1.5, 3.0];
        let fit = linear_regression(&x, &y).unwrap();
        assert!(fit.r_squared < 1.0);
        assert!(fit.r_squared > 0.0);
        assert!((fit.slope - 0.9).abs() < TOLERANCE);
        assert!((fit.intercept - 0.15).abs() < TOLERANCE);
    }

    #[test]
    fn constant_x_has_no_fit() {
        assert!(linear_regression(&[1.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_none());
    }

    #[test]
    fn constant_y_is_a_perfect_flat_fit() {
        let fit = linear_regression(&[0.0, 1.0, 2.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 4.0);
        assert_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn mismatched_or_short_input_has_no_fit() {
        assert!(linear_regression(&[0.0, 1.0], &[0.0]).is_none());
        assert!(linear_regression(&[0.0], &[0.0]).is_none());
    }
}
