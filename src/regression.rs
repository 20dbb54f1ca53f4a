//! Screen-time regression
//!
//! Ordinary least squares of screen-on minutes on installed-app count, with an
//! intercept. Results are recomputed from the supplied records on every call.

use crate::error::AnalysisError;
use crate::types::{DerivedObservation, RegressionResult};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Minimum number of points for a defined fit
pub const MIN_REGRESSION_OBSERVATIONS: usize = 2;

/// Fit screen-on time (min/day) against number of installed apps.
///
/// # Errors
/// * `InsufficientObservations` with fewer than two records
/// * `DegenerateInput` when every record has the same app count
pub fn fit_screen_time_model(
    records: &[DerivedObservation],
) -> Result<RegressionResult, AnalysisError> {
    let x: Vec<f64> = records
        .iter()
        .map(|r| r.observation.number_of_apps_installed as f64)
        .collect();
    let y: Vec<f64> = records.iter().map(|r| r.screen_on_time_min_per_day).collect();

    let result = fit_ols(&x, &y)?;
    tracing::debug!(
        slope = result.slope,
        intercept = result.intercept,
        r_squared = result.r_squared,
        "fitted screen time model"
    );
    Ok(result)
}

/// Closed-form single-predictor OLS with intercept
pub fn fit_ols(x: &[f64], y: &[f64]) -> Result<RegressionResult, AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::DegenerateInput(format!(
            "predictor has {} values but response has {}",
            x.len(),
            y.len()
        )));
    }

    let n = x.len();
    if n < MIN_REGRESSION_OBSERVATIONS {
        return Err(AnalysisError::InsufficientObservations {
            required: MIN_REGRESSION_OBSERVATIONS,
            actual: n,
        });
    }

    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(AnalysisError::DegenerateInput(
            "regression input contains non-finite values".to_string(),
        ));
    }

    let n_f = n as f64;
    let mean_x = x.iter().sum::<f64>() / n_f;
    let mean_y = y.iter().sum::<f64>() / n_f;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx == 0.0 {
        return Err(AnalysisError::DegenerateInput(
            "predictor has zero variance".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| {
            let residual = yi - (intercept + slope * xi);
            residual * residual
        })
        .sum();

    // A constant response is fitted exactly by the horizontal line
    let r_squared = if syy == 0.0 {
        1.0
    } else {
        (1.0 - ss_res / syy).clamp(0.0, 1.0)
    };

    let mut result = RegressionResult {
        intercept,
        slope,
        r_squared,
        adjusted_r_squared: None,
        residual_std_error: None,
        slope_std_error: None,
        slope_t_statistic: None,
        slope_p_value: None,
        observations: n,
    };

    let df = n - 2;
    if df > 0 {
        let df_f = df as f64;
        let sigma2 = ss_res / df_f;
        let slope_se = (sigma2 / sxx).sqrt();

        result.adjusted_r_squared = Some(1.0 - (1.0 - r_squared) * (n_f - 1.0) / df_f);
        result.residual_std_error = Some(sigma2.sqrt());
        result.slope_std_error = Some(slope_se);

        if slope_se > 0.0 {
            let t = slope / slope_se;
            result.slope_t_statistic = Some(t);
            result.slope_p_value = Some(two_sided_t_p_value(t, df_f)?);
        } else if slope != 0.0 {
            result.slope_p_value = Some(0.0);
        }
    }

    Ok(result)
}

/// Two-sided p-value of a t statistic
pub(crate) fn two_sided_t_p_value(t: f64, df: f64) -> Result<f64, AnalysisError> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| AnalysisError::Statistic(e.to_string()))?;
    Ok((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_metrics;
    use crate::types::{BehaviorClass, Demographics, Observation};

    fn make_records(apps: &[u32], screen_min: &[f64]) -> Vec<DerivedObservation> {
        let observations: Vec<Observation> = apps
            .iter()
            .zip(screen_min)
            .map(|(&a, &m)| Observation {
                app_usage_time_min_per_day: m * 0.8,
                screen_on_time_hours_per_day: m / 60.0,
                number_of_apps_installed: a,
                user_behavior_class: BehaviorClass::new(2).unwrap(),
                demographics: Demographics::default(),
            })
            .collect();
        derive_metrics(&observations).unwrap()
    }

    #[test]
    fn test_exact_linear_fit() {
        let x = [10.0, 20.0, 30.0, 40.0, 50.0];
        let y = [100.0, 165.0, 230.0, 295.0, 360.0];
        let result = fit_ols(&x, &y).unwrap();

        assert_eq!(result.slope, 6.5);
        assert_eq!(result.intercept, 35.0);
        assert_eq!(result.r_squared, 1.0);
        assert_eq!(result.observations, 5);
        assert_eq!(result.slope_p_value, Some(0.0));
        assert_eq!(result.predict(60.0), 425.0);
    }

    #[test]
    fn test_screen_time_model_from_records() {
        let records = make_records(&[10, 20, 30, 40, 50], &[100.0, 165.0, 230.0, 295.0, 360.0]);
        let result = fit_screen_time_model(&records).unwrap();

        assert!((result.slope - 6.5).abs() < 1e-9);
        assert!((result.intercept - 35.0).abs() < 1e-6);
        assert!((result.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_recovers_noisy_slope() {
        let x: Vec<f64> = (0..200).map(|i| (10 + i % 90) as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, xi)| {
                let noise = ((i * 7919) % 13) as f64 / 13.0 - 0.5;
                50.0 + 6.5 * xi + noise
            })
            .collect();

        let result = fit_ols(&x, &y).unwrap();
        assert!((result.slope - 6.5).abs() < 0.01);
        assert!((result.intercept - 50.0).abs() < 1.0);
        assert!(result.r_squared > 0.95);
        assert!(result.slope_p_value.unwrap() < 1e-6);
        assert!(result.slope_t_statistic.unwrap() > 0.0);
    }

    #[test]
    fn test_idempotent() {
        let x = [3.0, 8.0, 1.0, 9.0, 4.0, 7.0];
        let y = [12.0, 30.5, 8.0, 33.0, 19.5, 22.0];
        let first = fit_ols(&x, &y).unwrap();
        let second = fit_ols(&x, &y).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_fit_statistics() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 5.0, 4.0];
        let result = fit_ols(&x, &y).unwrap();

        // mean_x = 2.5, mean_y = 3.75, sxy = 3.5, sxx = 5, syy = 4.75
        assert!((result.slope - 0.7).abs() < 1e-12);
        assert!((result.intercept - 2.0).abs() < 1e-12);
        // ss_res = 4.75 - 0.7 * 3.5 = 2.3
        assert!((result.r_squared - (1.0 - 2.3 / 4.75)).abs() < 1e-12);
        assert!(result.r_squared > 0.0 && result.r_squared < 1.0);
        let p = result.slope_p_value.unwrap();
        assert!(p > 0.05 && p < 1.0);
    }

    #[test]
    fn test_constant_predictor_is_degenerate() {
        let records = make_records(&[25, 25, 25], &[100.0, 200.0, 300.0]);
        assert!(matches!(
            fit_screen_time_model(&records),
            Err(AnalysisError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_constant_response_is_perfect_fit() {
        let result = fit_ols(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(result.slope, 0.0);
        assert_eq!(result.r_squared, 1.0);
        assert_eq!(result.slope_p_value, None);
    }

    #[test]
    fn test_two_points() {
        let result = fit_ols(&[1.0, 3.0], &[2.0, 6.0]).unwrap();
        assert_eq!(result.slope, 2.0);
        assert_eq!(result.intercept, 0.0);
        assert_eq!(result.adjusted_r_squared, None);
        assert_eq!(result.slope_p_value, None);
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            fit_ols(&[1.0], &[2.0]),
            Err(AnalysisError::InsufficientObservations { required: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            fit_ols(&[1.0, 2.0], &[2.0]),
            Err(AnalysisError::DegenerateInput(_))
        ));
    }
}
