//! Descriptive grouping by behavior class

use std::collections::BTreeMap;

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::types::{BehaviorClass, ClassSummary, ClassUsageProfile, DerivedObservation, Metric};

/// Mean (with spread) of a metric per behavior class.
///
/// Records whose metric is undefined or missing are skipped. Classes without
/// contributing records are absent from the mapping.
pub fn mean_by_class(
    records: &[DerivedObservation],
    metric: Metric,
) -> BTreeMap<BehaviorClass, ClassSummary> {
    let mut groups: BTreeMap<BehaviorClass, Vec<f64>> = BTreeMap::new();

    for record in records {
        if let Some(value) = metric.value(record).filter(|v| v.is_finite()) {
            groups
                .entry(record.observation.user_behavior_class)
                .or_default()
                .push(value);
        }
    }

    groups
        .into_iter()
        .filter_map(|(class, values)| summarize(&values).map(|s| (class, s)))
        .collect()
}

/// App usage and screen-on time per class, both in minutes/day
pub fn usage_minutes_by_class(records: &[DerivedObservation]) -> Vec<ClassUsageProfile> {
    let app_usage = mean_by_class(records, Metric::AppUsageMinutes);
    let mut screen_on = mean_by_class(records, Metric::ScreenOnMinutes);

    app_usage
        .into_iter()
        .filter_map(|(behavior_class, app_usage)| {
            screen_on
                .remove(&behavior_class)
                .map(|screen_on| ClassUsageProfile {
                    behavior_class,
                    app_usage,
                    screen_on,
                })
        })
        .collect()
}

/// Count, mean, sample standard deviation, standard error and 95% interval
pub fn summarize(values: &[f64]) -> Option<ClassSummary> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std_dev = sample_std_dev(values, mean);
    let std_error = std_dev.map(|sd| sd / n.sqrt());
    let half_width = std_error.and_then(|se| t_critical_975(n - 1.0).map(|t| t * se));

    Some(ClassSummary {
        count: values.len(),
        mean,
        std_dev,
        std_error,
        ci95_lower: half_width.map(|h| mean - h),
        ci95_upper: half_width.map(|h| mean + h),
    })
}

fn t_critical_975(df: f64) -> Option<f64> {
    StudentsT::new(0.0, 1.0, df)
        .ok()
        .map(|dist| dist.inverse_cdf(0.975))
        .filter(|t| t.is_finite())
}

pub(crate) fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_metrics;
    use crate::types::{Demographics, Observation};
    use pretty_assertions::assert_eq;

    fn make_observation(class: u8, app_min: f64, screen_hours: f64) -> Observation {
        Observation {
            app_usage_time_min_per_day: app_min,
            screen_on_time_hours_per_day: screen_hours,
            number_of_apps_installed: 20,
            user_behavior_class: BehaviorClass::new(class).unwrap(),
            demographics: Demographics::default(),
        }
    }

    fn class(value: u8) -> BehaviorClass {
        BehaviorClass::new(value).unwrap()
    }

    #[test]
    fn test_mean_by_class() {
        let records = derive_metrics(&[
            make_observation(1, 40.0, 1.0),
            make_observation(1, 60.0, 2.0),
            make_observation(5, 540.0, 10.0),
        ])
        .unwrap();

        let means = mean_by_class(&records, Metric::AppUsageMinutes);
        assert_eq!(means.len(), 2);

        let low = &means[&class(1)];
        assert_eq!(low.count, 2);
        assert_eq!(low.mean, 50.0);
        // sample std of [40, 60] = sqrt(200)
        assert!((low.std_dev.unwrap() - 200f64.sqrt()).abs() < 1e-12);
        assert!((low.std_error.unwrap() - 10.0).abs() < 1e-12);

        // t(0.975, df = 1) = 12.7062
        assert!((low.ci95_lower.unwrap() - (50.0 - 127.062)).abs() < 1e-2);
        assert!((low.ci95_upper.unwrap() - (50.0 + 127.062)).abs() < 1e-2);

        let high = &means[&class(5)];
        assert_eq!(high.count, 1);
        assert_eq!(high.std_dev, None);
        assert_eq!(high.ci95_lower, None);
        assert!(!means.contains_key(&class(3)));
    }

    #[test]
    fn test_interval_narrows_with_more_members() {
        let small = summarize(&[10.0, 20.0, 30.0]).unwrap();
        let large = summarize(&[10.0, 20.0, 30.0, 10.0, 20.0, 30.0, 10.0, 20.0, 30.0]).unwrap();

        let width = |s: &ClassSummary| s.ci95_upper.unwrap() - s.ci95_lower.unwrap();
        assert!(small.ci95_lower.unwrap() < small.mean && small.mean < small.ci95_upper.unwrap());
        assert!(width(&large) < width(&small));
    }

    #[test]
    fn test_undefined_ratios_are_skipped() {
        let records = derive_metrics(&[
            make_observation(2, 60.0, 2.0),
            make_observation(2, 30.0, 0.0),
            make_observation(4, 10.0, 0.0),
        ])
        .unwrap();

        let ratios = mean_by_class(&records, Metric::EngagementRatio);
        assert_eq!(ratios[&class(2)].count, 1);
        assert_eq!(ratios[&class(2)].mean, 0.5);
        // Class 4 has no defined ratio at all
        assert!(!ratios.contains_key(&class(4)));
    }

    #[test]
    fn test_missing_demographic_metric() {
        let records = derive_metrics(&[make_observation(3, 60.0, 2.0)]).unwrap();
        assert!(mean_by_class(&records, Metric::Age).is_empty());
    }

    #[test]
    fn test_empty_input_gives_empty_mapping() {
        assert!(mean_by_class(&[], Metric::ScreenOnMinutes).is_empty());
        assert!(usage_minutes_by_class(&[]).is_empty());
    }

    #[test]
    fn test_usage_minutes_by_class() {
        let records = derive_metrics(&[
            make_observation(1, 40.0, 1.0),
            make_observation(3, 200.0, 5.0),
            make_observation(3, 220.0, 6.0),
        ])
        .unwrap();

        let profile = usage_minutes_by_class(&records);
        assert_eq!(profile.len(), 2);
        assert_eq!(profile[0].behavior_class, class(1));
        assert_eq!(profile[0].screen_on.mean, 60.0);
        assert_eq!(profile[1].app_usage.mean, 210.0);
        assert_eq!(profile[1].screen_on.mean, 330.0);
    }
}
