//! Demographic significance tests
//!
//! Checks whether usage intensity differs by gender:
//! - Pooled-variance two-sample t-test on app usage between the two largest gender groups
//! - Chi-square test of independence between gender and behavior class

use std::collections::{BTreeMap, BTreeSet};

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::AnalysisError;
use crate::regression::two_sided_t_p_value;
use crate::types::{
    BehaviorClass, ChiSquareResult, ClassAssociation, DemographicFindings, DerivedObservation,
    GenderComparison, Metric, TTestResult,
};

/// Student two-sample t-test assuming equal variances
pub fn two_sample_t_test(a: &[f64], b: &[f64]) -> Result<TTestResult, AnalysisError> {
    let smallest = a.len().min(b.len());
    if smallest < 2 {
        return Err(AnalysisError::InsufficientObservations {
            required: 2,
            actual: smallest,
        });
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let mean_a = a.iter().sum::<f64>() / na;
    let mean_b = b.iter().sum::<f64>() / nb;
    let ss_a: f64 = a.iter().map(|v| (v - mean_a).powi(2)).sum();
    let ss_b: f64 = b.iter().map(|v| (v - mean_b).powi(2)).sum();

    let df = na + nb - 2.0;
    let pooled_variance = (ss_a + ss_b) / df;
    let std_error = (pooled_variance * (1.0 / na + 1.0 / nb)).sqrt();
    if !(std_error > 0.0) {
        return Err(AnalysisError::DegenerateInput(
            "both groups have zero variance".to_string(),
        ));
    }

    let t_statistic = (mean_a - mean_b) / std_error;
    Ok(TTestResult {
        t_statistic,
        degrees_of_freedom: df,
        p_value: two_sided_t_p_value(t_statistic, df)?,
        mean_a,
        mean_b,
    })
}

/// Chi-square test of independence on a contingency table of counts.
///
/// Applies the Yates continuity correction when there is one degree of freedom.
pub fn chi_square_independence(table: &[Vec<u64>]) -> Result<ChiSquareResult, AnalysisError> {
    let rows = table.len();
    let cols = table.first().map_or(0, Vec::len);
    if rows < 2 || cols < 2 {
        return Err(AnalysisError::DegenerateInput(format!(
            "contingency table must be at least 2x2, got {}x{}",
            rows, cols
        )));
    }
    if table.iter().any(|row| row.len() != cols) {
        return Err(AnalysisError::DegenerateInput(
            "contingency table rows differ in length".to_string(),
        ));
    }

    let row_totals: Vec<f64> = table
        .iter()
        .map(|row| row.iter().sum::<u64>() as f64)
        .collect();
    let col_totals: Vec<f64> = (0..cols)
        .map(|c| table.iter().map(|row| row[c]).sum::<u64>() as f64)
        .collect();
    if row_totals.iter().chain(&col_totals).any(|&t| t == 0.0) {
        return Err(AnalysisError::DegenerateInput(
            "contingency table has an empty row or column".to_string(),
        ));
    }
    let total: f64 = row_totals.iter().sum();

    let degrees_of_freedom = (rows - 1) * (cols - 1);
    let yates_corrected = degrees_of_freedom == 1;

    let mut chi_square = 0.0;
    for (r, row) in table.iter().enumerate() {
        for (c, &count) in row.iter().enumerate() {
            let expected = row_totals[r] * col_totals[c] / total;
            let mut diff = (count as f64 - expected).abs();
            if yates_corrected {
                diff = (diff - 0.5).max(0.0);
            }
            chi_square += diff * diff / expected;
        }
    }

    let dist = ChiSquared::new(degrees_of_freedom as f64)
        .map_err(|e| AnalysisError::Statistic(e.to_string()))?;
    let p_value = (1.0 - dist.cdf(chi_square)).clamp(0.0, 1.0);

    Ok(ChiSquareResult {
        chi_square,
        degrees_of_freedom,
        p_value,
        yates_corrected,
    })
}

/// Run the demographic tests; findings that cannot be computed are left empty
pub fn demographic_findings(
    records: &[DerivedObservation],
    significance_level: f64,
) -> DemographicFindings {
    DemographicFindings {
        significance_level,
        usage_by_gender: compare_usage_by_gender(records, Metric::AppUsageMinutes, significance_level),
        gender_by_class: gender_class_association(records, significance_level),
    }
}

fn gender_of(record: &DerivedObservation) -> Option<&str> {
    record.observation.demographics.gender.as_deref()
}

/// Gender groups ordered by size (descending), then name
fn genders_by_size(records: &[DerivedObservation]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for gender in records.iter().filter_map(gender_of) {
        *counts.entry(gender).or_default() += 1;
    }
    let mut groups: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(g, n)| (g.to_string(), n))
        .collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    groups
}

fn compare_usage_by_gender(
    records: &[DerivedObservation],
    metric: Metric,
    significance_level: f64,
) -> Option<GenderComparison> {
    let groups = genders_by_size(records);
    let (group_a, group_b) = match groups.as_slice() {
        [a, b, ..] => (a.0.clone(), b.0.clone()),
        _ => return None,
    };

    let values_for = |group: &str| -> Vec<f64> {
        records
            .iter()
            .filter(|r| gender_of(r) == Some(group))
            .filter_map(|r| metric.value(r))
            .filter(|v| v.is_finite())
            .collect()
    };

    match two_sample_t_test(&values_for(group_a.as_str()), &values_for(group_b.as_str())) {
        Ok(test) => Some(GenderComparison {
            metric,
            significant: test.p_value < significance_level,
            group_a,
            group_b,
            test,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "gender usage comparison unavailable");
            None
        }
    }
}

fn gender_class_association(
    records: &[DerivedObservation],
    significance_level: f64,
) -> Option<ClassAssociation> {
    let mut groups: Vec<String> = genders_by_size(records).into_iter().map(|(g, _)| g).collect();
    if groups.len() < 2 {
        return None;
    }
    groups.sort();

    let classes: Vec<BehaviorClass> = records
        .iter()
        .filter(|r| gender_of(r).is_some())
        .map(|r| r.observation.user_behavior_class)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut table = vec![vec![0u64; classes.len()]; groups.len()];
    for record in records {
        let Some(gender) = gender_of(record) else {
            continue;
        };
        let row = groups.iter().position(|g| g == gender);
        let col = classes
            .iter()
            .position(|c| *c == record.observation.user_behavior_class);
        if let (Some(r), Some(c)) = (row, col) {
            table[r][c] += 1;
        }
    }

    match chi_square_independence(&table) {
        Ok(test) => Some(ClassAssociation {
            significant: test.p_value < significance_level,
            groups,
            test,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "gender/class association unavailable");
            None
        }
    }
}
