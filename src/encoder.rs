//! Report encoding
//!
//! This module assembles derived observations into a complete analysis report.
//! A regression that cannot be fitted is recorded as unavailable rather than
//! failing the report, so grouping and distributions are always present.

use crate::config::AnalysisConfig;
use crate::demographics::demographic_findings;
use crate::distribution::distribution_report;
use crate::error::AnalysisError;
use crate::grouping::{mean_by_class, usage_minutes_by_class};
use crate::regression::fit_screen_time_model;
use crate::schema::{APP_USAGE_TIME, SCREEN_ON_TIME};
use crate::types::{
    AnalysisReport, DerivedObservation, Metric, QualityFlag, RegressionOutcome, ReportProducer,
    ReportProvenance,
};
use crate::{PRODUCER_NAME, SCREENLENS_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Report encoder producing serializable analysis reports
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build the full report from derived observations
    pub fn encode(
        &self,
        records: &[DerivedObservation],
        config: &AnalysisConfig,
    ) -> Result<AnalysisReport, AnalysisError> {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: SCREENLENS_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            computed_at_utc: Utc::now().to_rfc3339(),
            observations: records.len(),
            undefined_ratios: records.iter().filter(|r| r.engagement_ratio.is_none()).count(),
            clipped_ratios: count_flag(records, QualityFlag::RatioClipped),
        };

        let app_usage: Vec<f64> = records
            .iter()
            .map(|r| r.observation.app_usage_time_min_per_day)
            .collect();
        let screen_on: Vec<f64> = records
            .iter()
            .map(|r| r.observation.screen_on_time_hours_per_day)
            .collect();

        let distributions = vec![
            distribution_report(APP_USAGE_TIME, &app_usage, config.app_usage_bin_width)?,
            distribution_report(SCREEN_ON_TIME, &screen_on, config.screen_on_bin_width)?,
        ];

        let regression = match fit_screen_time_model(records) {
            Ok(result) => RegressionOutcome::Fitted(result),
            Err(e) => {
                tracing::warn!(error = %e, "screen time regression unavailable");
                RegressionOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        Ok(AnalysisReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            distributions,
            usage_by_class: usage_minutes_by_class(records),
            engagement_by_class: mean_by_class(records, Metric::EngagementRatioClipped),
            regression,
            demographics: demographic_findings(records, config.significance_level),
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        records: &[DerivedObservation],
        config: &AnalysisConfig,
    ) -> Result<String, AnalysisError> {
        let report = self.encode(records, config)?;
        serde_json::to_string_pretty(&report).map_err(AnalysisError::JsonError)
    }
}

fn count_flag(records: &[DerivedObservation], flag: QualityFlag) -> usize {
    records
        .iter()
        .filter(|r| r.quality_flags.contains(&flag))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::MetricsDeriver;
    use crate::types::{BehaviorClass, Demographics, Observation};

    fn make_records(apps: &[u32]) -> Vec<DerivedObservation> {
        let observations: Vec<Observation> = apps
            .iter()
            .enumerate()
            .map(|(i, &a)| Observation {
                app_usage_time_min_per_day: 30.0 + 40.0 * i as f64,
                screen_on_time_hours_per_day: if i == 0 { 0.0 } else { 1.0 + i as f64 },
                number_of_apps_installed: a,
                user_behavior_class: BehaviorClass::new((i % 5) as u8 + 1).unwrap(),
                demographics: Demographics::default(),
            })
            .collect();
        MetricsDeriver::default().derive(&observations).unwrap()
    }

    #[test]
    fn test_encode_report() {
        let records = make_records(&[10, 20, 30, 40, 50, 60]);
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&records, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.version, SCREENLENS_VERSION);
        assert_eq!(report.producer.instance_id, "test-instance");

        assert_eq!(report.provenance.observations, 6);
        assert_eq!(report.provenance.undefined_ratios, 1);

        assert_eq!(report.distributions.len(), 2);
        assert_eq!(report.distributions[0].column, APP_USAGE_TIME);
        let binned: usize = report.distributions[1].histogram.iter().map(|b| b.count).sum();
        assert_eq!(binned, 6);

        assert_eq!(report.usage_by_class.len(), 5);
        assert!(report.regression.fitted().is_some());
        assert!(report.demographics.usage_by_gender.is_none());
    }

    #[test]
    fn test_degenerate_regression_does_not_block_report() {
        let records = make_records(&[25, 25, 25, 25]);
        let report = ReportEncoder::new()
            .encode(&records, &AnalysisConfig::default())
            .unwrap();

        match &report.regression {
            RegressionOutcome::Unavailable { reason } => assert!(reason.contains("zero variance")),
            other => panic!("expected unavailable regression, got {:?}", other),
        }
        assert!(!report.engagement_by_class.is_empty());
        assert!(!report.usage_by_class.is_empty());
    }

    #[test]
    fn test_outlier_row_does_not_block_report() {
        let mut records = make_records(&[10, 20, 30]);
        records[2].observation.app_usage_time_min_per_day = 200_000.0;

        let report = ReportEncoder::new()
            .encode(&records, &AnalysisConfig::default())
            .unwrap();

        let app_usage = &report.distributions[0];
        assert!(app_usage.histogram.is_empty());
        assert!(app_usage.histogram_unavailable.is_some());
        assert!(!report.distributions[1].histogram.is_empty());
        assert!(report.regression.fitted().is_some());
    }

    #[test]
    fn test_encode_to_json() {
        let records = make_records(&[5, 15, 25]);
        let json = ReportEncoder::new()
            .encode_to_json(&records, &AnalysisConfig::default())
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("producer").is_some());
        assert!(parsed.get("provenance").is_some());
        assert_eq!(parsed["regression"]["status"], "fitted");
        assert!(parsed["engagement_by_class"].get("2").is_some());
    }
}
