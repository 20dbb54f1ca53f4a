//! Core types for the Screenlens pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: loaded observations, derived observations, statistical results, and
//! the report handed to a presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Ordinal usage-intensity bucket, 1 (light) through 5 (extreme)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BehaviorClass(u8);

impl BehaviorClass {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, AnalysisError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AnalysisError::InvalidBehaviorClass(format!(
                "{} is outside {}..={}",
                value,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for BehaviorClass {
    type Error = AnalysisError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BehaviorClass> for u8 {
    fn from(class: BehaviorClass) -> Self {
        class.0
    }
}

impl fmt::Display for BehaviorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optional demographic and device fields carried alongside the core columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub user_id: Option<u64>,
    pub device_model: Option<String>,
    pub operating_system: Option<String>,
    /// Battery drain (mAh/day)
    pub battery_drain_mah_per_day: Option<f64>,
    /// Mobile data usage (MB/day)
    pub data_usage_mb_per_day: Option<f64>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

/// One row of the behavioral dataset: a single user's measured usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// In-app usage (minutes/day)
    pub app_usage_time_min_per_day: f64,
    /// Display-on time (hours/day)
    pub screen_on_time_hours_per_day: f64,
    pub number_of_apps_installed: u32,
    pub user_behavior_class: BehaviorClass,
    #[serde(default)]
    pub demographics: Demographics,
}

/// Per-record data quality flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// Screen-on time is zero, so the engagement ratio is undefined
    ZeroScreenTime,
    /// Screen-on time is positive but too small for a finite ratio
    NonFiniteRatio,
    /// In-app time exceeds the clip ceiling relative to screen-on time
    RatioClipped,
}

/// Observation augmented with the derived engagement fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedObservation {
    /// Source observation
    pub observation: Observation,
    /// Screen-on time converted to minutes/day
    pub screen_on_time_min_per_day: f64,
    /// App usage / screen-on minutes; `None` when screen-on time is zero
    pub engagement_ratio: Option<f64>,
    /// Engagement ratio capped at the configured ceiling
    pub engagement_ratio_clipped: Option<f64>,
    pub quality_flags: Vec<QualityFlag>,
}

/// Numeric field that can be summarized per behavior class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AppUsageMinutes,
    ScreenOnHours,
    ScreenOnMinutes,
    AppsInstalled,
    EngagementRatio,
    EngagementRatioClipped,
    BatteryDrain,
    DataUsage,
    Age,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::AppUsageMinutes,
        Metric::ScreenOnHours,
        Metric::ScreenOnMinutes,
        Metric::AppsInstalled,
        Metric::EngagementRatio,
        Metric::EngagementRatioClipped,
        Metric::BatteryDrain,
        Metric::DataUsage,
        Metric::Age,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::AppUsageMinutes => "app_usage_minutes",
            Metric::ScreenOnHours => "screen_on_hours",
            Metric::ScreenOnMinutes => "screen_on_minutes",
            Metric::AppsInstalled => "apps_installed",
            Metric::EngagementRatio => "engagement_ratio",
            Metric::EngagementRatioClipped => "engagement_ratio_clipped",
            Metric::BatteryDrain => "battery_drain",
            Metric::DataUsage => "data_usage",
            Metric::Age => "age",
        }
    }

    /// Extract this metric from a derived observation, `None` when undefined or missing
    pub fn value(&self, record: &DerivedObservation) -> Option<f64> {
        let obs = &record.observation;
        match self {
            Metric::AppUsageMinutes => Some(obs.app_usage_time_min_per_day),
            Metric::ScreenOnHours => Some(obs.screen_on_time_hours_per_day),
            Metric::ScreenOnMinutes => Some(record.screen_on_time_min_per_day),
            Metric::AppsInstalled => Some(obs.number_of_apps_installed as f64),
            Metric::EngagementRatio => record.engagement_ratio,
            Metric::EngagementRatioClipped => record.engagement_ratio_clipped,
            Metric::BatteryDrain => obs.demographics.battery_drain_mah_per_day,
            Metric::DataUsage => obs.demographics.data_usage_mb_per_day,
            Metric::Age => obs.demographics.age.map(f64::from),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| AnalysisError::UnknownMetric(s.to_string()))
    }
}

/// Single-predictor ordinary least squares fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub intercept: f64,
    /// Response units per unit of predictor (minutes of screen time per installed app)
    pub slope: f64,
    /// Coefficient of determination (0-1)
    pub r_squared: f64,
    pub adjusted_r_squared: Option<f64>,
    pub residual_std_error: Option<f64>,
    pub slope_std_error: Option<f64>,
    pub slope_t_statistic: Option<f64>,
    /// Two-sided p-value for the slope
    pub slope_p_value: Option<f64>,
    pub observations: usize,
}

impl RegressionResult {
    /// Predicted response for a predictor value
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Regression outcome as reported; a degenerate fit does not block the rest of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegressionOutcome {
    Fitted(RegressionResult),
    Unavailable { reason: String },
}

impl RegressionOutcome {
    pub fn fitted(&self) -> Option<&RegressionResult> {
        match self {
            RegressionOutcome::Fitted(result) => Some(result),
            RegressionOutcome::Unavailable { .. } => None,
        }
    }
}

/// Per-class summary of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1); absent with fewer than two members
    pub std_dev: Option<f64>,
    pub std_error: Option<f64>,
    /// 95% t-interval for the mean
    pub ci95_lower: Option<f64>,
    pub ci95_upper: Option<f64>,
}

/// Describe-style summary of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// One fixed-width histogram bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Distribution of one column: summary plus histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionReport {
    pub column: String,
    pub bin_width: f64,
    pub summary: Option<Describe>,
    pub histogram: Vec<HistogramBin>,
    /// Why the histogram is empty despite finite values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram_unavailable: Option<String>,
}

/// Two-sample t-test result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub mean_a: f64,
    pub mean_b: f64,
}

/// Chi-square test of independence result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
    pub yates_corrected: bool,
}

/// Gender comparison of a usage metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderComparison {
    pub metric: Metric,
    pub group_a: String,
    pub group_b: String,
    pub test: TTestResult,
    pub significant: bool,
}

/// Association between gender and behavior class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAssociation {
    pub groups: Vec<String>,
    pub test: ChiSquareResult,
    pub significant: bool,
}

/// Demographic significance findings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicFindings {
    pub significance_level: f64,
    pub usage_by_gender: Option<GenderComparison>,
    pub gender_by_class: Option<ClassAssociation>,
}

/// Side-by-side per-class means of app usage and screen time, both in minutes/day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassUsageProfile {
    pub behavior_class: BehaviorClass,
    pub app_usage: ClassSummary,
    pub screen_on: ClassSummary,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub computed_at_utc: String,
    pub observations: usize,
    /// Records whose engagement ratio is undefined
    pub undefined_ratios: usize,
    /// Records whose engagement ratio was clipped
    pub clipped_ratios: usize,
}

/// Complete analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub distributions: Vec<DistributionReport>,
    pub usage_by_class: Vec<ClassUsageProfile>,
    pub engagement_by_class: BTreeMap<BehaviorClass, ClassSummary>,
    pub regression: RegressionOutcome,
    pub demographics: DemographicFindings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_class_bounds() {
        assert!(BehaviorClass::new(1).is_ok());
        assert!(BehaviorClass::new(5).is_ok());
        assert!(matches!(
            BehaviorClass::new(0),
            Err(AnalysisError::InvalidBehaviorClass(_))
        ));
        assert!(BehaviorClass::new(6).is_err());
    }

    #[test]
    fn test_behavior_class_serde() {
        let class = BehaviorClass::new(3).unwrap();
        assert_eq!(serde_json::to_string(&class).unwrap(), "3");
        assert!(serde_json::from_str::<BehaviorClass>("9").is_err());
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!(
            "engagement-ratio-clipped".parse::<Metric>().unwrap(),
            Metric::EngagementRatioClipped
        );
        assert_eq!(" AGE ".parse::<Metric>().unwrap(), Metric::Age);
        assert!(matches!(
            "bogus".parse::<Metric>(),
            Err(AnalysisError::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_regression_outcome_tagging() {
        let outcome = RegressionOutcome::Unavailable {
            reason: "constant predictor".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert!(outcome.fitted().is_none());
    }
}
