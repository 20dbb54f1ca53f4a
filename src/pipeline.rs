//! Pipeline orchestration
//!
//! This module provides the public API for Screenlens.
//! It orchestrates the full pipeline from a CSV table to an analysis report.

use std::collections::BTreeMap;
use std::io::Read;

use crate::config::AnalysisConfig;
use crate::encoder::ReportEncoder;
use crate::error::AnalysisError;
use crate::features::MetricsDeriver;
use crate::grouping::mean_by_class;
use crate::regression::fit_screen_time_model;
use crate::schema::CsvAdapter;
use crate::sections::{render_section, Section, SectionView};
use crate::types::{
    AnalysisReport, BehaviorClass, ClassSummary, DerivedObservation, Metric, Observation,
    RegressionResult,
};

/// Convert a CSV table into an analysis report JSON (stateless, one-shot).
///
/// # Arguments
/// * `csv_text` - Delimited text with the dataset's header row
///
/// # Returns
/// Report JSON string
///
/// # Example
/// ```ignore
/// let report_json = analyze_csv(std::fs::read_to_string("phone_behavior_data.csv")?)?;
/// ```
pub fn analyze_csv(csv_text: String) -> Result<String, AnalysisError> {
    UsageAnalyzer::from_csv_str(&csv_text, AnalysisConfig::default())?.report_json()
}

/// Session over an immutable snapshot of observations.
///
/// Every query recomputes its result from the snapshot; nothing is cached.
pub struct UsageAnalyzer {
    observations: Vec<Observation>,
    config: AnalysisConfig,
    encoder: ReportEncoder,
}

impl UsageAnalyzer {
    /// Create an analyzer over loaded observations
    pub fn new(observations: Vec<Observation>, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        if observations.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        tracing::info!(observations = observations.len(), "loaded usage snapshot");
        Ok(Self {
            observations,
            config,
            encoder: ReportEncoder::new(),
        })
    }

    /// Load a snapshot from CSV text
    pub fn from_csv_str(csv_text: &str, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::new(CsvAdapter::parse_str(csv_text)?, config)
    }

    /// Load a snapshot from a CSV reader
    pub fn from_reader<R: Read>(reader: R, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::new(CsvAdapter::parse_reader(reader)?, config)
    }

    /// Use a fixed report instance ID instead of a random one
    pub fn with_instance_id(mut self, instance_id: String) -> Self {
        self.encoder = ReportEncoder::with_instance_id(instance_id);
        self
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Observations augmented with engagement features
    pub fn derived(&self) -> Result<Vec<DerivedObservation>, AnalysisError> {
        MetricsDeriver::new(self.config.engagement_clip).derive(&self.observations)
    }

    /// Fit screen-on minutes against installed apps
    pub fn regression(&self) -> Result<RegressionResult, AnalysisError> {
        fit_screen_time_model(&self.derived()?)
    }

    /// Per-class summary of a metric
    pub fn class_means(
        &self,
        metric: Metric,
    ) -> Result<BTreeMap<BehaviorClass, ClassSummary>, AnalysisError> {
        Ok(mean_by_class(&self.derived()?, metric))
    }

    /// Build the full report
    pub fn report(&self) -> Result<AnalysisReport, AnalysisError> {
        self.encoder.encode(&self.derived()?, &self.config)
    }

    /// Build the full report as JSON
    pub fn report_json(&self) -> Result<String, AnalysisError> {
        self.encoder.encode_to_json(&self.derived()?, &self.config)
    }

    /// Render one dashboard section
    pub fn section(&self, section: Section) -> Result<SectionView, AnalysisError> {
        Ok(render_section(section, &self.report()?))
    }
}
