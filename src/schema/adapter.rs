//! Adapter for converting delimited text into Observations
//!
//! Handles header validation, per-cell parsing and row-level error reporting.
//! The adapter does not decide whether an empty table is acceptable; that is
//! left to the stage consuming the observations.

use crate::error::AnalysisError;
use crate::schema::columns::*;
use crate::types::{BehaviorClass, Demographics, Observation};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Adapter for converting CSV tables to observations
pub struct CsvAdapter;

impl CsvAdapter {
    /// Parse a CSV string into observations
    pub fn parse_str(text: &str) -> Result<Vec<Observation>, AnalysisError> {
        Self::parse_reader(text.as_bytes())
    }

    /// Parse CSV from any reader into observations, failing on the first bad row
    pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<Observation>, AnalysisError> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let layout = ColumnLayout::from_headers(csv_reader.headers()?.iter())?;

        let mut observations = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            observations.push(parse_row(&layout, &record)?);
        }

        tracing::debug!(rows = observations.len(), "parsed observations");
        Ok(observations)
    }

    /// Check a CSV string without stopping at the first bad row
    pub fn validate_str(text: &str) -> Result<ValidationReport, AnalysisError> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(text.as_bytes());
        let headers = csv_reader.headers()?.clone();

        let missing = missing_columns(headers.iter());
        if !missing.is_empty() {
            return Ok(ValidationReport {
                missing_columns: missing.into_iter().map(str::to_string).collect(),
                ..ValidationReport::default()
            });
        }

        let layout = ColumnLayout::from_headers(headers.iter())?;
        let mut report = ValidationReport::default();

        for (index, record) in csv_reader.records().enumerate() {
            report.total_rows += 1;
            let outcome = record
                .map_err(AnalysisError::from)
                .and_then(|record| parse_row(&layout, &record));

            match outcome {
                Ok(_) => report.valid_rows += 1,
                Err(e) => report.errors.push(RowError {
                    index,
                    message: e.to_string(),
                }),
            }
        }

        report.invalid_rows = report.errors.len();
        Ok(report)
    }
}

/// Result of checking a table without loading it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub missing_columns: Vec<String>,
    pub errors: Vec<RowError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing_columns.is_empty() && self.errors.is_empty()
    }
}

/// A single rejected row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// Zero-based data row index (header excluded)
    pub index: usize,
    pub message: String,
}

fn parse_row(layout: &ColumnLayout, record: &StringRecord) -> Result<Observation, AnalysisError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let cell = Cell { record, line };

    let class_value = cell.count(layout.behavior_class, BEHAVIOR_CLASS)?;
    let user_behavior_class = u8::try_from(class_value)
        .map_err(|_| AnalysisError::InvalidBehaviorClass(class_value.to_string()))
        .and_then(BehaviorClass::new)
        .map_err(|e| cell.invalid(BEHAVIOR_CLASS, e.to_string()))?;

    Ok(Observation {
        app_usage_time_min_per_day: cell.non_negative(layout.app_usage, APP_USAGE_TIME)?,
        screen_on_time_hours_per_day: cell.non_negative(layout.screen_on, SCREEN_ON_TIME)?,
        number_of_apps_installed: cell.count(layout.apps_installed, APPS_INSTALLED)?,
        user_behavior_class,
        demographics: Demographics {
            user_id: cell
                .optional(layout.user_id, USER_ID, |c, i, n| c.count(i, n))
                .map(u64::from),
            device_model: cell.text(layout.device_model),
            operating_system: cell.text(layout.operating_system),
            battery_drain_mah_per_day: cell
                .optional(layout.battery_drain, BATTERY_DRAIN, |c, i, n| c.non_negative(i, n)),
            data_usage_mb_per_day: cell
                .optional(layout.data_usage, DATA_USAGE, |c, i, n| c.non_negative(i, n)),
            age: cell.optional(layout.age, AGE, |c, i, n| c.count(i, n)),
            gender: cell.text(layout.gender),
        },
    })
}

/// Cell accessor that attaches line and column to every parse failure
struct Cell<'a> {
    record: &'a StringRecord,
    line: u64,
}

impl Cell<'_> {
    fn invalid(&self, column: &str, message: impl Into<String>) -> AnalysisError {
        AnalysisError::InvalidValue {
            line: self.line,
            column: column.to_string(),
            message: message.into(),
        }
    }

    fn raw(&self, index: usize, column: &str) -> Result<&str, AnalysisError> {
        match self.record.get(index) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(self.invalid(column, "missing value")),
        }
    }

    fn non_negative(&self, index: usize, column: &str) -> Result<f64, AnalysisError> {
        let raw = self.raw(index, column)?;
        let value: f64 = raw
            .parse()
            .map_err(|_| self.invalid(column, format!("'{}' is not a number", raw)))?;

        if !value.is_finite() || value < 0.0 {
            return Err(self.invalid(column, format!("{} must be a non-negative number", raw)));
        }
        Ok(value)
    }

    fn count(&self, index: usize, column: &str) -> Result<u32, AnalysisError> {
        let raw = self.raw(index, column)?;
        if let Ok(value) = raw.parse::<u32>() {
            return Ok(value);
        }

        // Exported tables sometimes write integers as "67.0"
        let value = self.non_negative(index, column)?;
        if value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(self.invalid(column, format!("'{}' is not a whole number", raw)));
        }
        Ok(value as u32)
    }

    /// Demographic cells are informational; an unparsable one is dropped, not fatal
    fn optional<T>(
        &self,
        index: Option<usize>,
        column: &str,
        parse: impl Fn(&Self, usize, &str) -> Result<T, AnalysisError>,
    ) -> Option<T> {
        let i = index.filter(|&i| self.record.get(i).is_some_and(|v| !v.is_empty()))?;
        match parse(self, i, column) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(line = self.line, column, error = %e, "ignoring unparsable optional value");
                None
            }
        }
    }

    fn text(&self, index: Option<usize>) -> Option<String> {
        index
            .and_then(|i| self.record.get(i))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}
