//! Column layout of the phone-usage dataset
//!
//! Column names and units are matched exactly (after trimming whitespace) so
//! that downstream displays can reuse them unchanged.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

pub const APP_USAGE_TIME: &str = "App Usage Time (min/day)";
pub const SCREEN_ON_TIME: &str = "Screen On Time (hours/day)";
pub const APPS_INSTALLED: &str = "Number of Apps Installed";
pub const BEHAVIOR_CLASS: &str = "User Behavior Class";

pub const USER_ID: &str = "User ID";
pub const DEVICE_MODEL: &str = "Device Model";
pub const OPERATING_SYSTEM: &str = "Operating System";
pub const BATTERY_DRAIN: &str = "Battery Drain (mAh/day)";
pub const DATA_USAGE: &str = "Data Usage (MB/day)";
pub const AGE: &str = "Age";
pub const GENDER: &str = "Gender";

/// Derived column name used by displays for screen time in minutes
pub const SCREEN_ON_TIME_MINUTES: &str = "Screen On Time (min/day)";

/// Columns every input table must carry
pub const REQUIRED_COLUMNS: [&str; 4] =
    [APP_USAGE_TIME, SCREEN_ON_TIME, APPS_INSTALLED, BEHAVIOR_CLASS];

/// Columns read when present
pub const OPTIONAL_COLUMNS: [&str; 7] = [
    USER_ID,
    DEVICE_MODEL,
    OPERATING_SYSTEM,
    BATTERY_DRAIN,
    DATA_USAGE,
    AGE,
    GENDER,
];

/// Resolved positions of known columns within a header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub app_usage: usize,
    pub screen_on: usize,
    pub apps_installed: usize,
    pub behavior_class: usize,
    pub user_id: Option<usize>,
    pub device_model: Option<usize>,
    pub operating_system: Option<usize>,
    pub battery_drain: Option<usize>,
    pub data_usage: Option<usize>,
    pub age: Option<usize>,
    pub gender: Option<usize>,
}

impl ColumnLayout {
    /// Resolve the layout from header names, failing on any absent required column
    pub fn from_headers<'a, I>(headers: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: Vec<&str> = headers.into_iter().map(str::trim).collect();

        let missing = missing_columns(names.iter().copied());
        if !missing.is_empty() {
            return Err(AnalysisError::MissingColumn(missing.join(", ")));
        }

        let find = |column: &str| names.iter().position(|name| *name == column);
        let required = |column: &str| {
            find(column).ok_or_else(|| AnalysisError::MissingColumn(column.to_string()))
        };

        Ok(Self {
            app_usage: required(APP_USAGE_TIME)?,
            screen_on: required(SCREEN_ON_TIME)?,
            apps_installed: required(APPS_INSTALLED)?,
            behavior_class: required(BEHAVIOR_CLASS)?,
            user_id: find(USER_ID),
            device_model: find(DEVICE_MODEL),
            operating_system: find(OPERATING_SYSTEM),
            battery_drain: find(BATTERY_DRAIN),
            data_usage: find(DATA_USAGE),
            age: find(AGE),
            gender: find(GENDER),
        })
    }
}

/// Required columns absent from a header row, in canonical order
pub fn missing_columns<'a, I>(headers: I) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !present.contains(column))
        .collect()
}
