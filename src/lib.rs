//! Screenlens - Compute engine for phone-usage behavior dashboards
//!
//! Screenlens turns a table of per-user phone usage into the values a dashboard
//! renders, through a deterministic pipeline: CSV adaptation → feature derivation
//! → grouping, distributions and regression → report encoding → section rendering.
//!
//! ## Core
//!
//! - **Metrics**: screen-on minutes, engagement ratio and its clipped display value
//! - **Regression**: ordinary least squares of screen-on minutes on installed apps
//! - **Grouping**: per behavior class means with spread

pub mod config;
pub mod demographics;
pub mod distribution;
pub mod encoder;
pub mod error;
pub mod features;
pub mod grouping;
pub mod pipeline;
pub mod regression;
pub mod schema;
pub mod sections;
pub mod types;

// FFI bindings for C interop, on by default for cdylib/staticlib builds
#[cfg(feature = "ffi")]
pub mod ffi;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use features::{derive_metrics, MetricsDeriver};
pub use grouping::mean_by_class;
pub use pipeline::{analyze_csv, UsageAnalyzer};
pub use regression::{fit_ols, fit_screen_time_model};
pub use sections::{render_section, Section, SectionView};

// Schema exports
pub use schema::{CsvAdapter, ValidationReport, REQUIRED_COLUMNS};

/// Screenlens version embedded in all reports
pub const SCREENLENS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "screenlens";
