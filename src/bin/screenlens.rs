//! Screenlens CLI - Command-line interface for Screenlens
//!
//! Commands:
//! - analyze: Compute the full dashboard report
//! - regress: Fit screen-on minutes against installed apps
//! - classes: Per behavior class summary of one metric
//! - section: Render one dashboard section
//! - validate: Check a table's columns and rows
//! - schema: Print the expected input columns

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use screenlens::schema::{CsvAdapter, OPTIONAL_COLUMNS, REQUIRED_COLUMNS};
use screenlens::sections::Section;
use screenlens::types::Metric;
use screenlens::{AnalysisConfig, AnalysisError, UsageAnalyzer, SCREENLENS_VERSION};

/// Screenlens - Compute engine for phone-usage behavior dashboards
#[derive(Parser)]
#[command(name = "screenlens")]
#[command(version = SCREENLENS_VERSION)]
#[command(about = "Turn phone-usage tables into dashboard metrics", long_about = None)]
struct Cli {
    /// Load analysis configuration from a JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the engagement ratio ceiling
    #[arg(long, global = true)]
    clip: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full dashboard report
    Analyze {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Fit screen-on minutes against installed apps
    Regress {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Per behavior class summary of one metric
    Classes {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Metric name, e.g. engagement_ratio_clipped
        #[arg(short, long, default_value = "engagement_ratio_clipped")]
        metric: String,
    },

    /// Render one dashboard section
    Section {
        /// Section name, e.g. regression
        name: String,

        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Print the rendered markdown instead of JSON
        #[arg(long)]
        markdown: bool,
    },

    /// Check a table's columns and rows
    Validate {
        /// Input CSV path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the expected input columns
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ScreenlensCliError> {
    let config = load_config(cli.config.as_deref(), cli.clip)?;

    match cli.command {
        Commands::Analyze {
            input,
            output,
            format,
        } => cmd_analyze(&input, &output, format, config),

        Commands::Regress { input } => {
            let analyzer = load_analyzer(&input, config)?;
            println!("{}", serde_json::to_string_pretty(&analyzer.regression()?)?);
            Ok(())
        }

        Commands::Classes { input, metric } => {
            let metric: Metric = metric.parse()?;
            let analyzer = load_analyzer(&input, config)?;
            println!("{}", serde_json::to_string_pretty(&analyzer.class_means(metric)?)?);
            Ok(())
        }

        Commands::Section {
            name,
            input,
            markdown,
        } => {
            let section: Section = name.parse()?;
            let view = load_analyzer(&input, config)?.section(section)?;
            if markdown {
                println!("# {}\n\n{}", view.title, view.markdown);
            } else {
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            Ok(())
        }

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Schema { json } => cmd_schema(json),
    }
}

fn load_config(path: Option<&Path>, clip: Option<f64>) -> Result<AnalysisConfig, ScreenlensCliError> {
    let mut config = match path {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(clip) = clip {
        config.engagement_clip = clip;
    }
    config.validate()?;
    Ok(config)
}

fn read_input(input: &Path) -> Result<String, ScreenlensCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_analyzer(input: &Path, config: AnalysisConfig) -> Result<UsageAnalyzer, ScreenlensCliError> {
    let text = read_input(input)?;
    Ok(UsageAnalyzer::from_csv_str(&text, config)?)
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    config: AnalysisConfig,
) -> Result<(), ScreenlensCliError> {
    let report = load_analyzer(input, config)?.report()?;

    let output_data = match format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), ScreenlensCliError> {
    let text = read_input(input)?;
    let report = CsvAdapter::validate_str(&text)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total rows:   {}", report.total_rows);
        println!("Valid rows:   {}", report.valid_rows);
        println!("Invalid rows: {}", report.invalid_rows);

        if !report.missing_columns.is_empty() {
            println!("\nMissing columns:");
            for column in &report.missing_columns {
                println!("  - {}", column);
            }
        }

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Row {}: {}", err.index, err.message);
            }
        }
    }

    if !report.missing_columns.is_empty() {
        Err(ScreenlensCliError::MissingColumns(report.missing_columns.len()))
    } else if report.invalid_rows > 0 {
        Err(ScreenlensCliError::ValidationFailed(report.invalid_rows))
    } else {
        Ok(())
    }
}

fn cmd_schema(json: bool) -> Result<(), ScreenlensCliError> {
    if json {
        let schema = serde_json::json!({
            "required": REQUIRED_COLUMNS,
            "optional": OPTIONAL_COLUMNS,
            "metrics": Metric::ALL.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "sections": Section::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!("Input Schema (CSV with header row)");
    println!();
    println!("Required columns:");
    for column in REQUIRED_COLUMNS {
        println!("  - {}", column);
    }
    println!();
    println!("Optional columns:");
    for column in OPTIONAL_COLUMNS {
        println!("  - {}", column);
    }
    println!();
    println!("User Behavior Class must be an integer from 1 to 5.");
    println!("Unknown columns are ignored.");

    Ok(())
}

// Error handling

#[derive(Debug)]
enum ScreenlensCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    MissingColumns(usize),
    ValidationFailed(usize),
}

impl From<io::Error> for ScreenlensCliError {
    fn from(e: io::Error) -> Self {
        ScreenlensCliError::Io(e)
    }
}

impl From<AnalysisError> for ScreenlensCliError {
    fn from(e: AnalysisError) -> Self {
        ScreenlensCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for ScreenlensCliError {
    fn from(e: serde_json::Error) -> Self {
        ScreenlensCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ScreenlensCliError> for CliError {
    fn from(e: ScreenlensCliError) -> Self {
        match e {
            ScreenlensCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ScreenlensCliError::Analysis(e) => analysis_error(e),
            ScreenlensCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            ScreenlensCliError::MissingColumns(count) => CliError {
                code: "MISSING_COLUMN".to_string(),
                message: format!("{} required columns are missing", count),
                hint: Some("Run 'screenlens schema' for the expected columns".to_string()),
            },
            ScreenlensCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} rows failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

fn analysis_error(e: AnalysisError) -> CliError {
    let (code, hint) = match &e {
        AnalysisError::MissingColumn(_) => (
            "MISSING_COLUMN",
            Some("Run 'screenlens schema' for the expected columns"),
        ),
        AnalysisError::EmptyDataset => ("EMPTY_DATASET", Some("Ensure the table has data rows")),
        AnalysisError::InsufficientObservations { .. } | AnalysisError::DegenerateInput(_) => (
            "DEGENERATE_INPUT",
            Some("Regression needs at least two distinct app counts"),
        ),
        AnalysisError::InvalidValue { .. } | AnalysisError::InvalidBehaviorClass(_) => (
            "INVALID_VALUE",
            Some("Run 'screenlens validate' for details"),
        ),
        AnalysisError::ValueRange(_) => (
            "VALUE_RANGE",
            Some("Check the input for outlier values"),
        ),
        AnalysisError::UnknownMetric(_) => (
            "UNKNOWN_METRIC",
            Some("Run 'screenlens schema --json' for metric names"),
        ),
        AnalysisError::UnknownSection(_) => (
            "UNKNOWN_SECTION",
            Some("Run 'screenlens schema --json' for section names"),
        ),
        AnalysisError::InvalidConfig(_) => ("INVALID_CONFIG", Some("Check the configuration file")),
        AnalysisError::Csv(_) => ("PARSE_ERROR", Some("Check CSV syntax")),
        AnalysisError::JsonError(_) => ("JSON_ERROR", Some("Check JSON syntax")),
        AnalysisError::Statistic(_) => ("STATISTIC_ERROR", None),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: hint.map(str::to_string),
    }
}
