//! CLI argument definitions for the grapher tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use grapher_model::TimeUnit;

#[derive(Parser)]
#[command(
    name = "grapher",
    version,
    about = "Derive chart-ready series from entity/time data files",
    long_about = "Load observational data (one row per entity and time) from CSV or JSON,\n\
                  then derive stacked, scatter, map or faceted chart series from a JSON\n\
                  chart configuration."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Derive the series of one chart.
    Series(SeriesArgs),

    /// Summarize the columns of a data file and its ingestion report.
    Inspect(InspectArgs),
}

/// Data source shared by every subcommand.
#[derive(Parser)]
pub struct DataArgs {
    /// Data file (.csv or .json) with one row per entity and time.
    #[arg(long = "data", value_name = "FILE")]
    pub data: PathBuf,

    /// JSON file with column definitions. Undeclared columns are inferred.
    #[arg(long = "defs", value_name = "FILE")]
    pub defs: Option<PathBuf>,

    /// Unit of the time column.
    #[arg(long = "time-unit", value_enum, default_value = "year")]
    pub time_unit: TimeUnitArg,
}

#[derive(Parser)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// JSON chart configuration (tagged by "chart").
    #[arg(long = "config", value_name = "FILE")]
    pub config: PathBuf,

    /// How to print the derived series.
    #[arg(long = "output", value_enum, default_value = "table")]
    pub output: OutputArg,

    /// Write the output to a file instead of stdout.
    #[arg(long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Parser)]
pub struct InspectArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Also print the first N rows of the table.
    #[arg(long = "preview", value_name = "N")]
    pub preview: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TimeUnitArg {
    Year,
    Day,
}

impl From<TimeUnitArg> for TimeUnit {
    fn from(value: TimeUnitArg) -> Self {
        match value {
            TimeUnitArg::Year => TimeUnit::Year,
            TimeUnitArg::Day => TimeUnit::Day,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
