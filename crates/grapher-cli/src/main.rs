//! Grapher CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use grapher_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg, OutputArg, SeriesArgs};
use grapher_cli::commands::{
    InspectRun, SeriesRun, run_inspect, run_series, series_json, write_output,
};
use grapher_cli::logging::{LogConfig, LogFormat, init_logging};
use grapher_cli::summary::{column_table, render_series, report_lines};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Series(args) => match run_series(&args).and_then(|run| emit_series(&args, &run)) {
            Ok(()) => 0,
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Inspect(args) => match run_inspect(&args) {
            Ok(run) => {
                print_inspect(&run);
                0
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

fn emit_series(args: &SeriesArgs, run: &SeriesRun) -> anyhow::Result<()> {
    let text = match args.output {
        OutputArg::Json => series_json(run)?,
        OutputArg::Table => {
            let mut lines = Vec::new();
            if !run.report.is_clean() {
                lines.extend(report_lines(&run.report));
                lines.push(String::new());
            }
            match &run.series {
                Some(series) => lines.push(render_series(series)),
                None => lines.push(format!("{}: no displayable data", run.family)),
            }
            lines.join("\n")
        }
    };
    match &args.out {
        Some(path) => write_output(path, &text),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn print_inspect(run: &InspectRun) {
    println!("{}", column_table(&run.table));
    for line in report_lines(&run.report) {
        println!("{line}");
    }
    if let Some(preview) = &run.preview {
        println!("\n{preview}");
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
