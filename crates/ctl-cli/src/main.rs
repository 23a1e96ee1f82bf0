// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ctl_cli::commands::{self, GenerateArgs, ListArgs};
use ctl_cli::format::{Formatter, OutputFormat};
use ctl_loader::TestFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ctl", version, about = "CCL conformance test toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Tool configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Expand source tests into flat tests on disk.
    Generate {
        /// Source test directory (defaults to the configured one).
        #[arg(long)]
        source: Option<PathBuf>,

        /// Output directory (defaults to the configured one).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Skip `property-*.json` source files.
        #[arg(long)]
        skip_property_tests: bool,

        /// Never emit tests for this validation. Can be repeated.
        #[arg(long = "skip-function")]
        skip_functions: Vec<String>,

        /// Emit tests for this validation only. Can be repeated.
        #[arg(long = "only-function")]
        only_functions: Vec<String>,

        /// Re-read the output and check every record.
        #[arg(long)]
        validate: bool,

        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },

    /// List tests an implementation should run.
    List {
        /// Capability declaration file (JSON or TOML); overrides the config.
        #[arg(long)]
        declaration: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = FormatArg::Flat)]
        format: FormatArg,

        /// Only tests touching this function.
        #[arg(long)]
        function: Option<String>,

        /// List every test, compatible or not.
        #[arg(long)]
        all: bool,

        /// Drop tests above this level.
        #[arg(long)]
        level: Option<u32>,

        /// Skip unreadable files instead of failing.
        #[arg(long)]
        lenient: bool,

        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },

    /// Print statistics and capability coverage.
    Stats {
        /// Capability declaration file (JSON or TOML); overrides the config.
        #[arg(long)]
        declaration: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = FormatArg::Flat)]
        format: FormatArg,

        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },

    /// Validate the configuration and print its warnings.
    CheckConfig {
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Flat,
    Source,
}

impl Commands {
    fn output(&self) -> OutputFormat {
        match self {
            Self::Generate { output, .. }
            | Self::List { output, .. }
            | Self::Stats { output, .. }
            | Self::CheckConfig { output } => *output,
        }
    }
}

impl From<FormatArg> for TestFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Flat => TestFormat::Flat,
            FormatArg::Source => TestFormat::Source,
        }
    }
}

fn init_tracing(debug: bool, log_level: Option<&str>) {
    let fallback = if debug {
        "ctl=debug".to_string()
    } else {
        format!("ctl={}", log_level.unwrap_or("info"))
    };
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !debug => EnvFilter::new(directives),
        _ => EnvFilter::new(fallback),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = cli.command.output();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let err = commands::to_ctl_error(&err);
            eprintln!("{}", Formatter::new(output).format_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = commands::resolve_config(cli.config.as_deref())?;
    init_tracing(cli.debug, config.log_level.as_deref());

    match cli.command {
        Commands::Generate {
            source,
            out,
            skip_property_tests,
            skip_functions,
            only_functions,
            validate,
            output,
        } => {
            commands::log_config_warnings(&config)?;
            let args = GenerateArgs {
                source,
                out,
                skip_property_tests,
                skip_functions,
                only_functions,
                validate,
            };
            let summary = commands::generate(&config, &args)?;
            println!("{}", Formatter::new(output).format_generation(&summary));
        }
        Commands::List {
            declaration,
            format,
            function,
            all,
            level,
            lenient,
            output,
        } => {
            commands::log_config_warnings(&config)?;
            let decl = commands::resolve_declaration(&config, declaration.as_deref())?;
            let args = ListArgs {
                format: format.into(),
                function,
                all,
                level,
                lenient,
            };
            let tests = commands::list(&config, decl, &args)?;
            println!("{}", Formatter::new(output).format_tests(&tests));
        }
        Commands::Stats {
            declaration,
            format,
            output,
        } => {
            commands::log_config_warnings(&config)?;
            let decl = commands::resolve_declaration(&config, declaration.as_deref())?;
            let (stats, coverage) = commands::stats(&config, decl, format.into())?;
            println!(
                "{}",
                Formatter::new(output).format_statistics(&stats, &coverage)
            );
        }
        Commands::CheckConfig { output } => {
            let warnings = commands::check_config(&config)?;
            println!("{}", Formatter::new(output).format_warnings(&warnings));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "ctl",
            "generate",
            "--source",
            "tests",
            "--skip-function",
            "round_trip",
            "--skip-function",
            "associativity",
            "--output",
            "json",
        ])
        .unwrap();
        let Commands::Generate {
            skip_functions,
            output,
            ..
        } = cli.command
        else {
            panic!("expected generate");
        };
        assert_eq!(skip_functions, ["round_trip", "associativity"]);
        assert_eq!(output, OutputFormat::Json);
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["ctl", "stats", "--debug", "--config", "ctl.toml"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("ctl.toml")));
    }

    #[test]
    fn format_arg_maps_to_test_format() {
        assert_eq!(TestFormat::from(FormatArg::Source), TestFormat::Source);
        assert_eq!(TestFormat::from(FormatArg::Flat), TestFormat::Flat);
    }
}
