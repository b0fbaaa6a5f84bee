//! ffp-insight command line
//!
//! Usage:
//!   ffp-insight [--config <file>] [--verbose] <command>
//!
//! Commands index a period's snapshot, answer questions over the index,
//! run the batch analyses, or validate configuration.

use std::path::PathBuf;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use ffp_insight::core::AppConfig;
use ffp_insight::indexer::IndexReport;
use ffp_insight::logging::{LogLevel, LoggingSystem};
use ffp_insight::{App, FfpError};

/// Subcommand to run
enum Command {
    Index { period: i32 },
    Ask { period: Option<i32>, question: String },
    Analyze { period: i32 },
    CheckConfig,
}

/// Command line arguments
struct Args {
    config: Option<PathBuf>,
    verbose: bool,
    command: Command,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);
        let mut config = None;
        let mut verbose = false;
        let mut command = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = Some(args.next().map(PathBuf::from).ok_or("--config needs a path")?);
                }
                "--verbose" | "-v" => {
                    verbose = true;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "index" => {
                    command = Some(Command::Index {
                        period: parse_period(args.next())?,
                    });
                }
                "analyze" => {
                    command = Some(Command::Analyze {
                        period: parse_period(args.next())?,
                    });
                }
                "ask" => {
                    let mut period = None;
                    let mut words = Vec::new();
                    while let Some(word) = args.next() {
                        if word == "--period" || word == "-p" {
                            period = Some(parse_period(args.next())?);
                        } else {
                            words.push(word);
                        }
                    }
                    command = Some(Command::Ask {
                        period,
                        question: words.join(" "),
                    });
                }
                "check-config" => {
                    command = Some(Command::CheckConfig);
                }
                _ => {
                    return Err(format!("Unknown argument: {}", arg));
                }
            }
        }

        let command = command.ok_or("a command is required")?;
        Ok(Self {
            config,
            verbose,
            command,
        })
    }
}

fn parse_period(value: Option<String>) -> Result<i32, String> {
    let value = value.ok_or("a period is required")?;
    value
        .parse()
        .map_err(|_| format!("Invalid period: {}", value))
}

fn print_help() {
    println!(
        r#"ffp-insight - Financial Fair Play retrieval and narrative analysis

USAGE:
    ffp-insight [OPTIONS] <COMMAND>

COMMANDS:
    index <PERIOD>                      Embed and index ffp_data_<PERIOD>.json
    ask [--period <PERIOD>] <QUESTION>  Answer a question from indexed clubs
                                        (--period indexes that snapshot first)
    analyze <PERIOD>                    Index, run all analyses, save ffp_analysis_<PERIOD>.json
    check-config                        Load and validate configuration, then exit

OPTIONS:
    -c, --config <FILE>    Configuration file (JSON or TOML)
    -v, --verbose          Enable debug logging
    -h, --help             Print this help message

ENVIRONMENT:
    FFP__<SECTION>__<KEY>  Overrides a configuration value,
                           e.g. FFP__EMBEDDING__API_KEY
"#
    );
}

fn init_logging(config: &AppConfig, verbose: bool) -> Option<LoggingSystem> {
    let mut logging_config = config.logging.clone();
    if verbose {
        logging_config.level = LogLevel::Debug;
    }

    match LoggingSystem::init(logging_config) {
        Ok(system) => Some(system),
        Err(e) => {
            // Fall back to basic logging if the configured setup fails
            eprintln!("Failed to initialize logging system: {}. Using basic logging.", e);
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
                .init();
            None
        }
    }
}

/// Cancel `token` on the first Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight records");
            token.cancel();
        }
    });
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the report and map an incomplete run to a failing exit
fn finish_report(report: &IndexReport) -> anyhow::Result<()> {
    print_json(report)?;
    if !report.is_complete() {
        anyhow::bail!("indexing incomplete: {}", report);
    }
    Ok(())
}

async fn run_index(app: &App, period: i32) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match app.index(period, cancel).await {
        Ok(report) => finish_report(&report),
        Err(e) => fail_with_report(e),
    }
}

/// Print any partial indexing report carried by `error`, then fail
fn fail_with_report(error: FfpError) -> anyhow::Result<()> {
    if let FfpError::Indexer(e) = &error {
        if let Some(report) = e.report() {
            print_json(report)?;
        }
    }
    Err(error.into())
}

async fn run(args: Args, config: AppConfig) -> anyhow::Result<()> {
    if let Command::CheckConfig = args.command {
        println!("Configuration OK");
        println!("  data_dir: {}", config.data_dir.display());
        println!("  embedding: {} ({} dims)", config.embedding.endpoint, config.embedding.dimension);
        println!("  index: {:?} {}", config.index.backend, config.index.index_name);
        println!("  generation: {} ({})", config.generation.endpoint, config.generation.model);
        return Ok(());
    }

    let app = App::from_config(config).context("failed to build services")?;

    match args.command {
        Command::Index { period } => run_index(&app, period).await,
        Command::Ask { period, question } => {
            if let Some(period) = period {
                let report = app.index(period, CancellationToken::new()).await?;
                tracing::info!("{}", report);
            }
            let answer = app.ask(&question).await?;
            print_json(&answer)
        }
        Command::Analyze { period } => {
            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            let outcome = match app.analyze(period, cancel).await {
                Ok(outcome) => outcome,
                Err(e) => return fail_with_report(e),
            };
            tracing::info!("{}", outcome.report);
            println!("Analysis saved to {}", outcome.path.display());
            print_json(&outcome.run)
        }
        Command::CheckConfig => Ok(()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let config = AppConfig::load(args.config.as_deref()).context("invalid configuration")?;
    let _logging_system = init_logging(&config, args.verbose);

    tracing::info!("Starting ffp-insight");
    run(args, config).await
}
