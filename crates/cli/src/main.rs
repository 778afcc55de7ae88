//! Normie resolver CLI entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Parse configuration**: layer built-in defaults, an optional TOML file
//!    and flags/environment into a validated [`resolver::ResolverConfig`].
//! 2. **Wire observability**: install a `tracing-subscriber` stack writing to
//!    stderr, with an optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: build the `reqwest`-backed transport and
//!    inject it into [`resolver::TokenResolver`].
//! 4. **Run the command**: resolve one token and print the JSON record to
//!    stdout, or print the effective configuration.
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Resolution or configuration failure |
//! | 2 | Invalid command-line input (including an out-of-range token id) |
//! | 130 | Interrupted |

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fetch::{ReqwestTransport, TransportConfig};
use resolver::TokenResolver;
use tracing::{error, warn};

mod observability;
mod output;
mod settings;

use observability::LogFormat;
use output::{parse_public_id, render, ErrorRecord};
use settings::ConfigArgs;

const EXIT_INVALID_INPUT: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "normie-resolver", version, about = "Resolve Normie token metadata from chain")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Log line format written to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "NORMIE_LOG_FORMAT", global = true)]
    log_format: LogFormat,

    /// OTLP/gRPC collector for trace export, e.g. `http://localhost:4317`.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", global = true)]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve one token and print its name, pixel count and image URL as JSON.
    Resolve {
        /// Token id, 0 to 9999.
        #[arg(allow_hyphen_values = true)]
        id: String,
    },
    /// Print the effective configuration as TOML.
    ShowConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match observability::init(cli.log_format, cli.otlp_endpoint.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("command failed: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::ShowConfig => {
            let config = settings::load(&cli.config)?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Resolve { id } => resolve(&cli.config, &id, &mut std::io::stdout().lock()).await,
    }
}

/// Runs one resolution and writes exactly one JSON record to `out`.
async fn resolve(args: &ConfigArgs, raw_id: &str, out: &mut impl Write) -> anyhow::Result<ExitCode> {
    let token_id = match parse_public_id(raw_id) {
        Ok(id) => id,
        Err(e) => {
            writeln!(out, "{}", render(&ErrorRecord::new(e))?)?;
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let resolver = match build_resolver(args) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!(token_id = %token_id, "resolver setup failed: {e:#}");
            writeln!(out, "{}", render(&ErrorRecord::new(format!("{e:#}")))?)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    tokio::select! {
        outcome = resolver.resolve(token_id) => match outcome {
            Ok(result) => {
                writeln!(out, "{}", render(&result)?)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                error!(token_id = %token_id, error = %e, "resolution failed");
                writeln!(out, "{}", render(&ErrorRecord::new(&e))?)?;
                Ok(ExitCode::FAILURE)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!(token_id = %token_id, "resolution interrupted");
            writeln!(out, "{}", render(&ErrorRecord::new("interrupted"))?)?;
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

fn build_resolver(args: &ConfigArgs) -> anyhow::Result<TokenResolver> {
    let config = settings::load(args)?;
    let transport = ReqwestTransport::new(&TransportConfig::default())
        .context("failed to construct HTTP transport")?;
    Ok(TokenResolver::new(&config, Arc::new(transport))?)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_line_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_takes_the_id_and_global_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "normie-resolver",
            "resolve",
            "17",
            "--rpc-url",
            "https://a.example,https://b.example",
            "--rpc-url",
            "https://c.example",
            "--log-format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Command::Resolve { id } => assert_eq!(id, "17"),
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(
            cli.config.rpc_urls,
            ["https://a.example", "https://b.example", "https://c.example"]
        );
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    fn records(out: &[u8]) -> serde_json::Value {
        serde_json::from_slice(out).unwrap()
    }

    #[tokio::test]
    async fn invalid_ids_print_an_error_record() {
        let mut out = Vec::new();

        let code = resolve(&ConfigArgs::default(), "10000", &mut out).await.unwrap();

        assert_eq!(code, ExitCode::from(EXIT_INVALID_INPUT));
        assert_eq!(records(&out), serde_json::json!({"error": "Invalid token ID (0\u{2013}9999)"}));
    }

    #[tokio::test]
    async fn setup_failures_print_an_error_record() {
        let args = ConfigArgs {
            config: Some("/nonexistent/normie.toml".into()),
            ..ConfigArgs::default()
        };
        let mut out = Vec::new();

        let code = resolve(&args, "7", &mut out).await.unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        let record = records(&out);
        let message = record["error"].as_str().unwrap();
        assert!(message.contains("/nonexistent/normie.toml"), "{message}");
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(Cli::try_parse_from(["normie-resolver"]).is_err());
    }
}
