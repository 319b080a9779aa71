//! # content-gate
//!
//! Command line front end for the content validation gate: check a
//! configuration file, or run a single simulated request through a pipeline
//! and print the resulting problem.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use content_gate::telemetry::init_tracing;
use content_gate::{
    run_evaluate, Config, EvaluateRequest, Evaluation, InputFilterFactory, ServiceManager,
    PROBLEM_CONTENT_TYPE,
};
use http::Method;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "content-gate")]
#[command(about = "Validate request bodies against per-handler input filters")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "content-gate.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configuration and build every input filter spec
    Check,

    /// Run one request through the gate
    Evaluate {
        /// Handler the request was routed to
        #[arg(long)]
        handler: String,

        /// HTTP method
        #[arg(long, default_value = "POST", value_parser = parse_method)]
        method: Method,

        /// Request body as JSON (omitted means an empty body)
        #[arg(long)]
        body: Option<String>,

        /// Request path, for logging
        #[arg(long, default_value = "/")]
        path: String,
    },
}

fn parse_method(raw: &str) -> Result<Method, String> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    info!("🔧 Loading configuration from: {}", cli.config.display());
    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Check => {
            let factory = InputFilterFactory::new();
            if let Err(e) = config.validate(&factory) {
                error!("❌ Configuration validation failed: {}", e);
                return Err(e.into());
            }

            let mut handlers: Vec<_> = config.content_validation.keys().collect();
            handlers.sort();
            for handler in handlers {
                println!("handler  {}", handler);
            }
            for name in config.input_filter_specs.keys() {
                println!("filter   {}", name);
            }
            Ok(())
        }
        Commands::Evaluate {
            handler,
            method,
            body,
            path,
        } => {
            let body: Value = match body {
                Some(raw) => serde_json::from_str(&raw).context("--body is not valid JSON")?,
                None => Value::Null,
            };

            let gate = Arc::new(config.into_gate(InputFilterFactory::new(), ServiceManager::new())?);
            let request = EvaluateRequest::new(method, handler)
                .with_path(path)
                .with_body(body);

            match run_evaluate(&gate, request).await {
                Evaluation::Rejected(problem) => {
                    eprintln!("Content-Type: {}", PROBLEM_CONTENT_TYPE);
                    println!("{}", serde_json::to_string_pretty(&problem)?);
                    std::process::exit(1);
                }
                Evaluation::Passed(validated) => {
                    if let Some(validated) = validated {
                        let values = serde_json::to_string(validated.report().values())?;
                        info!(input_filter = validated.name(), "✅ Validated: {}", values);
                    }
                    println!("pass");
                    Ok(())
                }
            }
        }
    }
}
