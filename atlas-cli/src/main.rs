use std::sync::Arc;

use anyhow::Context;
use atlas_agent::LlmPlanner;
use atlas_cli::{Cli, build_runner, render_event, save_report};
use atlas_core::{AtlasConfig, Planner};
use atlas_model::{GroqClient, Llm};
use atlas_runner::{CancellationToken, RunControl};
use atlas_telemetry::{DEFAULT_FILTER, LogFormat};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs { LogFormat::Json } else { LogFormat::Pretty };
    let filter = if cli.quiet { "warn" } else { DEFAULT_FILTER };
    let timings = atlas_telemetry::init_with_filter(format, filter)
        .context("failed to initialise logging")?;

    let mut config = AtlasConfig::from_env()?;
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let query = cli.query_text();
    let llm: Arc<dyn Llm> = Arc::new(GroqClient::from_config(&config.llm)?);

    if !cli.with_search {
        let plan = LlmPlanner::new(llm).plan(&query).await?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let runner = build_runner(&config, llm)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; finishing with the answers gathered so far");
            on_interrupt.cancel();
        }
    });

    let mut control = RunControl::new().with_cancellation(cancel);
    let printer = if cli.quiet {
        None
    } else {
        let (tx, mut rx) = mpsc::unbounded_channel();
        control = control.with_events(tx);
        Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                eprintln!("{}", render_event(&event));
            }
        }))
    };

    let outcome = runner.run_with(&query, control).await?;
    if let Some(printer) = printer {
        // The sender went away with the run, so this drains and stops.
        printer.await?;
    }

    let path = save_report(&config.paths.reports_dir, &query, &outcome.report, &chrono::Local::now())?;
    if !cli.quiet {
        println!("{}", outcome.report);
    }
    eprintln!("Report saved to {}", path.display());

    if cli.timings {
        eprint!("{}", timings.render());
    }

    Ok(())
}
