//! Fraud Detection Review - Main Entry Point
//!
//! Loads one simulated transaction from the dashboard API, classifies its
//! risk and prints the detection explanation. With `--fetch-detection` the
//! on-demand prediction is requested when no anomaly explains the score.

use anyhow::{bail, Context, Result};
use fraud_detection_review::{
    config::AppConfig, metrics::ReviewMetrics, view::ViewModel, HttpReviewClient, Prefetched,
    SimulationView, ViewState,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

struct Args {
    transaction_id: String,
    config_path: Option<String>,
    fetch_detection: bool,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut transaction_id = None;
    let mut config_path = None;
    let mut fetch_detection = false;
    let mut json = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fetch-detection" => fetch_detection = true,
            "--json" => json = true,
            "--config" => {
                config_path = Some(args.next().context("--config requires a path")?);
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            id => transaction_id = Some(id.to_string()),
        }
    }

    let Some(transaction_id) = transaction_id else {
        bail!("Usage: fraud-detection-review <transaction_id> [--fetch-detection] [--json] [--config <path>]");
    };

    Ok(Args {
        transaction_id,
        config_path,
        fetch_detection,
        json,
    })
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(format!(
            "fraud_detection_review={}",
            config.logging.level
        ))
    })?;

    // Logs go to stderr so stdout carries only the rendered view
    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn render(model: &ViewModel) -> String {
    let summary = &model.summary;
    let classification = &model.classification;
    let explanation = model.explanation();

    let mut out = String::new();
    out.push_str(&format!("Simulated Transaction {}\n", summary.transaction_id));
    out.push_str(&format!(
        "Amount: {}  [{} {}]\n",
        summary.amount,
        classification.tier,
        classification.display_score()
    ));
    out.push_str(&format!("User: {}\n", summary.user));
    out.push_str(&format!("Type: {}\n", summary.transaction_type));
    out.push_str(&format!("Device: {}\n", summary.device));
    out.push_str(&format!("Location: {}\n", summary.location));
    out.push_str(&format!("\nDetection\n{}\n", explanation));
    if let Some(action) = explanation.action_label() {
        out.push_str(&format!("[{}]\n", action));
    }

    out.push_str("\nAnomalies\n");
    let lines = model.anomaly_lines();
    if lines.is_empty() {
        out.push_str("No explicit anomalies created. System used ML/rules to score the transaction.\n");
    } else {
        for line in lines {
            out.push_str(&format!("- {}\n", line));
        }
    }

    out.push_str(&format!(
        "\nInvestigate: {}\nOpen Transaction: {}\n",
        summary.investigate_path(),
        summary.transaction_path()
    ));
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    // Load configuration
    let config = match &args.config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => AppConfig::load()?,
        None => AppConfig::default(),
    };
    init_logging(&config)?;
    info!(base_url = %config.api.base_url, "Configuration loaded");

    let metrics = Arc::new(ReviewMetrics::new());
    let client = HttpReviewClient::new(&config.api).context("Failed to create API client")?;
    let view = SimulationView::new(&config).with_metrics(metrics.clone());

    let state = view
        .load(&client, &args.transaction_id, Prefetched::default())
        .await;

    let model = match &state {
        ViewState::Ready(model) => model,
        other => {
            let message = other.message().unwrap_or_default();
            bail!("{}", message);
        }
    };

    if args.fetch_detection && model.explanation().can_fetch() {
        let outcome = model.fetch_detection(&client).await;
        info!(outcome = ?outcome, "Detection fetch settled");
    }

    if args.json {
        let output = serde_json::json!({
            "summary": model.summary,
            "classification": model.classification,
            "detection": model.explanation(),
            "anomalies": model.anomaly_lines(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render(model));
    }

    metrics.print_summary();
    Ok(())
}
