//! smartviz - command-line client for the Smart Visualizer analysis service
//!
//! Uploads a dataset, prints the quality score and generated charts, and
//! optionally asks the language model a question about the data.

mod api;
mod app;
mod error;
mod features;
#[cfg(test)]
mod testing;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use crate::api::AnalysisClient;
use crate::app::{AskOutcome, Chart, Controller, DatasetFile, SubmitOutcome};
use crate::features::Settings;

#[derive(Parser, Debug)]
#[command(name = "smartviz", version, about)]
struct Cli {
    /// Dataset to analyze (CSV or Excel), or `-` to read it from stdin
    dataset: Option<PathBuf>,

    /// File name reported for a dataset read from stdin
    #[arg(long, default_value = "stdin.csv")]
    stdin_name: String,

    /// Gateway base URL, overrides the settings file
    #[arg(long)]
    backend_url: Option<String>,

    /// Chart to show, numbered as in the chart list
    #[arg(long, default_value_t = 1)]
    chart: usize,

    /// Question to ask about the dataset after analysis
    #[arg(long)]
    ask: Option<String>,

    /// Language model key, for gateways without one configured
    #[arg(long)]
    api_key: Option<String>,

    /// Write every chart image into this directory
    #[arg(long)]
    save_charts: Option<PathBuf>,

    /// Audio overview to attach to the session
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Probe the gateway and analysis engine before anything else
    #[arg(long)]
    health: bool,

    /// Persist the effective settings (including --backend-url)
    #[arg(long)]
    save_settings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(url) = cli.backend_url.clone() {
        settings.backend.base_url = url;
    }
    if cli.save_settings {
        settings.save()?;
        tracing::info!("Settings saved to {:?}", Settings::file_path());
    }

    let client = AnalysisClient::from_settings(&settings)
        .context("failed to set up the HTTP client")?;
    tracing::info!("Using analysis service at {}", client.base_url());
    let controller = Controller::new(Arc::new(client), &settings);

    if cli.health {
        let report = controller.check_health().await?;
        println!(
            "Gateway: {}  Analysis engine: {}",
            report.gateway, report.engine
        );
        if !report.is_ready() {
            bail!("analysis service is not ready");
        }
    }

    if let Some(audio) = &cli.audio {
        controller.select_audio_preview(audio);
        if tokio::fs::metadata(audio).await.is_err() {
            if let Some(preview) = controller.clear_audio_preview() {
                tracing::warn!(
                    "Audio overview {} not found, detached",
                    preview.path.display()
                );
            }
        } else if let Some(preview) = controller.snapshot().audio_preview {
            println!("Audio overview: {}", preview.name);
        }
    }

    let Some(path) = cli.dataset.clone() else {
        if cli.health || cli.save_settings {
            return Ok(());
        }
        bail!("no dataset given");
    };

    let file = if path.as_os_str() == "-" {
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .context("reading dataset from stdin")?;
        DatasetFile::from_bytes(cli.stdin_name.clone(), bytes)
    } else {
        DatasetFile::from_path(&path)
    };
    if !file.has_recognized_extension() {
        bail!("{} is not a CSV or Excel file", file.name());
    }
    println!("Analyzing {}...", file.name());
    controller.select_file(file);

    match controller.submit_analysis().await {
        Ok(SubmitOutcome::Analyzed { score, charts }) => {
            tracing::info!("Score {} with {} charts", score, charts);
        }
        Ok(SubmitOutcome::Superseded) => {
            bail!("analysis was superseded by another file")
        }
        Err(e) => {
            let message = controller
                .snapshot()
                .error_message
                .unwrap_or_else(|| e.to_string());
            bail!(message);
        }
    }

    show_score(&controller).await?;
    show_charts(&controller, cli.chart)?;

    if let Some(dir) = &cli.save_charts {
        save_charts(&controller, dir).await?;
    }

    if let Some(question) = &cli.ask {
        let outcome = controller
            .ask_question(question, cli.api_key.clone())
            .await?;
        match outcome {
            AskOutcome::Skipped => {}
            AskOutcome::Answered(text) => println!("\nAI: {}", text),
            AskOutcome::Rejected(text) => println!("\nAI error: {}", text),
            AskOutcome::Failed(text) => println!("\n{}", text),
        }
    }

    Ok(())
}

/// Follow the score animation until it settles
async fn show_score(controller: &Controller) -> Result<()> {
    let mut stdout = std::io::stdout();
    while controller.is_animating() {
        print!("\rQuality score: {:>3}", controller.snapshot().animated_score);
        stdout.flush()?;
        tokio::time::sleep(controller.animation_tick()).await;
    }
    println!("\rQuality score: {:>3}", controller.snapshot().animated_score);

    if let Some(insights) = controller
        .snapshot()
        .analysis_result
        .and_then(|r| r.ai_insights)
    {
        println!("\nInsights:\n{}", insights);
    }
    Ok(())
}

fn show_charts(controller: &Controller, number: usize) -> Result<()> {
    println!("\nCharts:");
    for label in controller.chart_options() {
        println!("  {}", label);
    }

    let index = number.checked_sub(1).unwrap_or(usize::MAX);
    if let Err(e) = controller.select_chart(index) {
        tracing::warn!("Keeping first chart: {}", e);
    }

    let index = controller.snapshot().selected_chart_index;
    if let Some(chart) = controller.selected_chart() {
        print!("\n[{}] {}", Chart::tag(index), chart.title);
        if let Some((w, h)) = chart.image.dimensions() {
            print!(" ({}x{} {})", w, h, chart.image.extension());
        }
        println!();
        if !chart.description.is_empty() {
            println!("{}", chart.description);
        }
    }
    Ok(())
}

async fn save_charts(controller: &Controller, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    let charts = controller.snapshot().charts().to_vec();
    for (idx, chart) in charts.iter().enumerate() {
        let path = dir.join(format!(
            "{}.{}",
            Chart::tag(idx).to_lowercase(),
            chart.image.extension()
        ));
        tokio::fs::write(&path, chart.image.bytes())
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Saved {} -> {}", chart.title, path.display());
    }
    Ok(())
}
