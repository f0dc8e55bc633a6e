use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use lanescan::capture::{FrameSource, ScriptStep, SimulatedCamera, StillSource};
use lanescan::config::ScannerConfig;
use lanescan::detect::{ean13, Ean13Detector};
use lanescan::resolver::HttpCatalog;
use lanescan::scanner::ScannerContext;

#[derive(Parser, Debug)]
#[command(name = "lanescan", about = "Real-time barcode scanning pipeline")]
struct Args {
    /// JSON configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scan image files from this directory instead of a live device.
    #[arg(long)]
    stills: Option<PathBuf>,

    /// Scripted payloads for the simulated camera; "-" inserts an empty
    /// frame. 12-digit values get their check digit appended.
    #[arg(long = "script", value_name = "DIGITS")]
    script: Vec<String>,

    /// Frame pacing for the simulated camera, in milliseconds.
    #[arg(long, default_value_t = 33)]
    frame_delay_ms: u64,
}

fn build_script(raw: &[String]) -> Result<Vec<ScriptStep>> {
    raw.iter()
        .map(|entry| {
            if entry == "-" {
                return Ok(ScriptStep::Blank);
            }
            let digits = match entry.len() {
                13 => entry.clone(),
                12 => ean13::with_checksum(entry)
                    .ok_or_else(|| anyhow::anyhow!("invalid payload {entry:?}"))?,
                _ => anyhow::bail!("payload {entry:?} must be 12 or 13 digits"),
            };
            Ok(ScriptStep::Barcode(digits))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ScannerConfig::load(path)?,
        None => ScannerConfig::default(),
    };

    let source: Box<dyn FrameSource> = if let Some(dir) = &args.stills {
        Box::new(StillSource::new(dir))
    } else {
        let script = if args.script.is_empty() {
            // Out-of-the-box demo: one item presented, removed, re-presented.
            vec![
                ScriptStep::Barcode("4006381333931".to_string()),
                ScriptStep::Barcode("4006381333931".to_string()),
                ScriptStep::Blank,
                ScriptStep::Barcode("4006381333931".to_string()),
            ]
        } else {
            build_script(&args.script)?
        };
        let (w, h) = (
            config.camera.requested_width.unwrap_or(640),
            config.camera.requested_height.unwrap_or(480),
        );
        tracing::info!(
            device_index = config.camera.device_index,
            "no hardware backend selected, using simulated camera"
        );
        Box::new(
            SimulatedCamera::new(w, h)
                .with_script(script)
                .frame_delay(Duration::from_millis(args.frame_delay_ms)),
        )
    };

    let detector = Box::new(Ean13Detector::new(config.detector.scan_band_rows));
    let resolver = Box::new(HttpCatalog::new(
        &config.catalog.base_url,
        Duration::from_millis(config.catalog.request_timeout_ms),
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("exit requested");
            let _ = shutdown_tx.send(true);
        }
    });

    let context = ScannerContext::build(&config, source, detector, resolver, shutdown_rx)?;
    let report = context.run().await?;
    tracing::info!(
        frames = report.metrics.frames_read,
        scans = report.metrics.scan_events,
        delivered = report.delivery.delivered,
        failed = report.delivery.failed,
        "run complete"
    );
    Ok(())
}
