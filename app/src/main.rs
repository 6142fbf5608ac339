use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cloud_core::{ChannelPipeline, ExportComposite, GenerationRequest, display_composite};
use cloud_export::{ExportStatus, Exporter};
use image::ImageFormat;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate tileable cloud noise textures from a request file.
#[derive(Parser, Debug)]
#[command(name = "cloud-noise", version)]
struct Cli {
    /// TOML generation request; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export destination (.png). 3D requests write one file per slice
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write the display composite of the current slice here
    #[arg(short, long)]
    preview: Option<PathBuf>,

    /// Override the request seed
    #[arg(long)]
    seed: Option<i64>,

    /// Override the request resolution
    #[arg(long)]
    resolution: Option<u32>,
}

fn load_request(cli: &Cli) -> Result<GenerationRequest> {
    let mut request = match &cli.config {
        Some(path) => GenerationRequest::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GenerationRequest::default(),
    };
    if let Some(seed) = cli.seed {
        request.seed = seed;
    }
    if let Some(resolution) = cli.resolution {
        request.resolution = resolution;
    }
    request.validate()?;
    Ok(request)
}

async fn export(composite: ExportComposite, out: PathBuf) -> Result<()> {
    let handle = Exporter::new().start(composite, &out)?;
    let mut status = handle.subscribe();
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        if let ExportStatus::Running(_) = current {
            eprintln!("{current}");
        }
        if current.is_done() {
            break;
        }
    }
    let summary = handle.wait().await?;
    eprintln!("{}", ExportStatus::Finished(summary));
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.out.is_none() && cli.preview.is_none() {
        bail!("nothing to do: pass --out and/or --preview");
    }
    let request = load_request(&cli)?;

    let start = Instant::now();
    let fields = ChannelPipeline::default().resolve_all(&request)?;
    info!(
        resolution = request.resolution,
        dimensionality = ?request.dimensionality,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "generated channels"
    );

    if let Some(preview) = &cli.preview {
        display_composite(&fields, &request.show_channels, request.z_slice)
            .to_rgb_image()
            .save_with_format(preview, ImageFormat::Png)
            .with_context(|| format!("writing preview {}", preview.display()))?;
        info!(path = %preview.display(), "saved preview");
    }

    if let Some(out) = cli.out {
        let composite = ExportComposite::new(fields, &request.show_channels);
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build Tokio runtime")?;
        rt.block_on(export(composite, out))?;
    }
    Ok(())
}
