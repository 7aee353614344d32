use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use client_core::{
    config::{load_settings, prepare_base_url},
    project::{project, ReportView},
    DetectClient, DetectPage, PickedFile, SubmissionState,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Upload images to a detection backend and print the annotated results")]
struct Args {
    /// Image files submitted together as one batch.
    #[arg(required = true)]
    images: Vec<PathBuf>,
    /// Backend base URL; overrides client.toml and DETECT_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,
    /// Write annotated images into this directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    let base_url = prepare_base_url(&settings.base_url)?;
    info!(base_url = %base_url, "resolved detection backend");

    let mut picked = Vec::new();
    for path in &args.images {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read image '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        picked.push(PickedFile { name, bytes });
    }

    let mut page = DetectPage::new(DetectClient::new(base_url));
    page.pick_files(picked);
    if let Some(message) = page.error() {
        bail!("{message}");
    }

    for file in page.selection().files() {
        println!("selected {} ({} bytes)", file.name, file.bytes.len());
    }

    page.submit().await;
    let reports = match page.state() {
        SubmissionState::Succeeded(reports) => reports,
        SubmissionState::Failed(message) => bail!("{message}"),
        SubmissionState::Idle | SubmissionState::InFlight => {
            bail!("{}", page.error().unwrap_or("submit was refused"))
        }
    };

    let views = project(reports);
    for view in &views {
        render_view(view);
    }

    if let Some(out_dir) = &args.out_dir {
        write_annotated_images(out_dir, &views)?;
    }

    Ok(())
}

fn render_view(view: &ReportView) {
    println!();
    println!("== {} ==", view.filename);
    if view.image_src.is_none() {
        println!("No annotated image returned.");
    }
    println!("total objects: {}", view.total);
    if let Some(counts) = &view.class_counts {
        for (class, count) in counts {
            println!("  {class}: {count}");
        }
    }
    if view.detections.is_empty() {
        println!("No detections");
        return;
    }
    for detection in &view.detections {
        let [x1, y1, x2, y2] = detection.bbox;
        println!(
            "  {} {}  bbox: [{x1}, {y1}, {x2}, {y2}]",
            detection.class_name, detection.confidence
        );
    }
}

fn write_annotated_images(out_dir: &Path, views: &[ReportView]) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create '{}'", out_dir.display()))?;

    for view in views {
        let Some(src) = &view.image_src else {
            continue;
        };
        // image_src is always a data URI; the payload follows the comma.
        let Some((_, encoded)) = src.split_once(',') else {
            continue;
        };
        let bytes = STANDARD
            .decode(encoded.trim())
            .with_context(|| format!("invalid annotated image for '{}'", view.filename))?;

        let stem = Path::new(&view.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "result".to_string());
        let path = out_dir.join(format!("{stem}.annotated.png"));
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        println!("wrote {}", path.display());
    }

    Ok(())
}
