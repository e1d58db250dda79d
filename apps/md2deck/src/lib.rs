pub mod config;
pub mod package;
pub mod style;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use deck_core::{build_deck, DeckOptions, Image};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{load_options, Args};
use crate::package::{write_apkg, MediaFile, PackageSummary};
use crate::style::load_stylesheet;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    convert(&args).await?;
    Ok(())
}

/// Convert the document named by `args` into a package. Returns the output
/// path and what was written.
pub async fn convert(args: &Args) -> anyhow::Result<(PathBuf, PackageSummary)> {
    if !args.input.is_file() {
        bail!("input file {} does not exist", args.input.display());
    }

    let base = match &args.options {
        Some(path) => load_options(path).await?,
        None => DeckOptions::default(),
    };
    let options = args.deck_options(base);

    tracing::info!("Reading {}", args.input.display());
    let source = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;

    let document_dir = args.input.parent().unwrap_or_else(|| Path::new(""));
    let mut deck = build_deck(&source, document_dir, &options)?;
    if deck.name.trim().is_empty() {
        deck.name = args
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Default".to_string());
    }

    let css = load_stylesheet(options.code_style.as_deref().map(Path::new)).await?;
    let media = load_media(&deck.images).await;

    let output = args.output_path();
    let summary = {
        let target = output.clone();
        tokio::task::spawn_blocking(move || write_apkg(&deck, &css, &media, &target))
            .await
            .context("package writer task failed")?
            .with_context(|| format!("writing {}", output.display()))?
    };

    tracing::info!(
        cards = summary.cards,
        media = summary.media,
        "Wrote {}",
        output.display()
    );
    Ok((output, summary))
}

/// Read every referenced image. Unreadable files are skipped.
async fn load_media(images: &[Image]) -> Vec<MediaFile> {
    let mut media = Vec::with_capacity(images.len());
    for image in images {
        match tokio::fs::read(&image.file_path).await {
            Ok(data) => media.push(MediaFile {
                name: image.filtered_path.clone(),
                data,
            }),
            Err(e) => tracing::warn!("skipping image {}: {}", image.file_path, e),
        }
    }
    media
}
