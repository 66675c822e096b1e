use anyhow::{Context, Result};
use clap::Parser;
use img_batch::cli::{Args, Commands};
use img_batch::constants::{DEFAULT_QUALITY, DEFAULT_SCALE_RATIO};
use img_batch::validation::{normalize_target, validate_directory};
use img_batch::{
    analyze_directory, compress_directory, logger, replace_with_compressed, ImageCodec,
    TransformParams,
};
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init().context("Failed to initialise logging")?;

    match args.command {
        Commands::Compress {
            dir,
            quality,
            target_width,
            target_height,
            scale_ratio,
        } => {
            let params = TransformParams::new(
                quality.unwrap_or(DEFAULT_QUALITY),
                normalize_target(target_width),
                normalize_target(target_height),
                scale_ratio.unwrap_or(DEFAULT_SCALE_RATIO),
            )
            .context("Invalid compression parameters")?;
            check_directory(&dir)?;
            compress_directory(&dir, &params, &ImageCodec::default())?;
        }
        Commands::Replace { dir } => {
            check_directory(&dir)?;
            replace_with_compressed(&dir)?;
        }
        Commands::Analyze { dir } => {
            check_directory(&dir)?;
            analyze_directory(&dir)?;
        }
    }

    Ok(())
}

fn check_directory(dir: &Path) -> Result<()> {
    validate_directory(dir).with_context(|| format!("Cannot process {:?}", dir))
}
