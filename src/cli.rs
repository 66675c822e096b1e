use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-batch",
    about = "Batch image compressor with in-place replacement and resolution analysis",
    long_about = "img-batch compresses every JPEG, PNG and WebP image below a directory into a \
                  `_min` sibling, keeping only outputs that are smaller than their source. \
                  Compressed siblings can then be swapped over the originals with `replace`.",
    version,
    after_help = "EXAMPLES:\n  \
    img-batch compress ./photos\n  \
    img-batch compress ./photos 70 1920 1080 0.5\n  \
    img-batch compress ./photos 60 0 720\n  \
    img-batch replace ./photos\n  \
    img-batch analyze ./photos"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress every image in a directory tree into `_min` siblings",
        long_about = "Recursively compress JPEG, PNG and WebP images. Each output is written next \
                      to its source as `name_min.ext` and kept only if it is smaller. \
                      Files already named `*_min.*` are never processed again."
    )]
    Compress {
        #[arg(help = "Directory to process recursively")]
        dir: PathBuf,

        #[arg(
            help = "Compression quality (1-100, default: 50)",
            long_help = "Lossy quality from 1 (smallest) to 100 (best). \
                         Ignored for PNG and for WebP sources with transparency."
        )]
        quality: Option<u32>,

        #[arg(
            help = "Target width in pixels (0 = none)",
            long_help = "Images wider than this are shrunk toward it. \
                         Use 0 to give a target height without a width."
        )]
        target_width: Option<u32>,

        #[arg(help = "Target height in pixels (0 = none)")]
        target_height: Option<u32>,

        #[arg(
            help = "Scale ratio in [0, 1] (default: 0.5)",
            long_help = "How far an oversized dimension is kept above its target: \
                         new = target + ratio * (original - target). \
                         0 would snap to the target, 1 keeps the original size."
        )]
        scale_ratio: Option<f32>,
    },

    #[command(
        about = "Replace originals with their `_min` siblings",
        long_about = "For every `name_min.ext` with an original `name.ext` beside it, swap the \
                      compressed file into the original name. Each swap goes through a \
                      `.backup` copy and is rolled back if it cannot complete."
    )]
    Replace {
        #[arg(help = "Directory to process recursively")]
        dir: PathBuf,
    },

    #[command(
        about = "Report the resolution distribution of images in a directory tree",
        long_about = "Read the header of every image below the directory and print how many \
                      images share each exact WxH resolution, most common first."
    )]
    Analyze {
        #[arg(help = "Directory to scan recursively")]
        dir: PathBuf,
    },
}
