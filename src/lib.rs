pub mod batch;
pub mod cli;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod formats;
pub mod info;
pub mod logger;
pub mod naming;
pub mod processing;
pub mod replace;
pub mod stats;
pub mod utils;
pub mod validation;

pub use batch::{compress_directory, compress_directory_with, default_worker_count, Scheduler};
pub use discovery::{find_compressed_siblings, FileEnumerator, WorkItem};
pub use error::{CompressionError, ErrorKind, Result};
pub use formats::SaveProfile;
pub use info::{analyze_directory, analyze_directory_with, AnalysisReport};
pub use processing::{transform, Codec, ImageCodec, TransformParams, TransformResult};
pub use replace::{
    replace_with_compressed, replace_with_compressed_using, FileOps, ReplaceOp, ReplaceSummary,
    StdFileOps, SwapOutcome, SwapState,
};
pub use stats::{CompressionStats, ResolutionHistogram, StatsReport};
