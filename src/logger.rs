use std::io::IsTerminal;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;

/// Installs the process-wide subscriber. Per-file and summary lines go to
/// stdout at INFO; colours only when stdout is a terminal.
pub fn init() -> Result<(), SetGlobalDefaultError> {
    init_with_level(Level::INFO)
}

pub fn init_with_level(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
