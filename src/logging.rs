use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Pick the log level: each `-v` raises it, otherwise the configured level,
/// otherwise info.
pub fn resolve_level(verbose: u8, configured: Option<&str>) -> Level {
    match verbose {
        0 => configured
            .and_then(|level| Level::from_str(level.trim()).ok())
            .unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Log to stderr, for the one-shot commands.
pub fn init_stderr(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

/// Log to a file, for the TUI which owns the terminal.
pub fn init_file(level: Level, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_flag_overrides_config() {
        assert_eq!(resolve_level(1, Some("warn")), Level::DEBUG);
        assert_eq!(resolve_level(3, None), Level::TRACE);
    }

    #[test]
    fn test_configured_level_used_without_flag() {
        assert_eq!(resolve_level(0, Some("warn")), Level::WARN);
        assert_eq!(resolve_level(0, Some("nonsense")), Level::INFO);
        assert_eq!(resolve_level(0, None), Level::INFO);
    }
}
