use std::fs::OpenOptions;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "otp_cli=info,otp_tui=info";

/// `~/.otp-verify/log/otp-verify.log`, when a home directory is known.
pub fn default_log_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".otp-verify").join("log").join("otp-verify.log"))
}

/// Install a file-backed `tracing` subscriber. Stdout belongs to the TUI, so logs never go there.
///
/// `RUST_LOG` overrides the default filter.
pub fn init(log_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("open {}", log_file.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| anyhow::anyhow!("install tracing subscriber: {err}"))
}
