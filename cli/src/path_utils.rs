use std::path::Path;
use std::path::PathBuf;

/// Resolve a leading `~` in a user-supplied path (flags arrive unexpanded when quoted).
pub fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Inverse of [`expand_tilde`], for error messages.
pub fn display_with_tilde(path: &Path) -> String {
    let relative = dirs::home_dir().and_then(|home| {
        path.strip_prefix(&home)
            .ok()
            .map(|rest| Path::new("~").join(rest))
    });
    relative.as_deref().unwrap_or(path).display().to_string()
}
