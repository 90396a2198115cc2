//! Default filesystem locations.

use std::path::PathBuf;
use thiserror::Error;

/// Directory (relative to the home directory) the desktop app is installed in.
pub const APP_DIR_RELATIVE: &str = "Language_app_qt";

/// File name of the companion script inside [`APP_DIR_RELATIVE`].
pub const COMPANION_SCRIPT_NAME: &str = "server.py";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the user's home directory.
    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Default location of the companion script: `$HOME/Language_app_qt/server.py`.
pub fn default_script_path() -> Result<PathBuf, PathError> {
    let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
    Ok(home.join(APP_DIR_RELATIVE).join(COMPANION_SCRIPT_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_script_lives_under_app_dir() {
        if let Ok(path) = default_script_path() {
            assert!(path.ends_with("Language_app_qt/server.py"));
        }
    }
}
