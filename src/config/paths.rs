//! Configuration file discovery.
//!
//! The rc file location is resolved in a fixed order so users can override
//! the platform default per shell or per working directory.

use std::env;
use std::path::PathBuf;

/// File name of the rc settings file.
pub const RC_FILE_NAME: &str = "plotoptrc.toml";
/// Environment variable pointing at the rc file or its directory.
pub const RC_ENV_KEY: &str = "PLOTOPTRC";
/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV_KEY: &str = "PLOTOPT_CONFIGDIR";

/// Configuration directory: `$PLOTOPT_CONFIGDIR` if set, else the platform
/// config dir plus `plotopt`. `None` when neither can be determined.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV_KEY) {
        return Some(PathBuf::from(dir));
    }
    dirs_next::config_dir().map(|dir| dir.join("plotopt"))
}

/// Location of the rc file, resolved in order:
///
/// 1. `./plotoptrc.toml` in the current working directory;
/// 2. `$PLOTOPTRC`, pointing at the file or at a directory containing it;
/// 3. `$PLOTOPT_CONFIGDIR/plotoptrc.toml`;
/// 4. the platform config dir plus `plotopt/plotoptrc.toml`.
///
/// Returns `None` when no candidate exists on disk.
#[must_use]
pub fn config_file() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        let candidate = cwd.join(RC_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    if let Ok(raw) = env::var(RC_ENV_KEY) {
        let path = PathBuf::from(raw);
        if path.is_dir() {
            let candidate = path.join(RC_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
        } else if path.is_file() {
            return Some(path);
        }
    }

    let candidate = config_dir()?.join(RC_FILE_NAME);
    candidate.is_file().then_some(candidate)
}
