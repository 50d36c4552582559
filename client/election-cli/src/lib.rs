//! Command line front-end for the election contract.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use election_client::{from_toml_path, ClientConfig};
use tracing::info;

pub mod workflows;

pub use clap;

/// Environment variable naming the configuration file.
pub const ELECTION_CONFIG: &str = "ELECTION_CONFIG";

/// File name looked up in the working and user configuration directories.
pub const CONFIG_FILE_NAME: &str = "election_config.toml";

/// The configuration file to use, if any.
///
/// Tried in order: `explicit`, the `ELECTION_CONFIG` variable, `election_config.toml`
/// in the working directory, then the same file in the user's configuration directory.
pub fn config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    let user_dir = ProjectDirs::from("", "", "election").map(|dirs| dirs.config_dir().to_path_buf());
    config_path_from(
        explicit,
        env::var_os(ELECTION_CONFIG).map(PathBuf::from),
        [Some(PathBuf::from(".")), user_dir].into_iter().flatten(),
    )
}

/// [`config_path`] with the environment made explicit.
///
/// `explicit` and `from_env` are returned as they are, even when the file is missing,
/// so that loading it reports the error. Search directories only match existing files.
pub fn config_path_from(
    explicit: Option<PathBuf>,
    from_env: Option<PathBuf>,
    search_dirs: impl IntoIterator<Item = PathBuf>,
) -> Option<PathBuf> {
    explicit.or(from_env).or_else(|| {
        search_dirs
            .into_iter()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|path| path.is_file())
    })
}

/// Reads the configuration at `path`, or the defaults when there is none.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    match path {
        Some(path) => {
            info!("Reading election config from {path:?}");
            from_toml_path(path)
                .with_context(|| format!("Failed to read election configuration from {path:?}"))
        }
        None => {
            info!("No election config found, using defaults");
            Ok(ClientConfig::default())
        }
    }
}
