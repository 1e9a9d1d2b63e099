use std::path::{Path, PathBuf};

/// Application directory name under the XDG roots.
const APP_DIR: &str = "tonearm";

pub const DEFAULT_MPD_HOST: &str = "localhost";
pub const DEFAULT_MPD_PORT: u16 = 6600;

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/tonearm/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// System-wide config consulted when the user has none.
pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc").join(APP_DIR).join("config.toml")
}

/// Default lyrics cache, kept in the dotdir the original client used.
pub fn lyrics_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tonearm")
        .join("lyrics")
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
