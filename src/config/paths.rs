use directories::ProjectDirs;
use std::path::PathBuf;

pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "Zimbratosthenes").map(|d| d.config_dir().to_path_buf())
}

/// Location of the stored account profiles.
pub fn profiles_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join("profiles.json"))
}
