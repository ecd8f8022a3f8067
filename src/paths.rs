use std::path::PathBuf;

/// Environment variable that relocates the console's state directory.
pub const ROOT_ENV: &str = "AUDIENCE_ROOT";

/// Returns the directory holding the console's configuration.
///
/// Resolution order:
/// 1. `AUDIENCE_ROOT` environment variable (if set and non-empty)
/// 2. Current working directory + `.audience`
pub fn console_root() -> PathBuf {
    match std::env::var(ROOT_ENV) {
        Ok(root) if !root.is_empty() => PathBuf::from(root),
        _ => PathBuf::from(".audience"),
    }
}

/// Returns the path to the YAML configuration file.
pub fn config_file() -> PathBuf {
    console_root().join("config.yaml")
}
