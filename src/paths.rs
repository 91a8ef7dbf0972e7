//! Config directory resolution (XDG config or ~/.config/tiletrio).

use std::path::PathBuf;

const APP_DIR: &str = "tiletrio";

/// Base config directory: `$XDG_CONFIG_HOME`, else `$HOME/.config`, else the working directory.
fn config_base() -> PathBuf {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Path of `name` inside the app's config directory. The directory is created on write.
pub fn config_file(name: &str) -> PathBuf {
    config_base().join(APP_DIR).join(name)
}
