//! Persist the record score to disk (XDG config or ~/.config/blockfall).

use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "blockfall";
const FILENAME: &str = "highscores";

/// Base config directory: `$XDG_CONFIG_HOME`, else `$HOME/.config`, else `.`.
fn config_base() -> PathBuf {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Path of the record file under `base`.
fn record_path(base: &Path) -> PathBuf {
    base.join(APP_DIR).join(FILENAME)
}

/// Load the record score. Missing or unreadable file counts as 0.
pub fn load_top_points() -> u32 {
    load_from(&config_base())
}

pub fn save_top_points(points: u32) -> Result<()> {
    save_to(&config_base(), points)
}

fn load_from(base: &Path) -> u32 {
    fs::read_to_string(record_path(base))
        .ok()
        .and_then(|s| s.lines().next().and_then(|l| l.trim().parse().ok()))
        .unwrap_or(0)
}

fn save_to(base: &Path, points: u32) -> Result<()> {
    let path = record_path(base);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    writeln!(f, "{}", points)?;
    Ok(())
}
