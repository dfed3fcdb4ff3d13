use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$WHATIF_HOME`, or `~/.whatif`.
pub fn whatif_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("WHATIF_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".whatif"))
}

pub fn ensure_whatif_home() -> Result<PathBuf> {
    let dir = whatif_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
