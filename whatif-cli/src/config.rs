use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use whatif_core::Diagnostics;
use whatif_finance::{PriceConfig, ReferenceConfig, ResolverConfig};
use whatif_ingest::ExtractConfig;

use crate::state::{ensure_whatif_home, whatif_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub statement: StatementSection,
    pub reference: ReferenceConfig,
    pub resolver: ResolverConfig,
    pub prices: PriceConfig,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementSection {
    /// IANA zone that decides what "today" is for the future-date check.
    pub timezone: String,
    #[serde(flatten)]
    pub extract: ExtractConfig,
}

impl Default for StatementSection {
    fn default() -> Self {
        Self {
            timezone: "Asia/Jerusalem".to_string(),
            extract: ExtractConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `tracing` filter directive; `WHATIF_LOG` overrides it.
    pub level: String,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            diagnostics: Diagnostics::default(),
        }
    }
}

impl Config {
    /// Component configs carry the diagnostics switches from `[logging]`.
    pub fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            diagnostics: self.logging.diagnostics,
            ..self.statement.extract.clone()
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            diagnostics: self.logging.diagnostics,
            ..self.resolver.clone()
        }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.statement
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("unknown timezone {:?}: {e}", self.statement.timezone))
    }

    pub fn today(&self) -> Result<NaiveDate> {
        Ok(Utc::now().with_timezone(&self.timezone()?).date_naive())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(whatif_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    load_config_from(&p)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = ensure_whatif_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(cfg: &Config) -> Result<()> {
    print!("{}", toml::to_string_pretty(cfg).context("serialize config")?);
    Ok(())
}
