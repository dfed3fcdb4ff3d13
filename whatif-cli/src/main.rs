use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use whatif_finance::{
    CachedPriceService, MerchantResolver, PerformanceCalculator, ReferenceData,
    YahooPriceService, analyze, load_reference,
};
use whatif_ingest::{ExtractionReport, StatementExtractor, read_pages};

mod config;
mod report;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "whatif",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("WHATIF_BUILD_SHA"), ")"),
    about = "What if you had bought the shares instead? Credit-card statement analysis"
)]
struct Cli {
    /// Use this config file instead of ~/.whatif/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, resolve and price every purchase in a statement
    Analyze {
        /// Statement PDF (or form-feed separated text with --text)
        path: PathBuf,

        /// Input is pre-extracted text, pages separated by form feeds
        #[arg(long)]
        text: bool,

        /// Skip price lookups; report matches only
        #[arg(long)]
        offline: bool,

        /// Write one row per match to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the transactions found in a statement
    Extract {
        path: PathBuf,

        #[arg(long)]
        text: bool,

        #[arg(long)]
        json: bool,
    },

    /// Resolve merchant descriptions to companies
    Resolve {
        #[arg(required = true)]
        merchants: Vec<String>,
    },

    /// List the reference companies
    Companies,

    /// Manage ~/.whatif/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    init_tracing(&cfg.logging.level);

    match cli.command {
        Command::Analyze {
            path,
            text,
            offline,
            csv,
            json,
        } => run_analyze(&cfg, &path, text, offline, csv.as_deref(), json)?,

        Command::Extract { path, text, json } => {
            let report = extract(&cfg, &path, text)?;
            if report.no_transactions_found() {
                println!("No transactions found in {}", path.display());
            } else if json {
                report::print_json(&report)?;
            } else {
                report::print_extraction(&report);
            }
        }

        Command::Resolve { merchants } => {
            let reference = load_reference(&cfg.reference, cfg.prices.timeout())?;
            let resolver = MerchantResolver::new(&reference, cfg.resolver_config());
            for merchant in &merchants {
                let resolution = resolver.resolve(merchant);
                if resolution.suppressed {
                    println!("{merchant}: payment method, not a merchant");
                    continue;
                }
                if resolution.candidates.is_empty() {
                    println!("{merchant}: no match");
                    continue;
                }
                println!("{merchant}:");
                for c in &resolution.candidates {
                    let score = c.score.map(|s| format!(" score={s}")).unwrap_or_default();
                    println!(
                        "  {} ({}, {:?}) {:?}{}",
                        c.company.canonical_name,
                        c.company.quote_symbol(),
                        c.company.exchange,
                        c.confidence,
                        score
                    );
                }
            }
        }

        Command::Companies => {
            let reference = load_reference(&cfg.reference, cfg.prices.timeout())?;
            print_companies(&reference);
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config(&cfg)?,
        },
    }

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env("WHATIF_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn extract(cfg: &Config, path: &Path, text: bool) -> Result<ExtractionReport> {
    let pages = read_pages(path, text)?;
    let extractor = StatementExtractor::new(&cfg.extract_config())
        .context("build statement extractor")?;
    Ok(extractor.extract(&pages))
}

fn run_analyze(
    cfg: &Config,
    path: &Path,
    text: bool,
    offline: bool,
    csv: Option<&Path>,
    json: bool,
) -> Result<()> {
    let report = extract(cfg, path, text)?;
    if report.no_transactions_found() {
        println!("No transactions found in {}", path.display());
        return Ok(());
    }

    let reference = load_reference(&cfg.reference, cfg.prices.timeout())?;
    let resolver = MerchantResolver::new(&reference, cfg.resolver_config());
    let today = cfg.today()?;

    let analysis = if offline {
        analyze(&report, &resolver, None, today)
    } else {
        let prices = CachedPriceService::new(YahooPriceService::new(&cfg.prices)?);
        let calculator = PerformanceCalculator::new(&prices, &cfg.prices.rates);
        analyze(&report, &resolver, Some(&calculator), today)
    };

    if let Some(out) = csv {
        report::write_csv_file(&analysis, out)?;
        println!("Wrote {}", out.display());
    }
    if json {
        report::print_json(&analysis)?;
    } else {
        report::print_analysis(&analysis);
    }
    Ok(())
}

fn print_companies(reference: &ReferenceData) {
    println!("Reference data v{} ({} companies)\n", reference.version, reference.companies.len());
    for c in &reference.companies {
        println!(
            "{:<8} {:<6} {:<24} {}",
            c.ticker,
            format!("{:?}", c.exchange),
            c.canonical_name,
            c.aliases.join(", ")
        );
    }
}
