//! Roundsale command line interface
//!
//! Operator tooling for sale configurations: validate a config file,
//! inspect the round schedule, and quote hypothetical contributions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roundsale_pricing::RoundSchedule;
use roundsale_sale::SaleConfig;
use roundsale_types::{format_val, val_from_decimal, AttoVal};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roundsale-cli")]
#[command(about = "Roundsale sale configuration tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the sale configuration file
    #[arg(long, default_value = "sale.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print a summary
    Validate,
    /// Print the round schedule
    Schedule,
    /// Price a hypothetical contribution
    Quote {
        /// Value already raised, as a decimal VAL amount
        #[arg(long, default_value = "0")]
        raised: String,
        /// Contribution to price, as a decimal VAL amount
        amount: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let schedule = config
        .build_schedule()
        .context("invalid round schedule")?;

    match cli.command {
        Commands::Validate => validate(&config, &schedule),
        Commands::Schedule => print_schedule(&schedule),
        Commands::Quote { raised, amount } => quote(&schedule, &raised, &amount),
    }
}

fn load_config(path: &Path) -> Result<SaleConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    debug!(target: "cli", "Loaded sale config from {}", path.display());
    Ok(config)
}

fn validate(config: &SaleConfig, schedule: &RoundSchedule) -> Result<()> {
    println!("Configuration OK");
    println!("  rounds:        {}", schedule.len());
    println!("  cap:           {}", format_val(schedule.cap()));
    println!("  minimum:       {}", format_val(config.min_contribution));
    println!("  beneficiary:   {}", config.beneficiary);
    println!("  administrator: {}", config.administrator);
    Ok(())
}

fn print_schedule(schedule: &RoundSchedule) -> Result<()> {
    println!(
        "{:<7} {:>20} {:>14}",
        "round", "cumulative goal", "credits/VAL"
    );
    for (index, round) in schedule.rounds().iter().enumerate() {
        println!(
            "{:<7} {:>20} {:>14}",
            index,
            format_val(round.goal),
            round.rate
        );
    }
    Ok(())
}

fn quote(schedule: &RoundSchedule, raised: &str, amount: &str) -> Result<()> {
    let raised = parse_amount(raised, "--raised")?;
    let amount = parse_amount(amount, "amount")?;

    let quote = schedule.price_contribution(raised, amount)?;
    if quote.is_empty() {
        println!(
            "Sale closed: cap of {} already reached",
            format_val(schedule.cap())
        );
        return Ok(());
    }

    for segment in &quote.segments {
        println!(
            "{:>20} at {:>6} credits/VAL",
            format_val(segment.amount),
            segment.rate
        );
    }
    println!("consumed: {}", format_val(quote.consumed));
    if quote.consumed < amount {
        println!(
            "short by {} (the engine rejects cap-crossing purchases in full)",
            format_val(amount - quote.consumed)
        );
    }
    println!("credit:   {} units", quote.units);
    Ok(())
}

fn parse_amount(raw: &str, what: &str) -> Result<AttoVal> {
    val_from_decimal(raw).with_context(|| format!("invalid {what} amount: {raw}"))
}
