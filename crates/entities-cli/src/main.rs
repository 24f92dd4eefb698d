//! Entities demo program
//!
//! Declares a small bank model, prints the keys of a few instances and shows
//! one failing and one passing validation.

mod demo;
mod formatter;

use clap::Parser;
use formatter::OutputFormat;
use tracing::info;

/// Entities demo program
#[derive(Parser, Debug)]
#[command(name = "entities")]
#[command(version, about = "Declare a bank model, print its keys and validate it")]
pub struct Args {
    /// Output format
    #[arg(long, default_value = "text", value_enum)]
    pub format: OutputFormat,

    /// Also print blake3 fingerprints of the keys
    #[arg(long)]
    pub fingerprint: bool,

    /// Number of customers to generate
    #[arg(long, default_value_t = 1)]
    pub customers: usize,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("entities_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let model = demo::BankModel::declare()?;
    info!(customers = args.customers, "declared bank model");

    let report = demo::run(&model, args.customers, args.fingerprint)?;
    let formatter = formatter::create_formatter(args.format);

    println!("{}", formatter.format_report(&report));
    Ok(())
}
