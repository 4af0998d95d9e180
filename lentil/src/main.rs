mod run_query;

use run_query::*;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lentil", version, about, long_about = None)]
///
/// `lentil` active query selection for partially observed cascades
/// - query: run query sessions over a batch of cascades
///
struct Cli {
    #[arg(short = 'v', long, global = true, help = "Enable verbose output `RUST_LOG=info`")]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select queries on each cascade and record the inferred infection probabilities
    Query(QueryArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match &cli.commands {
        Commands::Query(args) => {
            run_query(args)?;
        }
    }

    Ok(())
}
