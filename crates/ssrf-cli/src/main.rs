use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "ssrf-cli", version, about = "SSRF review scheduler CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learning unit management
    Unit {
        #[command(subcommand)]
        action: commands::unit::UnitAction,
    },
    /// Grade a learning unit and schedule its next review
    Review(commands::review::ReviewArgs),
    /// Estimated next review for every grade, without saving
    Preview(commands::preview::PreviewArgs),
    /// Per-day workload, difficulty and load coefficient
    Load(commands::load::LoadArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_tracing();

    let result = match cli.command {
        Commands::Unit { action } => commands::unit::run(action),
        Commands::Review(args) => commands::review::run(args),
        Commands::Preview(args) => commands::preview::run(args),
        Commands::Load(args) => commands::load::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
