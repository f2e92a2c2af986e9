use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pomoscreen-cli", version, about = "PomoScreen CLI")]
struct Cli {
    /// Log state machine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Curfew window inspection
    Curfew {
        #[command(subcommand)]
        action: commands::curfew::CurfewAction,
    },
    /// Replay a scripted event timeline through a focus session
    Simulate(commands::simulate::SimulateArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("POMOSCREEN_LOG")
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Curfew { action } => commands::curfew::run(action),
        Commands::Simulate(args) => commands::simulate::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
