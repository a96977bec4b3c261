use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pomodroid", version, about = "Pomodoro countdown timer")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pomodoro or break countdown in the foreground
    Run(commands::run::RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List timer states with their codes
    States {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "pomodroid=debug,pomodroid_core=debug"
    } else {
        "pomodroid=info,pomodroid_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::States { json } => commands::states::run(json),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pomodroid", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
