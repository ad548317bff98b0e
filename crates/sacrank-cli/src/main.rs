use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "sacrank", version, about = "Rank upcoming exams and SACs by priority")]
struct Cli {
    /// Directory holding the CSV data files (overrides `data.dir`)
    #[arg(long, global = true, env = "SACRANK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print exams in priority order
    Rank(commands::rank::RankArgs),
    /// Exam list management
    Exams {
        #[command(subcommand)]
        action: commands::exams::ExamsAction,
    },
    /// Per-subject score analytics
    Subjects {
        #[command(subcommand)]
        action: commands::subjects::SubjectsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;
    let result = match cli.command {
        Commands::Rank(args) => commands::rank::run(args, data_dir),
        Commands::Exams { action } => commands::exams::run(action, data_dir),
        Commands::Subjects { action } => commands::subjects::run(action, data_dir),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
