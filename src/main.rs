use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "ctxhelp")]
#[command(about = "Generate and view contextual help for Python GUI applications", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the GUI framework of a Python file and list its named elements
    Analyze {
        /// Python source file
        file: PathBuf,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,

        /// JSON file with widget allowlists
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a help file with an empty entry for every element
    Generate {
        /// Python source file
        file: PathBuf,

        /// Help file to write
        #[arg(short, long, default_value = "help.ftxt")]
        output: PathBuf,

        /// Keep the entries of an existing help file
        #[arg(long)]
        merge: bool,

        /// JSON file with widget allowlists
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render the help for one element
    Show {
        /// Help file
        help_file: PathBuf,

        /// Element identifier
        #[arg(required_unless_present = "general")]
        identifier: Option<String>,

        /// Show the general title and description instead
        #[arg(long, conflicts_with = "identifier")]
        general: bool,
    },

    /// List the elements of a help file
    List {
        /// Help file
        help_file: PathBuf,
    },

    /// Validate a help file
    Check {
        /// Help file
        help_file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze { file, json, config } => {
            commands::analyze(&file, json, config.as_deref())
        }
        Commands::Generate {
            file,
            output,
            merge,
            config,
        } => commands::generate(&file, &output, merge, config.as_deref()),
        Commands::Show {
            help_file,
            identifier,
            general,
        } => commands::show(&help_file, identifier.as_deref(), general),
        Commands::List { help_file } => commands::list(&help_file),
        Commands::Check { help_file } => commands::check(&help_file),
    }
}
