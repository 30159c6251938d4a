//! Busplan - Command Line Interface
//!
//! This is the main entry point for the production planner.
//! Run with `--help` to see all available options.

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use busplan::{
    data::{load_catalog, load_request, ProducerPolicy},
    display::{display_batch, format_tree, write_csv},
    planner::plan_request,
    tree::TreeBuilder,
};

/// Command-line arguments for busplan.
#[derive(Parser, Debug)]
#[command(name = "busplan")]
#[command(author, version, about = "Plan machines and material flow for mainbus production", long_about = None)]
struct Cli {
    /// Path to the recipe and machine catalog
    #[arg(short, long, global = true, default_value = "data/factorio_items.json")]
    catalog: PathBuf,

    /// Accept several recipes for the same item (the first declared one is the default)
    #[arg(long, global = true)]
    allow_alternates: bool,

    /// Log planner decisions (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan every target of a request file
    Plan {
        /// Path to the request JSON (Produce, Limit, Mainbus, Recipes)
        request: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the production tree of one item
    Tree {
        /// Item to resolve (e.g., "electronic-circuit")
        item: String,

        /// Trunk items where the tree stops
        #[arg(short, long)]
        mainbus: Vec<String>,
    },

    /// List all producible items in the catalog
    Items,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let policy = if cli.allow_alternates {
        ProducerPolicy::DeclarationOrder
    } else {
        ProducerPolicy::Unique
    };
    let catalog = load_catalog(&cli.catalog, policy)?;
    info!(
        catalog = %cli.catalog.display(),
        recipes = catalog.recipes().len(),
        machines = catalog.machines().len(),
        "catalog loaded"
    );

    match cli.command {
        Commands::Plan { request, format } => {
            let request = load_request(&request)?;
            let batch = plan_request(&catalog, &request);

            match format {
                OutputFormat::Text => display_batch(&batch),
                OutputFormat::Csv => write_csv(&batch, io::stdout().lock())?,
            }

            if !batch.is_complete() {
                eprintln!("[WARNING] Some targets could not be planned.");
                std::process::exit(1);
            }
        }

        Commands::Tree { item, mainbus } => {
            let tree = TreeBuilder::new(&catalog)
                .with_trunk_items(mainbus)
                .build_target(&item)?;
            print!("{}", format_tree(&tree));
        }

        Commands::Items => {
            let items = catalog.producible_items();
            if items.is_empty() {
                println!("No producible items in {}.", cli.catalog.display());
            } else {
                println!("Producible items:");
                for item in items {
                    println!("  {}", item);
                }
            }
        }
    }

    Ok(())
}
