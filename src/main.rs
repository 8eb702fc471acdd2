use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod context;

use commands::{
    AddCommand, CheckCommand, ClearCheckedCommand, ConfigCommand, DeleteCommand, EditCommand,
    FoodsCommand, ImportCommand, ListCommand, ListsCommand, ShowCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "shop")]
#[command(version)]
#[command(about = "Shared shopping lists with meal-plan imports", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log remote calls and reconciliation to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show all shopping lists
    Lists(ListsCommand),

    /// Create, rename or delete a list
    List(ListCommand),

    /// Show the items of a list
    Show(ShowCommand),

    /// Add an item
    Add(AddCommand),

    /// Change an item's text, quantity, food or unit
    Edit(EditCommand),

    /// Mark items as checked
    Check(CheckCommand),

    /// Uncheck previously checked items
    Uncheck(CheckCommand),

    /// Delete items, stopping at the first failure
    Delete(DeleteCommand),

    /// Delete all checked items
    ClearChecked(ClearCheckedCommand),

    /// Add the ingredients of planned recipes
    Import(ImportCommand),

    /// Search the food catalogue
    Foods(FoodsCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;

    match &cli.command {
        Some(Commands::Lists(cmd)) => cmd.run(&config)?,
        Some(Commands::List(cmd)) => cmd.run(&config)?,
        Some(Commands::Show(cmd)) => cmd.run(&config)?,
        Some(Commands::Add(cmd)) => cmd.run(&config)?,
        Some(Commands::Edit(cmd)) => cmd.run(&config)?,
        Some(Commands::Check(cmd)) => cmd.run(&config, true)?,
        Some(Commands::Uncheck(cmd)) => cmd.run(&config, false)?,
        Some(Commands::Delete(cmd)) => cmd.run(&config)?,
        Some(Commands::ClearChecked(cmd)) => cmd.run(&config)?,
        Some(Commands::Import(cmd)) => cmd.run(&config)?,
        Some(Commands::Foods(cmd)) => cmd.run(&config)?,
        Some(Commands::Config(cmd)) => cmd.run(&config, cli_config_path)?,
        None => println!("Use --help to see available commands"),
    }

    Ok(())
}

/// Logs go to stderr so table and JSON output stay clean.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("shop=debug,shopsync_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_multiple_items() {
        let cli = Cli::try_parse_from(["shop", "check", "milk", "eggs", "--list", "Weekly"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check(_))));
    }

    #[test]
    fn test_parse_import_range() {
        let cli =
            Cli::try_parse_from(["shop", "import", "--from", "2026-01-11", "--to", "2026-01-17"])
                .unwrap();
        assert!(matches!(cli.command, Some(Commands::Import(_))));
    }

    #[test]
    fn test_check_requires_an_item() {
        assert!(Cli::try_parse_from(["shop", "check"]).is_err());
    }
}
