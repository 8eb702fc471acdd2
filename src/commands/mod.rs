mod config_cmd;
mod foods;
mod import;
mod items;
mod lists;

use clap::{Args, ValueEnum};

pub use config_cmd::ConfigCommand;
pub use foods::FoodsCommand;
pub use import::ImportCommand;
pub use items::{
    AddCommand, CheckCommand, ClearCheckedCommand, DeleteCommand, EditCommand, ShowCommand,
};
pub use lists::{ListCommand, ListsCommand};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Which list a command works on.
#[derive(Args, Clone, Default)]
pub struct ListSelector {
    /// List id or name (defaults to the configured list)
    #[arg(long, short)]
    pub list: Option<String>,
}
