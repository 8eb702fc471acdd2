use clap::{Args, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::config::{Config, ConfigSource};

#[derive(Clone, ValueEnum, Default)]
pub enum ConfigFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: ConfigFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# shop configuration

# Base URL of the recipe server
# server_url: https://recipes.example.com

# API token (or set SHOP_API_TOKEN)
# api_token: your-token

# List used when --list is not given (id or name)
# default_list: Groceries

# Request timeout in seconds
timeout_secs: 15
"#;

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    ConfigFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    ConfigFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                cli_config_path
                                    .unwrap_or_else(Config::default_config_path)
                                    .display()
                            );
                        }
                        println!();

                        print_value("server_url", config.server_url.value.as_deref(), &config.server_url.source);
                        let token = config.api_token.value.as_ref().map(|_| "********");
                        print_value("api_token", token, &config.api_token.source);
                        print_value(
                            "default_list",
                            config.default_list.value.as_deref(),
                            &config.default_list.source,
                        );

                        println!("timeout_secs: {}", config.timeout_secs.value);
                        println!("  source: {}", config.timeout_secs.source);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'shop config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to set your server and token.");
                Ok(())
            }
        }
    }
}

fn print_value(name: &str, value: Option<&str>, source: &ConfigSource) {
    println!("{}: {}", name, value.unwrap_or("(not set)"));
    println!("  source: {}", source);
    println!();
}
