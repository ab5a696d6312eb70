use clap::Parser;
use colored::Colorize;

mod client;
mod commands;
mod output;

use client::ApiClient;
use commands::Commands;

/// feedback - command-line client for the feedback collector
#[derive(Parser)]
#[command(name = "feedback")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the running service
    #[arg(long, global = true, env = "FEEDBACK_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Admin bearer token from `feedback login`
    #[arg(long, global = true, env = "FEEDBACK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match ApiClient::new(&cli.url, cli.token) {
        Ok(client) => commands::execute(&client, cli.json, cli.command).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            if let Some(source) = e.source() {
                eprintln!("\n{} {}", "Caused by:".yellow(), source);
            }

            std::process::exit(1);
        }
    }
}
