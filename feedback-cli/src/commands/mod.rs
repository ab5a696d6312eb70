use anyhow::Result;
use clap::Subcommand;
use feedback_service::model::Product;

use crate::client::ApiClient;

mod auth;
mod feedback;
mod health;
mod stats;

pub use auth::LoginArgs;
pub use feedback::{parse_product, ListArgs, SubmitArgs};

#[derive(Subcommand)]
pub enum Commands {
    /// Check the liveness and readiness probes
    Health,

    /// Submit feedback for a product
    Submit(SubmitArgs),

    /// Log in as an admin and print a bearer token
    Login(LoginArgs),

    /// List feedback, newest first (admin)
    List(ListArgs),

    /// Show one feedback record (admin)
    Show {
        /// Feedback id, e.g. fb_01h455vb4pex5vsknk084sn02q
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Delete one feedback record (admin)
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Dashboard statistics, or one product's statistics (admin)
    Stats {
        /// Limit to a single product
        #[arg(long, value_parser = parse_product)]
        product: Option<Product>,
    },
}

pub async fn execute(client: &ApiClient, json: bool, command: Commands) -> Result<()> {
    match command {
        Commands::Health => health::execute(client, json).await,
        Commands::Submit(args) => feedback::submit(client, json, args).await,
        Commands::Login(args) => auth::login(client, json, args).await,
        Commands::List(args) => feedback::list(client, json, args).await,
        Commands::Show { id } => feedback::show(client, json, &id).await,
        Commands::Delete { id } => feedback::delete(client, json, &id).await,
        Commands::Stats { product } => stats::execute(client, json, product).await,
    }
}
