use anyhow::Result;
use clap::Args;
use colored::Colorize;
use feedback_service::services::{AuthResponse, LoginInput};

use crate::client::ApiClient;
use crate::output;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Admin email
    #[arg(long, env = "FEEDBACK_EMAIL")]
    pub email: String,

    /// Admin password
    #[arg(long, env = "FEEDBACK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn login(client: &ApiClient, json: bool, args: LoginArgs) -> Result<()> {
    let body = LoginInput {
        email: Some(args.email),
        password: Some(args.password),
    };
    let envelope = client.post("/api/admin/login", &body).await?;

    if json {
        output::print_json(&envelope.raw);
        return Ok(());
    }

    let auth: AuthResponse = envelope.data()?;
    output::success(&format!("Logged in as {} <{}>", auth.name, auth.email));
    println!();
    println!("{}", "Use the token for admin commands:".bold());
    println!("  export FEEDBACK_TOKEN={}", auth.token);
    Ok(())
}
