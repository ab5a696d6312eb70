use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::output;

pub async fn execute(client: &ApiClient, json: bool) -> Result<()> {
    let (health_status, health) = client.probe("/health").await?;
    let (ready_status, ready) = client.probe("/ready").await?;

    if json {
        output::print_json(&serde_json::json!({ "health": health, "ready": ready }));
    } else {
        println!("{}", "Checking service health...".bold());
        println!();

        print!("Health endpoint ({})... ", client.url("/health"));
        report(health_status.is_success());
        if let Some(version) = health.get("version").and_then(Value::as_str) {
            println!("  Version: {}", version);
        }

        print!("Readiness endpoint ({})... ", client.url("/ready"));
        report(ready_status.is_success());
        if let Some(deps) = ready.get("dependencies").and_then(Value::as_object) {
            for (name, dep) in deps {
                let message = dep.get("message").and_then(Value::as_str).unwrap_or("");
                println!("  {}: {}", name, message);
            }
        }
        println!();
    }

    if !health_status.is_success() || !ready_status.is_success() {
        anyhow::bail!(
            "Service is not ready (health HTTP {}, ready HTTP {})",
            health_status.as_u16(),
            ready_status.as_u16()
        );
    }

    if !json {
        println!("{}", "Service is healthy and ready!".green().bold());
    }
    Ok(())
}

fn report(ok: bool) {
    if ok {
        println!("{}", "✓ OK".green().bold());
    } else {
        println!("{}", "✗ FAILED".red().bold());
    }
}
