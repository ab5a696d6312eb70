use anyhow::Result;
use colored::Colorize;
use feedback_service::model::Product;
use feedback_service::stats::{DashboardStats, ProductStats};

use crate::client::{path_segment, ApiClient};
use crate::output;

pub async fn execute(client: &ApiClient, json: bool, product: Option<Product>) -> Result<()> {
    match product {
        Some(product) => product_stats(client, json, product).await,
        None => dashboard(client, json).await,
    }
}

async fn dashboard(client: &ApiClient, json: bool) -> Result<()> {
    let envelope = client.get("/api/admin/stats/dashboard").await?;
    if json {
        output::print_json(&envelope.raw);
        return Ok(());
    }

    let stats: DashboardStats = envelope.data()?;
    println!("{}", "Dashboard".bold());
    println!("  Total feedback:  {}", stats.total_feedbacks);
    println!("  Average rating:  {:.2}", stats.average_rating);
    println!("  Recent:          {}", stats.recent_feedbacks);

    if !stats.feedbacks_by_product.is_empty() {
        println!();
        println!("{}", "By product".bold());
        for row in &stats.feedbacks_by_product {
            println!(
                "  {:<22} {:>4}  avg {:.2}",
                row.product.as_str(),
                row.count,
                row.avg_rating
            );
        }
    }

    if !stats.feedbacks_by_rating.is_empty() {
        println!();
        println!("{}", "By rating".bold());
        for row in &stats.feedbacks_by_rating {
            println!("  {}  {:>4}", output::stars(row.rating), row.count);
        }
    }
    Ok(())
}

async fn product_stats(client: &ApiClient, json: bool, product: Product) -> Result<()> {
    let path = format!(
        "/api/admin/stats/product/{}",
        path_segment(product.as_str())
    );
    let envelope = client.get(&path).await?;
    if json {
        output::print_json(&envelope.raw);
        return Ok(());
    }

    let product: Product = envelope.field("product")?;
    let stats: ProductStats = envelope.data()?;
    println!("{}", product.as_str().bold());
    println!("  Total feedback:  {}", stats.total_feedbacks);
    println!("  Average rating:  {:.2}", stats.average_rating);
    let ratings: Vec<String> = stats
        .rating_distribution
        .iter()
        .map(|r| r.to_string())
        .collect();
    println!("  Ratings (oldest first): {}", ratings.join(" "));
    Ok(())
}
