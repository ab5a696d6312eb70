use anyhow::Result;
use clap::Args;
use feedback_service::model::{Feedback, Product};
use feedback_service::services::FeedbackQuery;
use serde::Serialize;

use crate::client::{path_segment, ApiClient};
use crate::output;

/// Accept `Microsoft Word` as well as `word`
pub fn parse_product(value: &str) -> Result<Product, String> {
    let wanted = value.trim().to_lowercase();
    Product::ALL
        .into_iter()
        .find(|p| p.as_str().to_lowercase() == wanted || p.short_name().to_lowercase() == wanted)
        .ok_or_else(|| {
            let known: Vec<&str> = Product::ALL.iter().map(|p| p.short_name()).collect();
            format!("unknown product '{}' (expected one of: {})", value, known.join(", "))
        })
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Your name
    #[arg(long)]
    pub name: String,

    /// Contact email
    #[arg(long)]
    pub email: String,

    /// Product name, e.g. "Microsoft Teams" or "teams"
    #[arg(long, value_parser = parse_product)]
    pub product: Product,

    /// Star rating
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: u8,

    /// Optional comment
    #[arg(long, default_value = "")]
    pub message: String,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    name: &'a str,
    email: &'a str,
    product: Product,
    rating: u8,
    message: &'a str,
}

pub async fn submit(client: &ApiClient, json: bool, args: SubmitArgs) -> Result<()> {
    let body = SubmitBody {
        name: &args.name,
        email: &args.email,
        product: args.product,
        rating: args.rating,
        message: &args.message,
    };
    let envelope = client.post("/api/feedback", &body).await?;

    if json {
        output::print_json(&envelope.raw);
        return Ok(());
    }

    let feedback: Feedback = envelope.data()?;
    output::success(envelope.message().unwrap_or("Feedback submitted"));
    output::print_feedback(&feedback);
    Ok(())
}

#[derive(Debug, Default, Args)]
pub struct ListArgs {
    /// Only this product
    #[arg(long, value_parser = parse_product)]
    pub product: Option<Product>,

    /// Only this rating
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: Option<u8>,

    /// Substring to look for in names and messages
    #[arg(long)]
    pub keyword: Option<String>,

    /// Earliest submission date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Latest submission date, inclusive (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub end_date: Option<String>,
}

impl ListArgs {
    /// Query string for the filter endpoint, `None` when nothing is filtered
    pub fn to_query(&self) -> Option<FeedbackQuery> {
        let query = FeedbackQuery {
            product: self.product.map(|p| p.as_str().to_string()),
            rating: self.rating.map(|r| r.to_string()),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            keyword: self.keyword.clone(),
        };
        (query != FeedbackQuery::default()).then_some(query)
    }
}

pub async fn list(client: &ApiClient, json: bool, args: ListArgs) -> Result<()> {
    let envelope = match args.to_query() {
        Some(query) => client.get_query("/api/feedback/filter", &query).await?,
        None => client.get("/api/feedback").await?,
    };

    if json {
        output::print_json(&envelope.raw);
        return Ok(());
    }

    let items: Vec<Feedback> = envelope.data()?;
    output::print_feedback_list(&items);
    Ok(())
}

pub async fn show(client: &ApiClient, json: bool, id: &str) -> Result<()> {
    let path = format!("/api/feedback/{}", path_segment(id));
    let envelope = client.get(&path).await?;

    if json {
        output::print_json(&envelope.raw);
        return Ok(());
    }

    let feedback: Feedback = envelope.data()?;
    output::print_feedback(&feedback);
    Ok(())
}

pub async fn delete(client: &ApiClient, json: bool, id: &str) -> Result<()> {
    let path = format!("/api/feedback/{}", path_segment(id));
    let envelope = client.delete(&path).await?;

    if json {
        output::print_json(&envelope.raw);
    } else {
        output::success(envelope.message().unwrap_or("Feedback deleted"));
    }
    Ok(())
}
