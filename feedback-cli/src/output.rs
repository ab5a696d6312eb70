//! Human-readable rendering of API payloads

use colored::Colorize;
use feedback_service::model::{Feedback, Rating};
use serde_json::Value;

/// `★★★☆☆` for a rating of 3
pub fn stars(rating: Rating) -> String {
    let filled = usize::from(rating.value());
    let empty = usize::from(Rating::MAX) - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

/// Cut `text` to `max` characters, marking the cut with `…`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// One line per record
pub fn feedback_line(feedback: &Feedback) -> String {
    format!(
        "{}  {}  {:<22} {:<20} {}",
        feedback.created_at.format("%Y-%m-%d %H:%M"),
        stars(feedback.rating),
        feedback.product.as_str(),
        truncate(&feedback.name, 20),
        truncate(&feedback.message, 48)
    )
}

pub fn print_feedback_list(items: &[Feedback]) {
    if items.is_empty() {
        println!("{}", "No feedback found".yellow());
        return;
    }
    for feedback in items {
        println!("{}", feedback_line(feedback));
        println!("  {}", feedback.id.to_string().dimmed());
    }
    println!();
    println!("{} record(s)", items.len().to_string().bold());
}

pub fn print_feedback(feedback: &Feedback) {
    println!("{}", feedback.product.as_str().bold());
    println!("  Id:        {}", feedback.id);
    println!("  From:      {} <{}>", feedback.name, feedback.email);
    println!("  Rating:    {} ({})", stars(feedback.rating), feedback.rating);
    println!("  Submitted: {}", feedback.created_at.to_rfc3339());
    if !feedback.message.is_empty() {
        println!("  Message:   {}", feedback.message);
    }
}

/// Pretty-printed JSON for `--json`
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}
