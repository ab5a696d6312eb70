//! Use cases shared by the JSON API and the web pages

pub mod admin;
pub mod feedback;

pub use admin::{AdminService, AuthResponse, LoginInput};
pub use feedback::{parse_date_bound, DateBound, FeedbackQuery, FeedbackService, DUPLICATE_MESSAGE};
