//! Feedback submission, lookup and filtering

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::ids::FeedbackId;
use crate::model::{Feedback, Product, Rating};
use crate::store::{FeedbackFilter, FeedbackStore};
use crate::validation::{validate_feedback, FeedbackInput};

/// Message returned when the same email already reviewed a product
pub const DUPLICATE_MESSAGE: &str = "You have already submitted feedback for this product";

const NOT_FOUND_MESSAGE: &str = "Feedback not found";

/// Treat `""` the same as an absent parameter
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Query-string filter as sent by clients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub keyword: Option<String>,
}

impl FeedbackQuery {
    /// Parse into a store filter, rejecting malformed values with 400
    pub fn to_filter(&self) -> Result<FeedbackFilter> {
        let product = self
            .product
            .as_deref()
            .map(|p| {
                p.parse::<Product>()
                    .map_err(|_| Error::BadRequest(format!("Unknown product: {}", p.trim())))
            })
            .transpose()?;

        let rating = self
            .rating
            .as_deref()
            .map(|r| {
                r.trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|v| Rating::new(v).ok())
                    .ok_or_else(|| {
                        Error::BadRequest("rating must be an integer between 1 and 5".to_string())
                    })
            })
            .transpose()?;

        let created_from = self
            .start_date
            .as_deref()
            .map(|d| parse_date_bound(d, DateBound::Start))
            .transpose()?;
        let created_to = self
            .end_date
            .as_deref()
            .map(|d| parse_date_bound(d, DateBound::End))
            .transpose()?;

        Ok(FeedbackFilter {
            product,
            rating,
            created_from,
            created_to,
            keyword: self.keyword.clone(),
        })
    }
}

/// Which end of a date range a parameter describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

impl DateBound {
    fn param(self) -> &'static str {
        match self {
            DateBound::Start => "startDate",
            DateBound::End => "endDate",
        }
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp
///
/// A bare date is midnight UTC as a start bound and the last millisecond of
/// that day as an end bound.
pub fn parse_date_bound(raw: &str, bound: DateBound) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    let invalid = || {
        Error::BadRequest(format!(
            "Invalid {}: expected YYYY-MM-DD or an RFC 3339 timestamp",
            bound.param()
        ))
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let time = match bound {
        DateBound::Start => date.and_hms_opt(0, 0, 0),
        DateBound::End => date.and_hms_milli_opt(23, 59, 59, 999),
    };
    time.map(|t| t.and_utc()).ok_or_else(invalid)
}

/// Feedback use cases over a [`FeedbackStore`]
#[derive(Clone)]
pub struct FeedbackService {
    store: Arc<dyn FeedbackStore>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self { store }
    }

    /// Validate and store a submission
    ///
    /// A second submission for the same email and product is a conflict,
    /// whether the pre-check or the store's unique constraint catches it.
    pub async fn submit(&self, input: &FeedbackInput) -> Result<Feedback> {
        let new = validate_feedback(input)?;

        if self
            .store
            .find_feedback_by_email_product(&new.email, new.product)
            .await?
            .is_some()
        {
            return Err(Error::Conflict(DUPLICATE_MESSAGE.to_string()));
        }

        match self.store.insert_feedback(new).await {
            Ok(feedback) => {
                tracing::info!(
                    feedback_id = %feedback.id,
                    product = %feedback.product,
                    rating = %feedback.rating,
                    "Feedback submitted"
                );
                Ok(feedback)
            }
            Err(e) if e.is_duplicate() => Err(Error::Conflict(DUPLICATE_MESSAGE.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Every record, newest first
    pub async fn list(&self) -> Result<Vec<Feedback>> {
        Ok(self.store.list_feedback(&FeedbackFilter::all()).await?)
    }

    /// Look up by id; unparseable ids are simply not found
    pub async fn get(&self, id: &str) -> Result<Feedback> {
        let Ok(id) = id.parse::<FeedbackId>() else {
            return Err(Error::NotFound(NOT_FOUND_MESSAGE.to_string()));
        };
        self.store
            .get_feedback(&id)
            .await?
            .ok_or_else(|| Error::NotFound(NOT_FOUND_MESSAGE.to_string()))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let Ok(id) = id.parse::<FeedbackId>() else {
            return Err(Error::NotFound(NOT_FOUND_MESSAGE.to_string()));
        };
        if self.store.delete_feedback(&id).await? {
            tracing::info!(feedback_id = %id, "Feedback deleted");
            Ok(())
        } else {
            Err(Error::NotFound(NOT_FOUND_MESSAGE.to_string()))
        }
    }

    /// Records matching `query`, newest first
    pub async fn filter(&self, query: &FeedbackQuery) -> Result<Vec<Feedback>> {
        let filter = query.to_filter()?;
        Ok(self.store.list_feedback(&filter).await?)
    }
}
