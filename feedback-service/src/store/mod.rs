//! Storage for feedback and admin records
//!
//! Services talk to the store through two object-safe traits so the backend can
//! be chosen from configuration at startup:
//!
//! - [`memory::MemoryStore`]: process-local maps, the default
//! - `surreal::SurrealStore`: SurrealDB, behind the `surrealdb` cargo feature
//!
//! Both backends enforce the same uniqueness rules: one feedback per
//! `(email, product)` pair and one admin per email. A violation surfaces as a
//! [`StoreError`] whose kind is `Duplicate`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{Error, Result, StoreError};
use crate::ids::{AdminId, FeedbackId};
use crate::model::{Admin, Feedback, NewAdmin, NewFeedback, Product, Rating};

pub mod memory;

#[cfg(feature = "surrealdb")]
pub mod surreal;

pub use memory::MemoryStore;

#[cfg(feature = "surrealdb")]
pub use surreal::SurrealStore;

/// Criteria for listing feedback; every field is optional and they combine with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub product: Option<Product>,
    pub rating: Option<Rating>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub created_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of name, email or message
    pub keyword: Option<String>,
}

impl FeedbackFilter {
    /// Filter that matches everything
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, feedback: &Feedback) -> bool {
        if self.product.is_some_and(|p| p != feedback.product) {
            return false;
        }
        if self.rating.is_some_and(|r| r != feedback.rating) {
            return false;
        }
        if self.created_from.is_some_and(|from| feedback.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| feedback.created_at > to) {
            return false;
        }
        if let Some(keyword) = self.keyword_lowercase() {
            let hit = [&feedback.name, &feedback.email, &feedback.message]
                .iter()
                .any(|field| field.to_lowercase().contains(&keyword));
            if !hit {
                return false;
            }
        }
        true
    }

    /// Trimmed, lowercased keyword, `None` when absent or blank
    pub fn keyword_lowercase(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase)
    }
}

/// Feedback persistence
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Insert a new record, rejecting a second one for the same email and product
    async fn insert_feedback(&self, new: NewFeedback) -> std::result::Result<Feedback, StoreError>;

    async fn find_feedback_by_email_product(
        &self,
        email: &str,
        product: Product,
    ) -> std::result::Result<Option<Feedback>, StoreError>;

    async fn get_feedback(&self, id: &FeedbackId) -> std::result::Result<Option<Feedback>, StoreError>;

    /// Returns whether a record was removed
    async fn delete_feedback(&self, id: &FeedbackId) -> std::result::Result<bool, StoreError>;

    /// Matching records, newest first
    async fn list_feedback(
        &self,
        filter: &FeedbackFilter,
    ) -> std::result::Result<Vec<Feedback>, StoreError>;

    /// Cheap round trip used by the readiness probe
    async fn ping(&self) -> std::result::Result<(), StoreError>;
}

/// Admin account persistence
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn count_admins(&self) -> std::result::Result<u64, StoreError>;

    /// Insert a new account, rejecting a duplicate email
    async fn insert_admin(&self, new: NewAdmin) -> std::result::Result<Admin, StoreError>;

    async fn find_admin_by_email(&self, email: &str) -> std::result::Result<Option<Admin>, StoreError>;

    async fn get_admin(&self, id: &AdminId) -> std::result::Result<Option<Admin>, StoreError>;
}

/// Handles to both stores, usually backed by the same connection
#[derive(Clone)]
pub struct Stores {
    pub feedback: Arc<dyn FeedbackStore>,
    pub admins: Arc<dyn AdminStore>,
}

impl Stores {
    /// Both stores served by one backend value
    pub fn shared<S>(store: S) -> Self
    where
        S: FeedbackStore + AdminStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            feedback: store.clone(),
            admins: store,
        }
    }

    /// Fresh in-memory stores
    pub fn in_memory() -> Self {
        Self::shared(MemoryStore::new())
    }

    /// Open the backend selected in configuration
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        match config.backend {
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store; data is lost on restart");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "surrealdb")]
            StoreBackend::Surrealdb => {
                let surreal_config = config.surrealdb.as_ref().ok_or_else(|| {
                    Error::Internal(
                        "store.backend is \"surrealdb\" but [store.surrealdb] is missing"
                            .to_string(),
                    )
                })?;
                let store = SurrealStore::connect(surreal_config).await?;
                Ok(Self::shared(store))
            }
            #[cfg(not(feature = "surrealdb"))]
            StoreBackend::Surrealdb => Err(Error::Internal(
                "store.backend is \"surrealdb\" but the service was built without the `surrealdb` feature"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(name: &str, email: &str, product: Product, rating: i64, message: &str) -> Feedback {
        Feedback::from_new(
            NewFeedback {
                name: name.into(),
                email: email.into(),
                product,
                rating: Rating::new(rating).unwrap(),
                message: message.into(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let fb = sample("Ada", "ada@example.com", Product::Word, 3, "Track changes");
        assert!(FeedbackFilter::all().matches(&fb));
    }

    #[test]
    fn test_keyword_is_case_insensitive_over_three_fields() {
        let fb = sample("Ada Lovelace", "ada@example.com", Product::Word, 3, "Track changes");

        let by = |kw: &str| FeedbackFilter {
            keyword: Some(kw.into()),
            ..Default::default()
        };
        assert!(by("LOVELACE").matches(&fb));
        assert!(by("EXAMPLE.com").matches(&fb));
        assert!(by("track").matches(&fb));
        assert!(!by("excel").matches(&fb));
        assert!(by("   ").matches(&fb));
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let fb = sample("Ada", "ada@example.com", Product::Word, 3, "Track changes");
        let at = fb.created_at;

        let filter = FeedbackFilter {
            created_from: Some(at),
            created_to: Some(at),
            ..Default::default()
        };
        assert!(filter.matches(&fb));

        let later = FeedbackFilter {
            created_from: Some(at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!later.matches(&fb));
    }

    #[test]
    fn test_product_and_rating_combine() {
        let fb = sample("Ada", "ada@example.com", Product::Teams, 5, "Great calls");
        let filter = FeedbackFilter {
            product: Some(Product::Teams),
            rating: Some(Rating::new(4).unwrap()),
            ..Default::default()
        };
        assert!(!filter.matches(&fb));

        let filter = FeedbackFilter {
            product: Some(Product::Teams),
            rating: Some(Rating::new(5).unwrap()),
            ..Default::default()
        };
        assert!(filter.matches(&fb));
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let stores = Stores::open(&StoreConfig::default()).await.unwrap();
        stores.feedback.ping().await.unwrap();
        assert_eq!(stores.admins.count_admins().await.unwrap(), 0);
    }
}
