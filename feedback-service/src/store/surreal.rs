//! SurrealDB store backend
//!
//! Records are keyed by their TypeID (`feedback:⟨fb_…⟩`, `admin:⟨adm_…⟩`) and
//! also carry it in a plain `fid`/`aid` field, so reads can `OMIT id` and
//! deserialize without touching record-id types. Timestamps are stored as
//! Unix milliseconds.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AdminStore, FeedbackFilter, FeedbackStore};
use crate::config::SurrealDbConfig;
use crate::error::{sanitize_url, StoreError, StoreOperation};
use crate::ids::{AdminId, FeedbackId};
use crate::model::{Admin, Feedback, NewAdmin, NewFeedback, Product, Rating};

pub type SurrealClient = surrealdb::Surreal<surrealdb::engine::any::Any>;

const SCHEMA: &str = r#"
DEFINE TABLE IF NOT EXISTS feedback SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS fid ON feedback TYPE string;
DEFINE FIELD IF NOT EXISTS name ON feedback TYPE string ASSERT string::len($value) >= 2;
DEFINE FIELD IF NOT EXISTS email ON feedback TYPE string ASSERT string::len($value) > 0;
DEFINE FIELD IF NOT EXISTS product ON feedback TYPE string ASSERT $value INSIDE [
    "Microsoft Word", "Microsoft Excel", "Microsoft PowerPoint",
    "Microsoft Teams", "Microsoft OneDrive", "Microsoft Azure"
];
DEFINE FIELD IF NOT EXISTS rating ON feedback TYPE int ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD IF NOT EXISTS message ON feedback TYPE string ASSERT string::len($value) >= 5;
DEFINE FIELD IF NOT EXISTS created_at ON feedback TYPE int;
DEFINE FIELD IF NOT EXISTS updated_at ON feedback TYPE int;
DEFINE INDEX IF NOT EXISTS feedback_email_product ON feedback FIELDS email, product UNIQUE;
DEFINE INDEX IF NOT EXISTS feedback_created_at ON feedback FIELDS created_at;

DEFINE TABLE IF NOT EXISTS admin SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS aid ON admin TYPE string;
DEFINE FIELD IF NOT EXISTS name ON admin TYPE string;
DEFINE FIELD IF NOT EXISTS email ON admin TYPE string;
DEFINE FIELD IF NOT EXISTS password_hash ON admin TYPE string;
DEFINE FIELD IF NOT EXISTS created_at ON admin TYPE int;
DEFINE INDEX IF NOT EXISTS admin_email ON admin FIELDS email UNIQUE;
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeedbackRow {
    fid: String,
    name: String,
    email: String,
    product: String,
    rating: i64,
    message: String,
    created_at: i64,
    updated_at: i64,
}

impl From<&Feedback> for FeedbackRow {
    fn from(f: &Feedback) -> Self {
        Self {
            fid: f.id.to_string(),
            name: f.name.clone(),
            email: f.email.clone(),
            product: f.product.as_str().to_string(),
            rating: i64::from(f.rating.value()),
            message: f.message.clone(),
            created_at: f.created_at.timestamp_millis(),
            updated_at: f.updated_at.timestamp_millis(),
        }
    }
}

impl TryFrom<FeedbackRow> for Feedback {
    type Error = StoreError;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        let bad = |what: String| {
            StoreError::type_conversion(StoreOperation::Query, what).add_context("feedback")
        };
        Ok(Feedback {
            id: row.fid.parse().map_err(|e| bad(format!("fid: {e}")))?,
            name: row.name,
            email: row.email,
            product: row.product.parse::<Product>().map_err(|e| bad(e.to_string()))?,
            rating: Rating::new(row.rating).map_err(|e| bad(e.to_string()))?,
            message: row.message,
            created_at: millis_to_datetime(row.created_at).ok_or_else(|| bad("created_at".into()))?,
            updated_at: millis_to_datetime(row.updated_at).ok_or_else(|| bad("updated_at".into()))?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdminRow {
    aid: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: i64,
}

impl From<&Admin> for AdminRow {
    fn from(a: &Admin) -> Self {
        Self {
            aid: a.id.to_string(),
            name: a.name.clone(),
            email: a.email.clone(),
            password_hash: a.password_hash.clone(),
            created_at: a.created_at.timestamp_millis(),
        }
    }
}

impl TryFrom<AdminRow> for Admin {
    type Error = StoreError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let bad = |what: String| {
            StoreError::type_conversion(StoreOperation::Query, what).add_context("admin")
        };
        Ok(Admin {
            id: row.aid.parse().map_err(|e| bad(format!("aid: {e}")))?,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: millis_to_datetime(row.created_at).ok_or_else(|| bad("created_at".into()))?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

fn query_error(operation: StoreOperation, err: surrealdb::Error) -> StoreError {
    let message = err.to_string();
    if message.contains("already contains") {
        StoreError::duplicate(operation, message)
    } else {
        StoreError::query_failed(operation, message)
    }
}

fn categorize_connect_error(err: &surrealdb::Error) -> &'static str {
    let err_str = err.to_string().to_lowercase();

    if err_str.contains("auth") || err_str.contains("credentials") || err_str.contains("signin") {
        "authentication error, check credentials"
    } else if err_str.contains("connect")
        || err_str.contains("network")
        || err_str.contains("dns")
        || err_str.contains("refused")
    {
        "network error, check connectivity"
    } else if err_str.contains("timeout") {
        "connection timeout"
    } else {
        "connection error"
    }
}

/// Store backed by a SurrealDB connection
#[derive(Clone)]
pub struct SurrealStore {
    db: SurrealClient,
}

impl SurrealStore {
    /// Connect with retries, select namespace and database, and apply the schema
    pub async fn connect(config: &SurrealDbConfig) -> Result<Self, StoreError> {
        let db = connect_with_retries(config).await?;
        let store = Self { db };
        store.apply_schema().await?;
        Ok(store)
    }

    async fn apply_schema(&self) -> Result<(), StoreError> {
        self.db
            .query(SCHEMA)
            .await
            .and_then(|response| response.check())
            .map_err(|e| {
                StoreError::query_failed(StoreOperation::Schema, e.to_string())
            })?;
        tracing::debug!("SurrealDB schema applied");
        Ok(())
    }
}

async fn connect_with_retries(config: &SurrealDbConfig) -> Result<SurrealClient, StoreError> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_connect(config).await {
            Ok(client) => {
                if attempt > 0 {
                    tracing::info!(
                        "SurrealDB connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "SurrealDB connected: url={}, ns={}, db={}",
                        sanitize_url(&config.url),
                        config.namespace,
                        config.database
                    );
                }
                return Ok(client);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to SurrealDB after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));
                tracing::warn!(
                    "SurrealDB connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn try_connect(config: &SurrealDbConfig) -> Result<SurrealClient, StoreError> {
    let url_safe = sanitize_url(&config.url);
    tracing::debug!("Connecting to SurrealDB: {}", url_safe);

    let client = surrealdb::engine::any::connect(&config.url)
        .await
        .map_err(|e| {
            StoreError::connection_failed(format!("{}: {}", categorize_connect_error(&e), e))
                .add_context(url_safe.clone())
        })?;

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client
            .signin(surrealdb::opt::auth::Root { username, password })
            .await
            .map_err(|e| {
                StoreError::connection_failed(format!("{}: {}", categorize_connect_error(&e), e))
                    .add_context(url_safe.clone())
            })?;
    }

    client
        .use_ns(&config.namespace)
        .use_db(&config.database)
        .await
        .map_err(|e| {
            StoreError::connection_failed(format!(
                "cannot select namespace '{}' / database '{}': {}",
                config.namespace, config.database, e
            ))
            .add_context(url_safe.clone())
        })?;

    Ok(client)
}

#[async_trait]
impl FeedbackStore for SurrealStore {
    async fn insert_feedback(&self, new: NewFeedback) -> Result<Feedback, StoreError> {
        let feedback = Feedback::from_new(new, Utc::now());
        let row = FeedbackRow::from(&feedback);

        let mut response = self
            .db
            .query("CREATE type::thing('feedback', $fid) CONTENT $row RETURN NONE")
            .bind(("fid", row.fid.clone()))
            .bind(("row", row))
            .await
            .map_err(|e| query_error(StoreOperation::Insert, e))?;
        response
            .take::<Vec<FeedbackRow>>(0)
            .map_err(|e| query_error(StoreOperation::Insert, e).add_context("feedback"))?;

        Ok(feedback)
    }

    async fn find_feedback_by_email_product(
        &self,
        email: &str,
        product: Product,
    ) -> Result<Option<Feedback>, StoreError> {
        let mut response = self
            .db
            .query("SELECT * OMIT id FROM feedback WHERE email = $email AND product = $product LIMIT 1")
            .bind(("email", email.to_string()))
            .bind(("product", product.as_str()))
            .await
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        let rows: Vec<FeedbackRow> = response
            .take(0)
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        rows.into_iter().next().map(Feedback::try_from).transpose()
    }

    async fn get_feedback(&self, id: &FeedbackId) -> Result<Option<Feedback>, StoreError> {
        let mut response = self
            .db
            .query("SELECT * OMIT id FROM type::thing('feedback', $fid)")
            .bind(("fid", id.to_string()))
            .await
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        let rows: Vec<FeedbackRow> = response
            .take(0)
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        rows.into_iter().next().map(Feedback::try_from).transpose()
    }

    async fn delete_feedback(&self, id: &FeedbackId) -> Result<bool, StoreError> {
        let mut response = self
            .db
            .query("DELETE type::thing('feedback', $fid) RETURN VALUE $before.fid")
            .bind(("fid", id.to_string()))
            .await
            .map_err(|e| query_error(StoreOperation::Delete, e))?;
        let removed: Vec<Option<String>> = response
            .take(0)
            .map_err(|e| query_error(StoreOperation::Delete, e))?;
        Ok(removed.into_iter().flatten().next().is_some())
    }

    async fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<Feedback>, StoreError> {
        let mut conditions = Vec::new();
        if filter.product.is_some() {
            conditions.push("product = $product");
        }
        if filter.rating.is_some() {
            conditions.push("rating = $rating");
        }
        if filter.created_from.is_some() {
            conditions.push("created_at >= $from");
        }
        if filter.created_to.is_some() {
            conditions.push("created_at <= $to");
        }
        let keyword = filter.keyword_lowercase();
        if keyword.is_some() {
            conditions.push(
                "(string::lowercase(name) CONTAINS $keyword \
                 OR string::lowercase(email) CONTAINS $keyword \
                 OR string::lowercase(message) CONTAINS $keyword)",
            );
        }

        let mut sql = String::from("SELECT * OMIT id FROM feedback");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, fid DESC");

        let mut query = self.db.query(sql);
        if let Some(product) = filter.product {
            query = query.bind(("product", product.as_str()));
        }
        if let Some(rating) = filter.rating {
            query = query.bind(("rating", i64::from(rating.value())));
        }
        if let Some(from) = filter.created_from {
            query = query.bind(("from", from.timestamp_millis()));
        }
        if let Some(to) = filter.created_to {
            query = query.bind(("to", to.timestamp_millis()));
        }
        if let Some(keyword) = keyword {
            query = query.bind(("keyword", keyword));
        }

        let mut response = query
            .await
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        let rows: Vec<FeedbackRow> = response
            .take(0)
            .map_err(|e| query_error(StoreOperation::Query, e).add_context("feedback"))?;
        rows.into_iter().map(Feedback::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db
            .health()
            .await
            .map_err(|e| StoreError::connection_failed(e.to_string()))
    }
}

#[async_trait]
impl AdminStore for SurrealStore {
    async fn count_admins(&self) -> Result<u64, StoreError> {
        let mut response = self
            .db
            .query("SELECT count() FROM admin GROUP ALL")
            .await
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        let rows: Vec<CountRow> = response
            .take(0)
            .map_err(|e| query_error(StoreOperation::Query, e).add_context("admin"))?;
        Ok(rows.first().map_or(0, |r| r.count))
    }

    async fn insert_admin(&self, new: NewAdmin) -> Result<Admin, StoreError> {
        let admin = Admin::from_new(new, Utc::now());
        let row = AdminRow::from(&admin);

        let mut response = self
            .db
            .query("CREATE type::thing('admin', $aid) CONTENT $row RETURN NONE")
            .bind(("aid", row.aid.clone()))
            .bind(("row", row))
            .await
            .map_err(|e| query_error(StoreOperation::Insert, e))?;
        response
            .take::<Vec<AdminRow>>(0)
            .map_err(|e| query_error(StoreOperation::Insert, e).add_context("admin"))?;

        Ok(admin)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let mut response = self
            .db
            .query("SELECT * OMIT id FROM admin WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        let rows: Vec<AdminRow> = response
            .take(0)
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        rows.into_iter().next().map(Admin::try_from).transpose()
    }

    async fn get_admin(&self, id: &AdminId) -> Result<Option<Admin>, StoreError> {
        let mut response = self
            .db
            .query("SELECT * OMIT id FROM type::thing('admin', $aid)")
            .bind(("aid", id.to_string()))
            .await
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        let rows: Vec<AdminRow> = response
            .take(0)
            .map_err(|e| query_error(StoreOperation::Query, e))?;
        rows.into_iter().next().map(Admin::try_from).transpose()
    }
}
