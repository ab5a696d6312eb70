//! In-memory store backend

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AdminStore, FeedbackFilter, FeedbackStore};
use crate::error::{StoreError, StoreOperation};
use crate::ids::{AdminId, FeedbackId};
use crate::model::{Admin, Feedback, NewAdmin, NewFeedback, Product};

#[derive(Default)]
struct Tables {
    feedback: HashMap<FeedbackId, Feedback>,
    admins: HashMap<AdminId, Admin>,
}

/// Process-local store
///
/// Both tables sit behind one lock, so a uniqueness check and the insert it
/// guards happen under the same write guard.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn insert_feedback(&self, new: NewFeedback) -> Result<Feedback, StoreError> {
        let mut tables = self.tables.write().await;

        let taken = tables
            .feedback
            .values()
            .any(|f| f.email == new.email && f.product == new.product);
        if taken {
            return Err(StoreError::duplicate(
                StoreOperation::Insert,
                format!("feedback for {} already exists", new.product),
            )
            .add_context("feedback(email, product)"));
        }

        let feedback = Feedback::from_new(new, Utc::now());
        tables.feedback.insert(feedback.id.clone(), feedback.clone());
        Ok(feedback)
    }

    async fn find_feedback_by_email_product(
        &self,
        email: &str,
        product: Product,
    ) -> Result<Option<Feedback>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .feedback
            .values()
            .find(|f| f.email == email && f.product == product)
            .cloned())
    }

    async fn get_feedback(&self, id: &FeedbackId) -> Result<Option<Feedback>, StoreError> {
        Ok(self.tables.read().await.feedback.get(id).cloned())
    }

    async fn delete_feedback(&self, id: &FeedbackId) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.feedback.remove(id).is_some())
    }

    async fn list_feedback(&self, filter: &FeedbackFilter) -> Result<Vec<Feedback>, StoreError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Feedback> = tables
            .feedback
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        // Ids are UUIDv7, so they break timestamp ties in insertion order
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(matching)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn count_admins(&self) -> Result<u64, StoreError> {
        Ok(self.tables.read().await.admins.len() as u64)
    }

    async fn insert_admin(&self, new: NewAdmin) -> Result<Admin, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.admins.values().any(|a| a.email == new.email) {
            return Err(
                StoreError::duplicate(StoreOperation::Insert, "admin email already exists")
                    .add_context("admin(email)"),
            );
        }

        let admin = Admin::from_new(new, Utc::now());
        tables.admins.insert(admin.id.clone(), admin.clone());
        Ok(admin)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.admins.values().find(|a| a.email == email).cloned())
    }

    async fn get_admin(&self, id: &AdminId) -> Result<Option<Admin>, StoreError> {
        Ok(self.tables.read().await.admins.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rating;
    use std::sync::Arc;

    fn new_feedback(email: &str, product: Product, rating: i64) -> NewFeedback {
        NewFeedback {
            name: "Tester".into(),
            email: email.into(),
            product,
            rating: Rating::new(rating).unwrap(),
            message: "Works for me".into(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let saved = store
            .insert_feedback(new_feedback("a@example.com", Product::Word, 4))
            .await
            .unwrap();

        let fetched = store.get_feedback(&saved.id).await.unwrap().unwrap();
        assert_eq!(fetched, saved);
        assert!(store.get_feedback(&FeedbackId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_product_is_rejected() {
        let store = MemoryStore::new();
        store
            .insert_feedback(new_feedback("a@example.com", Product::Word, 4))
            .await
            .unwrap();

        let err = store
            .insert_feedback(new_feedback("a@example.com", Product::Word, 1))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        // Same email, other product is fine
        store
            .insert_feedback(new_feedback("a@example.com", Product::Excel, 2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_admit_one() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert_feedback(new_feedback("race@example.com", Product::Teams, 5))
                    .await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryStore::new();
        let first = store
            .insert_feedback(new_feedback("1@example.com", Product::Word, 1))
            .await
            .unwrap();
        let second = store
            .insert_feedback(new_feedback("2@example.com", Product::Word, 2))
            .await
            .unwrap();

        let all = store.list_feedback(&FeedbackFilter::all()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let saved = store
            .insert_feedback(new_feedback("a@example.com", Product::Azure, 3))
            .await
            .unwrap();

        assert!(store.delete_feedback(&saved.id).await.unwrap());
        assert!(!store.delete_feedback(&saved.id).await.unwrap());
        assert!(store
            .find_feedback_by_email_product("a@example.com", Product::Azure)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_admin_email_is_unique() {
        let store = MemoryStore::new();
        let admin = store
            .insert_admin(NewAdmin {
                name: "Root".into(),
                email: "root@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        assert_eq!(store.count_admins().await.unwrap(), 1);

        let err = store
            .insert_admin(NewAdmin {
                name: "Other".into(),
                email: "root@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        let found = store.find_admin_by_email("root@example.com").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(admin.id.clone()));
        assert!(store.get_admin(&admin.id).await.unwrap().is_some());
    }
}
