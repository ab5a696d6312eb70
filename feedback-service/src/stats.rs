//! Feedback aggregates for the admin API and the web dashboard
//!
//! Every figure is a reduction over a list of [`Feedback`] records, so the
//! same code serves any store backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Feedback, Product, Rating};
use crate::store::{FeedbackFilter, FeedbackStore};

const NO_PRODUCT_FEEDBACK: &str = "No feedback found for this product";

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn mean(ratings: impl Iterator<Item = Rating>) -> Option<f64> {
    let (sum, count) = ratings.fold((0u64, 0u64), |(sum, count), r| {
        (sum + u64::from(r.value()), count + 1)
    });
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Feedback count and mean rating for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCount {
    pub product: Product,
    pub count: u64,
    pub avg_rating: f64,
}

/// Number of feedback records with a given rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCount {
    pub rating: Rating,
    pub count: u64,
}

/// Whole-collection statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_feedbacks: u64,
    /// Mean rating to 2 decimals, 0 when there is no feedback
    pub average_rating: f64,
    /// Records created inside the recent window
    pub recent_feedbacks: u64,
    /// Products with feedback, most reviewed first
    pub feedbacks_by_product: Vec<ProductCount>,
    /// Ratings that occur, lowest first
    pub feedbacks_by_rating: Vec<RatingCount>,
}

impl DashboardStats {
    /// A window reaching past the representable range counts every record
    pub fn compute(feedback: &[Feedback], now: DateTime<Utc>, recent_window: Duration) -> Self {
        let since = now.checked_sub_signed(recent_window);

        let mut by_product: BTreeMap<Product, Vec<Rating>> = BTreeMap::new();
        let mut by_rating: BTreeMap<Rating, u64> = BTreeMap::new();
        for f in feedback {
            by_product.entry(f.product).or_default().push(f.rating);
            *by_rating.entry(f.rating).or_default() += 1;
        }

        let mut feedbacks_by_product: Vec<ProductCount> = by_product
            .into_iter()
            .map(|(product, ratings)| ProductCount {
                product,
                count: ratings.len() as u64,
                avg_rating: round_to(mean(ratings.into_iter()).unwrap_or(0.0), 2),
            })
            .collect();
        feedbacks_by_product.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.product.as_str().cmp(b.product.as_str()))
        });

        Self {
            total_feedbacks: feedback.len() as u64,
            average_rating: round_to(mean(feedback.iter().map(|f| f.rating)).unwrap_or(0.0), 2),
            recent_feedbacks: feedback
                .iter()
                .filter(|f| since.is_none_or(|since| f.created_at >= since))
                .count() as u64,
            feedbacks_by_product,
            feedbacks_by_rating: by_rating
                .into_iter()
                .map(|(rating, count)| RatingCount { rating, count })
                .collect(),
        }
    }
}

/// Statistics for a single product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub total_feedbacks: u64,
    pub average_rating: f64,
    /// Every rating, oldest submission first
    pub rating_distribution: Vec<Rating>,
}

impl ProductStats {
    /// `None` when `feedback` is empty
    ///
    /// Expects the store's newest-first order.
    pub fn compute(feedback: &[Feedback]) -> Option<Self> {
        if feedback.is_empty() {
            return None;
        }
        Some(Self {
            total_feedbacks: feedback.len() as u64,
            average_rating: round_to(mean(feedback.iter().map(|f| f.rating)).unwrap_or(0.0), 2),
            rating_distribution: feedback.iter().rev().map(|f| f.rating).collect(),
        })
    }
}

/// One line of the dashboard product table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product: Product,
    pub count: usize,
    /// Mean rating formatted to 1 decimal, `"0"` without feedback
    pub average: String,
    pub feedback: Vec<Feedback>,
}

/// One bar of the dashboard chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBar {
    pub label: String,
    pub count: usize,
}

/// What the web dashboard shows for the currently filtered feedback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    /// Mean rating formatted to 1 decimal, `"0"` without feedback
    pub average: String,
    /// One row per product in [`Product::ALL`] order, including empty ones
    pub products: Vec<ProductSummary>,
    pub chart: Vec<ChartBar>,
}

fn format_average(ratings: impl Iterator<Item = Rating>) -> String {
    match mean(ratings) {
        Some(avg) => format!("{:.1}", avg),
        None => "0".to_string(),
    }
}

impl DashboardSummary {
    pub fn from_feedback(feedback: &[Feedback]) -> Self {
        let products: Vec<ProductSummary> = Product::ALL
            .into_iter()
            .map(|product| {
                let items: Vec<Feedback> = feedback
                    .iter()
                    .filter(|f| f.product == product)
                    .cloned()
                    .collect();
                ProductSummary {
                    product,
                    count: items.len(),
                    average: format_average(items.iter().map(|f| f.rating)),
                    feedback: items,
                }
            })
            .collect();

        let chart = products
            .iter()
            .map(|p| ChartBar {
                label: p.product.short_name().to_string(),
                count: p.count,
            })
            .collect();

        Self {
            total: feedback.len(),
            average: format_average(feedback.iter().map(|f| f.rating)),
            products,
            chart,
        }
    }
}

/// Stats use cases over a [`FeedbackStore`]
#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn FeedbackStore>,
    recent_window: Duration,
}

impl StatsService {
    pub fn new(store: Arc<dyn FeedbackStore>, recent_window_days: i64) -> Self {
        Self {
            store,
            recent_window: Duration::try_days(recent_window_days).unwrap_or(Duration::MAX),
        }
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let feedback = self.store.list_feedback(&FeedbackFilter::all()).await?;
        Ok(DashboardStats::compute(&feedback, now, self.recent_window))
    }

    /// Stats for the product named `name`
    ///
    /// Unknown names and products without feedback are both 404.
    pub async fn product(&self, name: &str) -> Result<(Product, ProductStats)> {
        let not_found = || Error::NotFound(NO_PRODUCT_FEEDBACK.to_string());

        let product = name.parse::<Product>().map_err(|_| not_found())?;
        let filter = FeedbackFilter {
            product: Some(product),
            ..Default::default()
        };
        let feedback = self.store.list_feedback(&filter).await?;
        let stats = ProductStats::compute(&feedback).ok_or_else(not_found)?;
        Ok((product, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewFeedback;
    use crate::store::MemoryStore;

    fn at(product: Product, rating: i64, created_at: DateTime<Utc>) -> Feedback {
        let mut f = Feedback::from_new(
            NewFeedback {
                name: "Tester".into(),
                email: format!("{}@example.com", uuid::Uuid::new_v4()),
                product,
                rating: Rating::new(rating).unwrap(),
                message: "Some message".into(),
            },
            created_at,
        );
        f.updated_at = created_at;
        f
    }

    #[test]
    fn test_dashboard_on_empty_data() {
        let stats = DashboardStats::compute(&[], Utc::now(), Duration::days(7));
        assert_eq!(stats.total_feedbacks, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.recent_feedbacks, 0);
        assert!(stats.feedbacks_by_product.is_empty());
        assert!(stats.feedbacks_by_rating.is_empty());
    }

    #[test]
    fn test_dashboard_aggregates() {
        let now = Utc::now();
        let feedback = vec![
            at(Product::Excel, 5, now),
            at(Product::Excel, 4, now - Duration::days(1)),
            at(Product::Word, 1, now - Duration::days(3)),
            at(Product::Azure, 4, now - Duration::days(30)),
            at(Product::Excel, 4, now - Duration::days(40)),
            at(Product::Word, 5, now - Duration::days(60)),
        ];

        let stats = DashboardStats::compute(&feedback, now, Duration::days(7));
        assert_eq!(stats.total_feedbacks, 6);
        // 23 / 6 = 3.8333…
        assert_eq!(stats.average_rating, 3.83);
        assert_eq!(stats.recent_feedbacks, 3);

        let products: Vec<(Product, u64)> = stats
            .feedbacks_by_product
            .iter()
            .map(|p| (p.product, p.count))
            .collect();
        assert_eq!(
            products,
            vec![(Product::Excel, 3), (Product::Word, 2), (Product::Azure, 1)]
        );
        assert_eq!(stats.feedbacks_by_product[0].avg_rating, 4.33);

        let ratings: Vec<(u8, u64)> = stats
            .feedbacks_by_rating
            .iter()
            .map(|r| (r.rating.value(), r.count))
            .collect();
        assert_eq!(ratings, vec![(1, 1), (4, 3), (5, 2)]);
    }

    #[test]
    fn test_dashboard_json_keys() {
        let now = Utc::now();
        let stats = DashboardStats::compute(&[at(Product::Teams, 3, now)], now, Duration::days(7));
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["totalFeedbacks"], 1);
        assert!(value["averageRating"].is_number());
        assert_eq!(value["feedbacksByProduct"][0]["product"], "Microsoft Teams");
        assert_eq!(value["feedbacksByProduct"][0]["avgRating"], 3.0);
        assert_eq!(value["feedbacksByRating"][0]["rating"], 3);
    }

    #[test]
    fn test_product_stats_order_and_empty() {
        assert!(ProductStats::compute(&[]).is_none());

        let now = Utc::now();
        // Newest first, as the store returns them
        let feedback = vec![
            at(Product::Word, 2, now),
            at(Product::Word, 5, now - Duration::days(1)),
            at(Product::Word, 4, now - Duration::days(2)),
        ];
        let stats = ProductStats::compute(&feedback).unwrap();
        assert_eq!(stats.total_feedbacks, 3);
        assert_eq!(stats.average_rating, 3.67);
        let distribution: Vec<u8> = stats.rating_distribution.iter().map(|r| r.value()).collect();
        assert_eq!(distribution, vec![4, 5, 2]);
    }

    #[test]
    fn test_summary_lists_every_product() {
        let now = Utc::now();
        let feedback = vec![
            at(Product::Teams, 4, now),
            at(Product::Teams, 5, now),
            at(Product::Azure, 1, now),
        ];
        let summary = DashboardSummary::from_feedback(&feedback);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.average, "3.3");
        assert_eq!(summary.products.len(), 6);
        assert_eq!(summary.chart.len(), 6);

        let teams = &summary.products[3];
        assert_eq!(teams.product, Product::Teams);
        assert_eq!(teams.count, 2);
        assert_eq!(teams.average, "4.5");
        assert_eq!(teams.feedback.len(), 2);

        let word = &summary.products[0];
        assert_eq!(word.count, 0);
        assert_eq!(word.average, "0");
        assert_eq!(summary.chart[0].label, "Word");
        assert_eq!(summary.chart[0].count, 0);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = DashboardSummary::from_feedback(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average, "0");
    }

    #[test]
    fn test_unbounded_window_counts_everything() {
        let now = Utc::now();
        let feedback = vec![
            at(Product::Word, 4, now),
            at(Product::Excel, 2, now - Duration::days(3650)),
        ];
        let stats = DashboardStats::compute(&feedback, now, Duration::MAX);
        assert_eq!(stats.recent_feedbacks, 2);
    }

    #[tokio::test]
    async fn test_huge_recent_window_does_not_panic() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_feedback(NewFeedback {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                product: Product::Teams,
                rating: Rating::new(4).unwrap(),
                message: "Works well".into(),
            })
            .await
            .unwrap();

        for days in [200_000_000, i64::MAX] {
            let service = StatsService::new(store.clone(), days);
            let stats = service.dashboard(Utc::now()).await.unwrap();
            assert_eq!(stats.total_feedbacks, 1);
            assert_eq!(stats.recent_feedbacks, 1);
        }
    }

    #[tokio::test]
    async fn test_product_lookup_errors() {
        let service = StatsService::new(Arc::new(MemoryStore::new()), 7);
        for name in ["Microsoft Word", "Microsoft Paint"] {
            match service.product(name).await {
                Err(Error::NotFound(msg)) => assert_eq!(msg, NO_PRODUCT_FEEDBACK),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }
}
