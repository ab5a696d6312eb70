//! Domain records: products, ratings, feedback and admin accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{AdminId, FeedbackId};

/// A product users can leave feedback on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "Microsoft Word")]
    Word,
    #[serde(rename = "Microsoft Excel")]
    Excel,
    #[serde(rename = "Microsoft PowerPoint")]
    PowerPoint,
    #[serde(rename = "Microsoft Teams")]
    Teams,
    #[serde(rename = "Microsoft OneDrive")]
    OneDrive,
    #[serde(rename = "Microsoft Azure")]
    Azure,
}

impl Product {
    /// Every product, in display order
    pub const ALL: [Product; 6] = [
        Product::Word,
        Product::Excel,
        Product::PowerPoint,
        Product::Teams,
        Product::OneDrive,
        Product::Azure,
    ];

    /// Display name, also used as the stored and wire form
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Word => "Microsoft Word",
            Product::Excel => "Microsoft Excel",
            Product::PowerPoint => "Microsoft PowerPoint",
            Product::Teams => "Microsoft Teams",
            Product::OneDrive => "Microsoft OneDrive",
            Product::Azure => "Microsoft Azure",
        }
    }

    /// Name without the vendor prefix, used for chart labels
    pub fn short_name(&self) -> &'static str {
        self.as_str().trim_start_matches("Microsoft ")
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown product name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product: {0}")]
pub struct UnknownProduct(pub String);

impl FromStr for Product {
    type Err = UnknownProduct;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Product::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| UnknownProduct(s.to_string()))
    }
}

/// A star rating between 1 and 5 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

/// Rating outside 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between {min} and {max}, got {0}", min = Rating::MIN, max = Rating::MAX)]
pub struct RatingOutOfRange(pub i64);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, RatingOutOfRange> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RatingOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All ratings, lowest first
    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).map(Rating)
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored feedback record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(rename = "_id")]
    pub id: FeedbackId,
    pub name: String,
    pub email: String,
    pub product: Product,
    pub rating: Rating,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feedback {
    /// Materialize a validated submission with a fresh id
    pub fn from_new(new: NewFeedback, now: DateTime<Utc>) -> Self {
        Self {
            id: FeedbackId::new(),
            name: new.name,
            email: new.email,
            product: new.product,
            rating: new.rating,
            message: new.message,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated input for a new feedback record
///
/// Only `validation::validate_feedback` builds one from untrusted input, so
/// `email` is already trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub product: Product,
    pub rating: Rating,
    pub message: String,
}

/// An admin account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: AdminId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn from_new(new: NewAdmin, now: DateTime<Utc>) -> Self {
        Self {
            id: AdminId::new(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            created_at: now,
        }
    }

    /// Public projection without the password hash
    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Input for a new admin account, with the password already hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Admin fields safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    #[serde(rename = "_id")]
    pub id: AdminId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
