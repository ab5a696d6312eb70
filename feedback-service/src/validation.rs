//! Input validation for feedback submissions and admin registration
//!
//! Two rule sets live here. The server rules guard every write regardless of
//! client. The web-form rules are stricter and only apply to the browser form,
//! which runs them before handing the input to the server rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::model::{NewFeedback, Product, Rating};

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email regex is valid"));

static FORM_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z .]{2,}$").expect("name regex is valid"));

static FORM_EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("form email regex is valid")
});

/// HTML `pattern` attribute equivalent of the form name rule
pub const FORM_NAME_PATTERN: &str = "[A-Za-z .]{2,}";

/// Message substituted when the web form is submitted without one
pub const DEFAULT_FORM_MESSAGE: &str = "No additional message";

const NAME_MIN_CHARS: usize = 2;
const MESSAGE_MIN_CHARS: usize = 5;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Machine-readable code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// All validation failures for one input, keyed by field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<FieldError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`
    pub fn add(
        &mut self,
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        let field = field.into();
        let error = FieldError {
            field: field.clone(),
            code: code.into(),
            message: message.into(),
        };
        self.fields.entry(field).or_default().push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    /// First message recorded for `field`
    pub fn first(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|errors| errors.first())
            .map(|e| e.message.as_str())
    }

    /// One-line summary for the envelope `message`
    pub fn summary(&self) -> String {
        let messages: Vec<&str> = self
            .fields
            .values()
            .flatten()
            .map(|e| e.message.as_str())
            .collect();
        match messages.as_slice() {
            [] => "Validation failed".to_string(),
            [only] => (*only).to_string(),
            many => format!("Validation failed: {}", many.join(", ")),
        }
    }

    pub fn into_fields(self) -> BTreeMap<String, Vec<FieldError>> {
        self.fields
    }

    /// `Ok(value)` when nothing was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

/// A rating as sent by clients: JSON number or numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RatingInput {
    fn to_rating(&self) -> Option<Rating> {
        let value = match self {
            RatingInput::Integer(v) => *v,
            RatingInput::Float(v) if v.fract() == 0.0 => *v as i64,
            RatingInput::Float(_) => return None,
            RatingInput::Text(s) => s.trim().parse::<i64>().ok()?,
        };
        Rating::new(value).ok()
    }

    fn is_blank(&self) -> bool {
        matches!(self, RatingInput::Text(s) if s.trim().is_empty())
    }
}

/// Unvalidated feedback submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub rating: Option<RatingInput>,
    #[serde(default)]
    pub message: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Apply the server rules, normalizing accepted values
pub fn validate_feedback(input: &FeedbackInput) -> Result<NewFeedback, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = match present(&input.name) {
        None => {
            errors.add("name", "REQUIRED", "Name is required");
            None
        }
        Some(name) if name.chars().count() < NAME_MIN_CHARS => {
            errors.add("name", "TOO_SHORT", "Name must be at least 2 characters");
            None
        }
        Some(name) => Some(name.to_string()),
    };

    let email = match present(&input.email) {
        None => {
            errors.add("email", "REQUIRED", "Email is required");
            None
        }
        Some(email) => {
            let email = email.to_lowercase();
            if EMAIL_REGEX.is_match(&email) {
                Some(email)
            } else {
                errors.add("email", "INVALID_FORMAT", "Please provide a valid email");
                None
            }
        }
    };

    let product = match present(&input.product) {
        None => {
            errors.add("product", "REQUIRED", "Product is required");
            None
        }
        Some(raw) => match raw.parse::<Product>() {
            Ok(product) => Some(product),
            Err(_) => {
                errors.add(
                    "product",
                    "INVALID_VALUE",
                    "Product must be one of the supported products",
                );
                None
            }
        },
    };

    let rating = match input.rating.as_ref().filter(|r| !r.is_blank()) {
        None => {
            errors.add("rating", "REQUIRED", "Rating is required");
            None
        }
        Some(raw) => match raw.to_rating() {
            Some(rating) => Some(rating),
            None => {
                errors.add("rating", "OUT_OF_RANGE", "Rating must be between 1 and 5");
                None
            }
        },
    };

    let message = match present(&input.message) {
        None => {
            errors.add("message", "REQUIRED", "Message is required");
            None
        }
        Some(message) if message.chars().count() < MESSAGE_MIN_CHARS => {
            errors.add(
                "message",
                "TOO_SHORT",
                "Message must be at least 5 characters",
            );
            None
        }
        Some(message) => Some(message.to_string()),
    };

    match (name, email, product, rating, message) {
        (Some(name), Some(email), Some(product), Some(rating), Some(message))
            if errors.is_empty() =>
        {
            Ok(NewFeedback {
                name,
                email,
                product,
                rating,
                message,
            })
        }
        _ => Err(errors),
    }
}

/// Apply the browser form rules
///
/// On success returns the input ready for `validate_feedback`: text trimmed
/// and an empty message replaced by [`DEFAULT_FORM_MESSAGE`].
pub fn validate_web_form(input: &FeedbackInput) -> Result<FeedbackInput, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    match input.name.as_deref() {
        Some(name) if !name.trim().is_empty() => {
            if !FORM_NAME_REGEX.is_match(name) {
                errors.add(
                    "name",
                    "INVALID_FORMAT",
                    "Minimum 2 characters. Only letters, space and dot allowed",
                );
            }
        }
        _ => errors.add("name", "REQUIRED", "Name is required"),
    }

    match present(&input.email) {
        None => errors.add("email", "REQUIRED", "Email is required"),
        Some(email) if !FORM_EMAIL_REGEX.is_match(email) => {
            errors.add("email", "INVALID_FORMAT", "Invalid email format")
        }
        Some(_) => {}
    }

    if present(&input.product).is_none() {
        errors.add("product", "REQUIRED", "Please select a product");
    }

    let rating_missing = match &input.rating {
        None => true,
        Some(RatingInput::Integer(0)) => true,
        Some(r) => r.is_blank(),
    };
    if rating_missing {
        errors.add("rating", "REQUIRED", "Please select a rating");
    }

    let prepared = FeedbackInput {
        name: present(&input.name).map(str::to_string),
        email: present(&input.email).map(str::to_string),
        product: input.product.clone(),
        rating: input.rating.clone(),
        message: Some(
            present(&input.message)
                .unwrap_or(DEFAULT_FORM_MESSAGE)
                .to_string(),
        ),
    };

    errors.into_result(prepared)
}

/// Unvalidated admin registration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Registration fields after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(
    input: &RegisterInput,
    min_password_length: usize,
) -> Result<ValidRegistration, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = present(&input.name).map(str::to_string);
    if name.is_none() {
        errors.add("name", "REQUIRED", "Name is required");
    }

    let email = present(&input.email).map(str::to_lowercase);
    match &email {
        None => errors.add("email", "REQUIRED", "Email is required"),
        Some(email) if !EMAIL_REGEX.is_match(email) => {
            errors.add("email", "INVALID_FORMAT", "Please provide a valid email")
        }
        Some(_) => {}
    }

    let password = input.password.clone().unwrap_or_default();
    if password.is_empty() {
        errors.add("password", "REQUIRED", "Password is required");
    } else if password.chars().count() < min_password_length {
        errors.add(
            "password",
            "TOO_SHORT",
            format!("Password must be at least {min_password_length} characters"),
        );
    }

    match (name, email) {
        (Some(name), Some(email)) if errors.is_empty() => Ok(ValidRegistration {
            name,
            email,
            password,
        }),
        _ => Err(errors),
    }
}

/// Canonical form of an email used for lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
