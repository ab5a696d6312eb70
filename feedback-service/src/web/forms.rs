//! HTML form bodies and the per-field messages shown next to inputs

use serde::{Deserialize, Serialize};

use crate::services::{FeedbackQuery, LoginInput};
use crate::validation::{FeedbackInput, RatingInput, RegisterInput, ValidationErrors};

const ALL_FIELDS_REQUIRED: &str = "All fields are required";
const PASSWORDS_DIFFER: &str = "Passwords do not match";

/// The public feedback form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub name: String,
    pub email: String,
    pub product: String,
    pub rating: String,
    pub message: String,
}

impl FeedbackForm {
    pub fn to_input(&self) -> FeedbackInput {
        let rating = self.rating.trim();
        let rating = if rating.is_empty() {
            None
        } else {
            Some(match rating.parse::<i64>() {
                Ok(value) => RatingInput::Integer(value),
                Err(_) => RatingInput::Text(rating.to_string()),
            })
        };

        FeedbackInput {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            product: Some(self.product.clone()),
            rating,
            message: Some(self.message.clone()),
        }
    }

    /// Currently selected star count, 0 when none
    pub fn rating_value(&self) -> u8 {
        self.rating.trim().parse().unwrap_or(0)
    }
}

/// First message per field, as the templates show them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMessages {
    pub name: Option<String>,
    pub email: Option<String>,
    pub product: Option<String>,
    pub rating: Option<String>,
    pub message: Option<String>,
    pub password: Option<String>,
    /// Form-wide message that belongs to no single input
    pub form: Option<String>,
}

impl FieldMessages {
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            form: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&ValidationErrors> for FieldMessages {
    fn from(errors: &ValidationErrors) -> Self {
        let first = |field: &str| errors.first(field).map(str::to_string);
        Self {
            name: first("name"),
            email: first("email"),
            product: first("product"),
            rating: first("rating"),
            message: first("message"),
            password: first("password"),
            form: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn check(&self) -> Result<LoginInput, FieldMessages> {
        if self.email.trim().is_empty() || self.password.trim().is_empty() {
            return Err(FieldMessages::form(ALL_FIELDS_REQUIRED));
        }
        Ok(LoginInput {
            email: Some(self.email.clone()),
            password: Some(self.password.clone()),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn check(&self) -> Result<RegisterInput, FieldMessages> {
        let fields = [&self.name, &self.email, &self.password, &self.confirm_password];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(FieldMessages::form(ALL_FIELDS_REQUIRED));
        }
        if self.password != self.confirm_password {
            return Err(FieldMessages::form(PASSWORDS_DIFFER));
        }
        Ok(RegisterInput {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            password: Some(self.password.clone()),
        })
    }
}

/// Dashboard filter controls, carried in the query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardFilters {
    pub tool: String,
    pub rating: String,
    pub start_date: String,
    pub end_date: String,
}

impl DashboardFilters {
    pub fn to_query(&self) -> FeedbackQuery {
        let non_empty = |s: &String| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        FeedbackQuery {
            product: non_empty(&self.tool),
            rating: non_empty(&self.rating),
            start_date: non_empty(&self.start_date),
            end_date: non_empty(&self.end_date),
            keyword: None,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }
}
