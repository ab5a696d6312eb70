//! Server-rendered pages

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tower_sessions::Session;

use super::{
    chart::BarChart,
    forms::{DashboardFilters, FeedbackForm, FieldMessages, LoginForm, RegisterForm},
    session,
    template::HtmlTemplate,
};
use crate::{
    error::{Error, Result},
    middleware::AuthenticatedAdmin,
    model::{Feedback, Product, Rating},
    state::AppState,
    stats::DashboardSummary,
    validation::{validate_web_form, FORM_NAME_PATTERN},
};

const SUBMITTED: &str = "Feedback submitted successfully!";
const DASHBOARD: &str = "/admin/dashboard";
const LOGIN: &str = "/admin/login";

/// One `<option>` or radio button
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

fn product_options(selected: &str) -> Vec<SelectOption> {
    Product::ALL
        .iter()
        .map(|p| SelectOption {
            value: p.as_str().to_string(),
            label: p.as_str().to_string(),
            selected: p.as_str() == selected,
        })
        .collect()
}

fn rating_options(selected: &str, label: impl Fn(Rating) -> String) -> Vec<SelectOption> {
    let selected = selected.trim();
    Rating::all()
        .map(|r| SelectOption {
            value: r.to_string(),
            label: label(r),
            selected: r.to_string() == selected,
        })
        .collect()
}

fn stars(rating: Rating) -> String {
    "★".repeat(usize::from(rating.value()))
}

#[derive(Template)]
#[template(path = "feedback_form.html")]
struct FeedbackPage {
    form: FeedbackForm,
    errors: FieldMessages,
    success: Option<String>,
    products: Vec<SelectOption>,
    ratings: Vec<SelectOption>,
    name_pattern: &'static str,
}

impl FeedbackPage {
    fn new(form: FeedbackForm, errors: FieldMessages, success: Option<String>) -> Self {
        let products = product_options(&form.product);
        let ratings = rating_options(&form.rating, stars);
        Self {
            form,
            errors,
            success,
            products,
            ratings,
            name_pattern: FORM_NAME_PATTERN,
        }
    }
}

pub async fn feedback_page() -> impl IntoResponse {
    HtmlTemplate::new(FeedbackPage::new(
        FeedbackForm::default(),
        FieldMessages::default(),
        None,
    ))
}

/// Validate with the browser rules, then submit like the API does
pub async fn submit_feedback(
    State(state): State<AppState>,
    Form(form): Form<FeedbackForm>,
) -> Response {
    let prepared = match validate_web_form(&form.to_input()) {
        Ok(prepared) => prepared,
        Err(errors) => {
            let messages = FieldMessages::from(&errors);
            return HtmlTemplate::new(FeedbackPage::new(form, messages, None))
                .with_status(StatusCode::BAD_REQUEST)
                .into_response();
        }
    };

    match state.feedback.submit(&prepared).await {
        Ok(_) => HtmlTemplate::new(FeedbackPage::new(
            FeedbackForm::default(),
            FieldMessages::default(),
            Some(SUBMITTED.to_string()),
        ))
        .into_response(),
        Err(Error::Validation(errors)) => {
            let messages = FieldMessages::from(&errors);
            HtmlTemplate::new(FeedbackPage::new(form, messages, None))
                .with_status(StatusCode::BAD_REQUEST)
                .into_response()
        }
        Err(e) => {
            let status = e.status_code();
            HtmlTemplate::new(FeedbackPage::new(
                form,
                FieldMessages::form(e.public_message()),
                None,
            ))
            .with_status(status)
            .into_response()
        }
    }
}

/// The admin behind the session token, dropping tokens that stopped working
async fn signed_in_admin(state: &AppState, session: &Session) -> Result<Option<AuthenticatedAdmin>> {
    let Some(token) = session::token(session).await? else {
        return Ok(None);
    };

    match state
        .jwt_auth
        .authenticate(&token, state.stores.admins.as_ref())
        .await
    {
        Ok((_, admin)) => Ok(Some(admin)),
        Err(Error::Jwt(_) | Error::Unauthorized(_)) => {
            tracing::debug!("Dropping invalid session token");
            session::sign_out(session).await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[derive(Template)]
#[template(path = "admin_login.html")]
struct LoginPage {
    email: String,
    errors: FieldMessages,
}

pub async fn login_page(State(state): State<AppState>, session: Session) -> Result<Response> {
    if signed_in_admin(&state, &session).await?.is_some() {
        return Ok(Redirect::to(DASHBOARD).into_response());
    }
    Ok(HtmlTemplate::new(LoginPage {
        email: String::new(),
        errors: FieldMessages::default(),
    })
    .into_response())
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let rerender = |errors: FieldMessages, status: StatusCode| {
        HtmlTemplate::new(LoginPage {
            email: form.email.clone(),
            errors,
        })
        .with_status(status)
        .into_response()
    };

    let input = match form.check() {
        Ok(input) => input,
        Err(errors) => return Ok(rerender(errors, StatusCode::BAD_REQUEST)),
    };

    match state.admins.login(&input).await {
        Ok(auth) => {
            session::sign_in(&session, &auth.token).await?;
            Ok(Redirect::to(DASHBOARD).into_response())
        }
        Err(e) => Ok(rerender(FieldMessages::form(e.public_message()), e.status_code())),
    }
}

#[derive(Template)]
#[template(path = "admin_register.html")]
struct RegisterPage {
    name: String,
    email: String,
    errors: FieldMessages,
    registration_open: bool,
}

pub async fn register_page(State(state): State<AppState>, session: Session) -> Result<Response> {
    if signed_in_admin(&state, &session).await?.is_some() {
        return Ok(Redirect::to(DASHBOARD).into_response());
    }
    let registration_open = state.stores.admins.count_admins().await? == 0;
    Ok(HtmlTemplate::new(RegisterPage {
        name: String::new(),
        email: String::new(),
        errors: FieldMessages::default(),
        registration_open,
    })
    .into_response())
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let rerender = |errors: FieldMessages, status: StatusCode, registration_open: bool| {
        HtmlTemplate::new(RegisterPage {
            name: form.name.clone(),
            email: form.email.clone(),
            errors,
            registration_open,
        })
        .with_status(status)
        .into_response()
    };

    let input = match form.check() {
        Ok(input) => input,
        Err(errors) => return Ok(rerender(errors, StatusCode::BAD_REQUEST, true)),
    };

    match state.admins.register(&input).await {
        Ok(auth) => {
            session::sign_in(&session, &auth.token).await?;
            Ok(Redirect::to(DASHBOARD).into_response())
        }
        Err(Error::Validation(errors)) => Ok(rerender(
            FieldMessages::from(&errors),
            StatusCode::BAD_REQUEST,
            true,
        )),
        Err(e @ Error::Forbidden(_)) => Ok(rerender(
            FieldMessages::form(e.public_message()),
            e.status_code(),
            false,
        )),
        Err(e) => Ok(rerender(
            FieldMessages::form(e.public_message()),
            e.status_code(),
            true,
        )),
    }
}

pub async fn logout(session: Session) -> Result<Redirect> {
    session::sign_out(&session).await?;
    Ok(Redirect::to(LOGIN))
}

pub struct FeedbackRow {
    pub name: String,
    pub email: String,
    pub rating: u8,
    pub stars: String,
    pub message: String,
    pub submitted: String,
}

impl From<&Feedback> for FeedbackRow {
    fn from(f: &Feedback) -> Self {
        Self {
            name: f.name.clone(),
            email: f.email.clone(),
            rating: f.rating.value(),
            stars: stars(f.rating),
            message: f.message.clone(),
            submitted: f.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub struct ProductRow {
    pub product: &'static str,
    pub count: usize,
    pub average: String,
    pub feedback: Vec<FeedbackRow>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage {
    admin_email: String,
    filters: DashboardFilters,
    filters_active: bool,
    tools: Vec<SelectOption>,
    ratings: Vec<SelectOption>,
    error: Option<String>,
    total: usize,
    average: String,
    chart: BarChart,
    rows: Vec<ProductRow>,
}

/// Filtered overview; all filter state lives in the query string
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    Query(filters): Query<DashboardFilters>,
) -> Result<Response> {
    let Some(admin) = signed_in_admin(&state, &session).await? else {
        return Ok(Redirect::to(LOGIN).into_response());
    };

    let (feedback, error, status) = match state.feedback.filter(&filters.to_query()).await {
        Ok(feedback) => (feedback, None, StatusCode::OK),
        Err(e @ Error::BadRequest(_)) => (Vec::new(), Some(e.public_message()), e.status_code()),
        Err(e) => return Err(e),
    };

    let summary = DashboardSummary::from_feedback(&feedback);
    let chart = BarChart::new(&summary.chart);
    let rows = summary
        .products
        .iter()
        .map(|p| ProductRow {
            product: p.product.as_str(),
            count: p.count,
            average: p.average.clone(),
            feedback: p.feedback.iter().map(FeedbackRow::from).collect(),
        })
        .collect();

    let page = DashboardPage {
        admin_email: admin.email,
        filters_active: filters.is_active(),
        tools: product_options(filters.tool.trim()),
        ratings: rating_options(&filters.rating, |r| format!("{} ★", r)),
        filters,
        error,
        total: summary.total,
        average: summary.average,
        chart,
        rows,
    };

    Ok(HtmlTemplate::new(page).with_status(status).into_response())
}
