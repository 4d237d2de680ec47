/// Customer endpoints
///
/// - `GET    /v1/customers` - One page of customers with filters and recency badges
/// - `POST   /v1/customers` - Create a customer with their first visit
/// - `GET    /v1/customers/all` - Every customer of the salon
/// - `GET    /v1/customers/:id`
/// - `PUT    /v1/customers/:id` - Edit contact fields
/// - `DELETE /v1/customers/:id` - Delete the customer and their history
///
/// Visits are never edited here; see [`super::history`].

use super::{ensure_owner, validate_phone};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rebook_shared::auth::context::AuthContext;
use rebook_shared::models::customer::{Customer, NewCustomer, UpdateCustomer};
use rebook_shared::models::visit::{parse_visit_date, ServiceTags};
use rebook_shared::retention::filters::{service_options, Activity, CustomerFilter, Recency};
use rebook_shared::retention::history::register_customer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 100;

/// Query string of the paginated list
#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    pub page_size: Option<usize>,

    /// Id of the last customer on the previous page
    pub after: Option<Uuid>,

    pub search: Option<String>,
    pub activity: Option<Activity>,
    pub service: Option<String>,
}

impl ListCustomersQuery {
    fn page_size(&self) -> usize {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    fn filter(&self) -> CustomerFilter {
        CustomerFilter {
            search: self.search.clone(),
            activity: self.activity,
            service: self.service.clone(),
        }
    }
}

/// A customer with their "last seen" badge
#[derive(Debug, Serialize)]
pub struct CustomerView {
    #[serde(flatten)]
    pub customer: Customer,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recency: Option<Recency>,
}

impl CustomerView {
    pub fn new(customer: Customer, now: DateTime<Utc>) -> Self {
        let recency = customer.last_visit().map(|at| Recency::of(at, now));
        Self { customer, recency }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerView>,

    pub next_cursor: Option<Uuid>,

    /// Customers in the salon, before filtering
    pub total_count: i64,

    /// Distinct services on the fetched page
    pub service_options: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    /// Services of the first visit, primary first
    pub services: Vec<String>,

    /// `YYYY-MM-DD` or RFC 3339
    pub last_visit: String,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    /// An empty string clears the notes
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

/// Parses the visit part of a request: services and date
pub(crate) fn parse_visit(
    services: Vec<String>,
    date_field: &str,
    date: &str,
) -> Result<(ServiceTags, DateTime<Utc>), ApiError> {
    let mut details = Vec::new();

    let tags = ServiceTags::new(services).map_err(|e| ValidationErrorDetail {
        field: "services".to_string(),
        message: e.to_string(),
    });
    let visited_at = parse_visit_date(date).ok_or_else(|| ValidationErrorDetail {
        field: date_field.to_string(),
        message: "Expected a date (YYYY-MM-DD)".to_string(),
    });

    match (tags, visited_at) {
        (Ok(tags), Ok(visited_at)) => Ok((tags, visited_at)),
        (tags, visited_at) => {
            details.extend(tags.err());
            details.extend(visited_at.err());
            Err(ApiError::ValidationError(details))
        }
    }
}

/// Loads a customer, enforcing that the caller's salon owns it
pub(crate) async fn owned_customer(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Customer> {
    let customer = state
        .store
        .get_customer(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

    ensure_owner(auth, &customer.salon_id, "customer")?;
    Ok(customer)
}

pub async fn list_customers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListCustomersQuery>,
) -> ApiResult<Json<CustomerListResponse>> {
    let page = state
        .store
        .list_customers_page(&auth.salon_id, query.page_size(), query.after)
        .await?;

    let now = Utc::now();
    let options = service_options(&page.customers);
    let customers = query
        .filter()
        .apply(page.customers, now)
        .into_iter()
        .map(|c| CustomerView::new(c, now))
        .collect();

    Ok(Json(CustomerListResponse {
        customers,
        next_cursor: page.next_cursor,
        total_count: page.total_count,
        service_options: options,
    }))
}

pub async fn list_all_customers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Customer>>> {
    let customers = state.store.list_all_customers(&auth.salon_id).await?;
    Ok(Json(customers))
}

/// Creates the customer and records their first visit as an "Initial visit"
/// history row
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    req.validate()?;
    let (services, last_visit) = parse_visit(req.services, "last_visit", &req.last_visit)?;

    let (customer, _) = register_customer(
        state.store.as_ref(),
        NewCustomer {
            salon_id: auth.salon_id.clone(),
            name: req.name.trim().to_string(),
            phone: req.phone.trim().to_string(),
            notes: req.notes.filter(|n| !n.trim().is_empty()),
            services,
            last_visit,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CustomerView>> {
    let customer = owned_customer(&state, &auth, id).await?;
    Ok(Json(CustomerView::new(customer, Utc::now())))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCustomerRequest>,
) -> ApiResult<Json<Customer>> {
    req.validate()?;
    owned_customer(&state, &auth, id).await?;

    let customer = state
        .store
        .update_customer(
            id,
            UpdateCustomer {
                name: req.name.map(|n| n.trim().to_string()),
                phone: req.phone.map(|p| p.trim().to_string()),
                notes: req.notes,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;

    tracing::info!(customer_id = %id, "Customer updated");
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_customer(&state, &auth, id).await?;

    if !state.store.delete_customer(id).await? {
        return Err(ApiError::NotFound("Customer not found".to_string()));
    }

    tracing::info!(customer_id = %id, salon_id = %auth.salon_id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}
