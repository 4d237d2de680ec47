/// Customer list filtering and recency badges
///
/// Filters apply to an already-fetched page of customers. Day counts are
/// whole days elapsed since the last visit, truncated, and never negative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::customer::Customer;

/// Last visit within this many days counts as recent
pub const RECENT_DAYS: i64 = 7;

/// Last visit more than this many days ago counts as overdue
pub const OVERDUE_DAYS: i64 = 30;

/// Whole days since `last_visit`, clamped at zero for future dates
pub fn days_since(last_visit: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_visit).num_days().max(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Visited within the last week
    Recent,
    /// Not seen for over a month
    Overdue,
}

/// Customer list query filters; every set field must match
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    /// Case-insensitive name substring, or phone substring
    pub search: Option<String>,
    pub activity: Option<Activity>,
    /// Matches any service of the current visit
    pub service: Option<String>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer, now: DateTime<Utc>) -> bool {
        if let Some(query) = self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let query_lower = query.to_lowercase();
            if !customer.name.to_lowercase().contains(&query_lower) && !customer.phone.contains(query) {
                return false;
            }
        }

        if let Some(activity) = self.activity {
            let Some(last_visit) = customer.last_visit() else {
                return false;
            };
            let days = days_since(last_visit, now);
            let keep = match activity {
                Activity::Recent => days <= RECENT_DAYS,
                Activity::Overdue => days > OVERDUE_DAYS,
            };
            if !keep {
                return false;
            }
        }

        if let Some(service) = self.service.as_deref().filter(|s| !s.is_empty()) {
            let offered = customer
                .current_visit
                .as_ref()
                .is_some_and(|visit| visit.services.contains(service));
            if !offered {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, customers: Vec<Customer>, now: DateTime<Utc>) -> Vec<Customer> {
        customers
            .into_iter()
            .filter(|c| self.matches(c, now))
            .collect()
    }
}

/// Badge colour band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyTier {
    Today,
    Yesterday,
    Week,
    Month,
    Overdue,
}

/// "Last seen" badge for a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recency {
    pub days: i64,
    pub label: String,
    pub tier: RecencyTier,
}

impl Recency {
    pub fn of(last_visit: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let days = days_since(last_visit, now);
        let (label, tier) = match days {
            0 => ("Today".to_string(), RecencyTier::Today),
            1 => ("Yesterday".to_string(), RecencyTier::Yesterday),
            d if d <= RECENT_DAYS => (format!("{d}d"), RecencyTier::Week),
            d if d <= OVERDUE_DAYS => (format!("{d}d"), RecencyTier::Month),
            d => (format!("{d}d"), RecencyTier::Overdue),
        };

        Self { days, label, tier }
    }
}

/// Distinct services across the customers' current visits, sorted
pub fn service_options(customers: &[Customer]) -> Vec<String> {
    customers
        .iter()
        .filter_map(|c| c.current_visit.as_ref())
        .flat_map(|visit| visit.services.iter())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
