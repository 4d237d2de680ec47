/// Dashboard counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filters::{days_since, OVERDUE_DAYS};
use crate::models::campaign::Campaign;
use crate::models::customer::Customer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: usize,
    pub active_campaigns: usize,
    /// Customers last seen more than 30 days ago
    pub customers_due: usize,
    /// Successful sends recorded across every campaign run
    pub messages_sent: i64,
}

impl DashboardStats {
    pub fn compute(customers: &[Customer], campaigns: &[Campaign], now: DateTime<Utc>) -> Self {
        let customers_due = customers
            .iter()
            .filter_map(Customer::last_visit)
            .filter(|last_visit| days_since(*last_visit, now) > OVERDUE_DAYS)
            .count();

        Self {
            total_customers: customers.len(),
            active_campaigns: campaigns.iter().filter(|c| c.active).count(),
            customers_due,
            messages_sent: campaigns.iter().map(|c| c.messages_sent).sum(),
        }
    }
}
