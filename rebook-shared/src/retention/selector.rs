/// Due-customer selection
///
/// A customer is due for a campaign when:
///
/// - the campaign has no service filter, or the filter equals the primary
///   service of the customer's last visit, and
/// - the last visit is at or before `now - days_since_visit` and strictly
///   after the Unix epoch (a zero date means "never set").
///
/// Customers with no recorded visit are never due.

use chrono::{DateTime, Duration, Utc};

use crate::models::campaign::Campaign;
use crate::models::customer::Customer;

/// Latest visit date that still qualifies for the campaign
pub fn threshold(campaign: &Campaign, now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(i64::from(campaign.days_since_visit))
}

pub fn is_due(campaign: &Campaign, customer: &Customer, now: DateTime<Utc>) -> bool {
    let Some(visit) = customer.current_visit.as_ref() else {
        return false;
    };

    if let Some(service) = campaign.service_filter() {
        if visit.primary_service() != service {
            return false;
        }
    }

    visit.last_visit <= threshold(campaign, now) && visit.last_visit.timestamp() > 0
}

/// Filters a salon's full customer list down to the campaign's due customers
///
/// Input order is preserved.
pub fn due_customers(campaign: &Campaign, customers: Vec<Customer>, now: DateTime<Utc>) -> Vec<Customer> {
    customers
        .into_iter()
        .filter(|customer| is_due(campaign, customer, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::visit::{CurrentVisit, ServiceTags};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn campaign(days: i32, filter: Option<&str>) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            salon_id: "s1".to_string(),
            name: "Follow-up".to_string(),
            template_id: Uuid::new_v4(),
            service_filter: filter.map(String::from),
            days_since_visit: days,
            active: true,
            last_run: None,
            messages_sent: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn customer(services: &[&str], last_visit: Option<DateTime<Utc>>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            salon_id: "s1".to_string(),
            name: "Asha".to_string(),
            phone: "5551234567".to_string(),
            notes: None,
            current_visit: last_visit
                .map(|at| CurrentVisit::new(ServiceTags::new(services).unwrap(), at)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_forty_days_ago_is_due_without_filter() {
        let c = customer(&["Haircut"], Some(now() - Duration::days(40)));
        assert!(is_due(&campaign(30, None), &c, now()));
    }

    #[test]
    fn test_filter_mismatch_is_not_due() {
        let c = customer(&["Haircut"], Some(now() - Duration::days(40)));
        assert!(!is_due(&campaign(30, Some("Color")), &c, now()));
    }

    #[test]
    fn test_filter_matches_primary_service_only() {
        let c = customer(&["Haircut", "Color"], Some(now() - Duration::days(40)));
        assert!(is_due(&campaign(30, Some("Haircut")), &c, now()));
        assert!(!is_due(&campaign(30, Some("Color")), &c, now()));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let exactly = customer(&["Spa"], Some(now() - Duration::days(30)));
        let just_inside = customer(&["Spa"], Some(now() - Duration::days(30) + Duration::seconds(1)));

        assert!(is_due(&campaign(30, None), &exactly, now()));
        assert!(!is_due(&campaign(30, None), &just_inside, now()));
    }

    #[test]
    fn test_epoch_and_missing_visits_never_due() {
        let epoch = customer(&["Spa"], Some(Utc.timestamp_opt(0, 0).unwrap()));
        let never = customer(&[], None);

        assert!(!is_due(&campaign(1, None), &epoch, now()));
        assert!(!is_due(&campaign(1, None), &never, now()));
    }

    #[test]
    fn test_due_customers_preserves_order() {
        let old = now() - Duration::days(90);
        let recent = now() - Duration::days(2);
        let mut a = customer(&["Haircut"], Some(old));
        a.name = "A".to_string();
        let mut b = customer(&["Haircut"], Some(recent));
        b.name = "B".to_string();
        let mut c = customer(&["Color"], Some(old));
        c.name = "C".to_string();

        let due = due_customers(&campaign(30, None), vec![a, b, c], now());
        let names: Vec<_> = due.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
