/// Visit value types shared by customers and service history
///
/// A visit records one or more services. [`ServiceTags`] is the non-empty,
/// ordered list of those services; the primary service is simply the first
/// tag. [`CurrentVisit`] is the copy of a customer's most recent visit that is
/// cached on the customer record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when a visit is given no usable service names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at least one service is required")]
pub struct EmptyServiceTags;

/// One or more service names, in the order they were selected
///
/// Names are trimmed; blanks and repeats are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ServiceTags(Vec<String>);

impl ServiceTags {
    /// Builds a tag list, rejecting it if nothing usable remains
    pub fn new<I, S>(tags: I) -> Result<Self, EmptyServiceTags>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() || cleaned.iter().any(|t| t == tag) {
                continue;
            }
            cleaned.push(tag.to_string());
        }

        if cleaned.is_empty() {
            Err(EmptyServiceTags)
        } else {
            Ok(Self(cleaned))
        }
    }

    /// Single-service visit
    pub fn single(service: &str) -> Result<Self, EmptyServiceTags> {
        Self::new([service])
    }

    /// The first selected service
    pub fn primary(&self) -> &str {
        // non-empty by construction
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, service: &str) -> bool {
        self.0.iter().any(|s| s == service)
    }

    /// True when the visit covered more than one service
    pub fn is_multi(&self) -> bool {
        self.0.len() > 1
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for ServiceTags {
    type Error = EmptyServiceTags;

    fn try_from(tags: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(tags)
    }
}

impl From<ServiceTags> for Vec<String> {
    fn from(tags: ServiceTags) -> Self {
        tags.0
    }
}

impl fmt::Display for ServiceTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// The customer's most recent visit, cached on the customer record
///
/// Always a copy of the newest service-history row; see
/// [`crate::retention::history`] for the code that keeps it in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentVisit {
    /// Services received on that visit
    pub services: ServiceTags,

    /// When the visit happened
    pub last_visit: DateTime<Utc>,
}

impl CurrentVisit {
    pub fn new(services: ServiceTags, last_visit: DateTime<Utc>) -> Self {
        Self {
            services,
            last_visit,
        }
    }

    pub fn primary_service(&self) -> &str {
        self.services.primary()
    }

    /// Rebuilds the cache from its two database columns
    ///
    /// An empty service array or a missing date both mean "no visit yet".
    pub(crate) fn from_columns(
        services: Vec<String>,
        last_visit: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let last_visit = last_visit?;
        ServiceTags::new(services)
            .ok()
            .map(|services| Self::new(services, last_visit))
    }
}

/// Parses a visit date as entered in a form
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_visit_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
