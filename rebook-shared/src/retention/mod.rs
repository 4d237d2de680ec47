/// Client-retention logic
///
/// Everything between the store and the HTTP layer:
///
/// - `selector`: which customers a campaign is due to message
/// - `composer`: turns a template and a customer into a WhatsApp payload
/// - `dispatch`: runs a campaign end to end and records the run
/// - `history`: keeps each customer's cached visit in sync with their history
/// - `filters`: customer-list search, activity filters and recency badges
/// - `stats`: dashboard counters

pub mod composer;
pub mod dispatch;
pub mod filters;
pub mod history;
pub mod selector;
pub mod stats;
