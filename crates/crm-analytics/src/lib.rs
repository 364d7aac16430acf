//! Metrics over upstream CRM conversation and calendar data.
//!
//! Classifies messages by author, aggregates outbound/reply metrics across
//! paginated conversations, and reshapes calendar and location listings.

pub mod aggregations;
pub mod catalog;
pub mod classifier;

#[cfg(test)]
mod test_support;

pub use aggregations::{DailyCount, MetricsAggregator, MetricsCounts, MetricsResult};
pub use catalog::{AppointmentSummary, CatalogService, ItemList, NamedItem};
pub use classifier::{Classification, Classifier, MatchRule, MessageField, Origin};
