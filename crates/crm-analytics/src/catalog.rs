//! Single-call companion lookups: appointment counts, calendars, locations.
//!
//! Each normalizes upstream's varying field names into a uniform shape.

use crate::aggregations::{breakdown_from, DailyCount};
use crm_core::error::{CrmError, Result};
use crm_core::types::{first_present, CalendarRecord, LocationRecord};
use crm_core::{CrmApi, DateWindow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Appointment count with a per-day breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSummary {
    pub count: u64,
    pub breakdown: Vec<DailyCount>,
}

/// Uniform `{id, name}` entry. Absent values are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&CalendarRecord> for NamedItem {
    fn from(c: &CalendarRecord) -> Self {
        Self {
            id: first_present(&[c.id.as_deref()]).map(String::from),
            name: first_present(&[
                c.name.as_deref(),
                c.calendar_name.as_deref(),
                c.label.as_deref(),
            ])
            .map(String::from),
        }
    }
}

impl From<&LocationRecord> for NamedItem {
    fn from(l: &LocationRecord) -> Self {
        Self {
            id: first_present(&[l.id.as_deref(), l.location_id.as_deref(), l.uid.as_deref()])
                .map(String::from),
            name: first_present(&[
                l.name.as_deref(),
                l.company_name.as_deref(),
                l.label.as_deref(),
            ])
            .map(String::from),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemList {
    pub items: Vec<NamedItem>,
}

pub struct CatalogService {
    api: Arc<dyn CrmApi>,
}

impl CatalogService {
    pub fn new(api: Arc<dyn CrmApi>) -> Self {
        Self { api }
    }

    /// Count calendar events in `window`, bucketed by the date prefix of
    /// `startTime` (else `dateAdded`). Undated events count toward the total only.
    pub async fn appointments(
        &self,
        credential: &str,
        calendar_id: &str,
        window: &DateWindow,
    ) -> Result<AppointmentSummary> {
        if calendar_id.is_empty() {
            return Err(CrmError::validation("Missing calendarId"));
        }
        let events = self
            .api
            .list_calendar_events(credential, calendar_id, window)
            .await?
            .events
            .unwrap_or_default();

        let mut daily: BTreeMap<String, u64> = BTreeMap::new();
        for day in events.iter().filter_map(|e| e.day()) {
            *daily.entry(day).or_insert(0) += 1;
        }

        tracing::debug!(calendar_id, count = events.len(), "Counted appointments");
        Ok(AppointmentSummary {
            count: events.len() as u64,
            breakdown: breakdown_from(daily),
        })
    }

    /// Calendars of a location. Falls back to the per-location path when the
    /// primary listing returns a non-success status.
    pub async fn calendars(&self, credential: &str, location_id: &str) -> Result<ItemList> {
        if location_id.is_empty() {
            return Err(CrmError::validation("Missing locationId"));
        }
        let listing = match self.api.list_calendars(credential, location_id).await {
            Ok(listing) => listing,
            Err(CrmError::Upstream { status, .. }) => {
                tracing::debug!(status, "Primary calendar listing failed, trying fallback");
                self.api
                    .list_location_calendars(credential, location_id)
                    .await?
            }
            Err(e) => return Err(e),
        };

        let records = listing.calendars.or(listing.items).unwrap_or_default();
        Ok(ItemList {
            items: records.iter().map(NamedItem::from).collect(),
        })
    }

    pub async fn locations(&self, credential: &str) -> Result<ItemList> {
        let listing = self.api.list_locations(credential).await?;
        let records = listing.locations.or(listing.items).unwrap_or_default();
        Ok(ItemList {
            items: records.iter().map(NamedItem::from).collect(),
        })
    }
}
