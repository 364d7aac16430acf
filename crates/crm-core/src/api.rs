use crate::error::Result;
use crate::types::{
    CalendarListing, ConversationPage, DateWindow, EventListing, LocationListing, MessagePage,
};
use async_trait::async_trait;

/// Operations the upstream CRM API offers. Every call forwards the caller's
/// credential; a non-success status surfaces as `CrmError::Upstream`.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// One page of conversations for a location within `window`.
    async fn search_conversations(
        &self,
        credential: &str,
        location_id: &str,
        window: &DateWindow,
        page_token: Option<&str>,
    ) -> Result<ConversationPage>;

    /// One page of messages for a single conversation.
    async fn list_messages(
        &self,
        credential: &str,
        conversation_id: &str,
        page_token: Option<&str>,
    ) -> Result<MessagePage>;

    /// Calendar events within `window`.
    async fn list_calendar_events(
        &self,
        credential: &str,
        calendar_id: &str,
        window: &DateWindow,
    ) -> Result<EventListing>;

    /// Calendars via the primary `/calendars?locationId=` path.
    async fn list_calendars(&self, credential: &str, location_id: &str) -> Result<CalendarListing>;

    /// Calendars via the per-location `/locations/{id}/calendars` path.
    async fn list_location_calendars(
        &self,
        credential: &str,
        location_id: &str,
    ) -> Result<CalendarListing>;

    async fn list_locations(&self, credential: &str) -> Result<LocationListing>;
}
