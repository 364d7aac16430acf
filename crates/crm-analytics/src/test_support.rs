//! In-memory `CrmApi` for unit tests.
//!
//! Replies are keyed by a short call signature, e.g. `search:-`,
//! `search:<token>`, `messages:<conversation>:<token>`, `events:<calendar>`,
//! `calendars:<location>`, `location_calendars:<location>`, `locations`.
//! A call without a registered reply fails with HTTP 404.

use async_trait::async_trait;
use crm_core::error::{CrmError, Result};
use crm_core::types::{
    CalendarListing, ConversationPage, EventListing, LocationListing, MessagePage,
};
use crm_core::{CrmApi, DateWindow};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

type Reply = std::result::Result<Value, (u16, String)>;

#[derive(Default)]
pub(crate) struct FakeCrm {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl FakeCrm {
    pub fn reply(mut self, key: &str, body: Value) -> Self {
        self.replies.insert(key.to_string(), Ok(body));
        self
    }

    pub fn fail(mut self, key: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert(key.to_string(), Err((status, body.to_string())));
        self
    }

    /// Call signatures in the order they were made.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn respond<T: DeserializeOwned>(&self, key: String) -> Result<T> {
        self.calls.lock().unwrap().push(key.clone());
        match self.replies.get(&key) {
            Some(Ok(body)) => Ok(serde_json::from_value(body.clone())?),
            Some(Err((status, body))) => Err(CrmError::Upstream {
                status: *status,
                body: body.clone(),
            }),
            None => Err(CrmError::Upstream {
                status: 404,
                body: format!("no reply for {key}"),
            }),
        }
    }
}

fn token(page_token: Option<&str>) -> &str {
    page_token.unwrap_or("-")
}

#[async_trait]
impl CrmApi for FakeCrm {
    async fn search_conversations(
        &self,
        _credential: &str,
        _location_id: &str,
        _window: &DateWindow,
        page_token: Option<&str>,
    ) -> Result<ConversationPage> {
        self.respond(format!("search:{}", token(page_token)))
    }

    async fn list_messages(
        &self,
        _credential: &str,
        conversation_id: &str,
        page_token: Option<&str>,
    ) -> Result<MessagePage> {
        self.respond(format!("messages:{}:{}", conversation_id, token(page_token)))
    }

    async fn list_calendar_events(
        &self,
        _credential: &str,
        calendar_id: &str,
        _window: &DateWindow,
    ) -> Result<EventListing> {
        self.respond(format!("events:{calendar_id}"))
    }

    async fn list_calendars(
        &self,
        _credential: &str,
        location_id: &str,
    ) -> Result<CalendarListing> {
        self.respond(format!("calendars:{location_id}"))
    }

    async fn list_location_calendars(
        &self,
        _credential: &str,
        location_id: &str,
    ) -> Result<CalendarListing> {
        self.respond(format!("location_calendars:{location_id}"))
    }

    async fn list_locations(&self, _credential: &str) -> Result<LocationListing> {
        self.respond("locations".to_string())
    }
}
