use crate::api::CrmApi;
use crate::config::UpstreamConfig;
use crate::error::{CrmError, Result};
use crate::types::{
    CalendarListing, ConversationPage, DateWindow, EventListing, LocationListing, MessagePage,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

const PAGE_TOKEN_PARAM: &str = "nextPageToken";

/// reqwest-backed implementation of [`CrmApi`].
pub struct HttpCrmClient {
    client: reqwest::Client,
    base_url: Url,
    api_version: String,
}

impl HttpCrmClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(CrmError::Config(format!(
                "upstream base_url '{}' cannot be used as a base",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            api_version: config.api_version.clone(),
        })
    }

    /// Build an endpoint URL from path segments (each segment is percent-encoded).
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CrmError::Config("upstream base_url cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, credential: &str, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url.path());
        let response = self
            .client
            .get(url)
            .bearer_auth(credential)
            .header("Version", &self.api_version)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CrmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn append_page_token(url: &mut Url, page_token: Option<&str>) {
    if let Some(token) = page_token {
        url.query_pairs_mut().append_pair(PAGE_TOKEN_PARAM, token);
    }
}

#[async_trait]
impl CrmApi for HttpCrmClient {
    async fn search_conversations(
        &self,
        credential: &str,
        location_id: &str,
        window: &DateWindow,
        page_token: Option<&str>,
    ) -> Result<ConversationPage> {
        let mut url = self.endpoint(&["conversations", "search"])?;
        url.query_pairs_mut()
            .append_pair("locationId", location_id)
            .append_pair("startDate", &window.start_param())
            .append_pair("endDate", &window.end_param());
        append_page_token(&mut url, page_token);
        self.get_json(credential, url).await
    }

    async fn list_messages(
        &self,
        credential: &str,
        conversation_id: &str,
        page_token: Option<&str>,
    ) -> Result<MessagePage> {
        let mut url = self.endpoint(&["conversations", conversation_id, "messages"])?;
        append_page_token(&mut url, page_token);
        self.get_json(credential, url).await
    }

    async fn list_calendar_events(
        &self,
        credential: &str,
        calendar_id: &str,
        window: &DateWindow,
    ) -> Result<EventListing> {
        let mut url = self.endpoint(&["calendars", "events"])?;
        url.query_pairs_mut()
            .append_pair("calendarId", calendar_id)
            .append_pair("startTime", &window.start_param())
            .append_pair("endTime", &window.end_param());
        self.get_json(credential, url).await
    }

    async fn list_calendars(&self, credential: &str, location_id: &str) -> Result<CalendarListing> {
        let mut url = self.endpoint(&["calendars"])?;
        url.query_pairs_mut().append_pair("locationId", location_id);
        self.get_json(credential, url).await
    }

    async fn list_location_calendars(
        &self,
        credential: &str,
        location_id: &str,
    ) -> Result<CalendarListing> {
        let url = self.endpoint(&["locations", location_id, "calendars"])?;
        self.get_json(credential, url).await
    }

    async fn list_locations(&self, credential: &str) -> Result<LocationListing> {
        let url = self.endpoint(&["locations"])?;
        self.get_json(credential, url).await
    }
}
