//! Outbound-messaging metrics over a date window.
//!
//! Walks every conversation of a location page by page, then every message of
//! each conversation page by page, and folds in-window messages into counters,
//! contact sets and a per-day histogram.

use crate::classifier::Classifier;
use crm_core::error::{CrmError, Result};
use crm_core::types::{day_key, parse_timestamp, Paginated};
use crm_core::{Conversation, CrmApi, DateWindow, Message};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub value: u64,
}

/// Flatten a date-keyed histogram; `BTreeMap` order is ascending by date string.
pub fn breakdown_from(daily: BTreeMap<String, u64>) -> Vec<DailyCount> {
    daily
        .into_iter()
        .map(|(date, value)| DailyCount { date, value })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsCounts {
    pub total_outbound_messages: u64,
    pub unique_messaged_contacts: u64,
    /// Number of distinct contacts that sent at least one reply.
    pub conversations_replied: u64,
}

/// Response body of the metrics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub counts: MetricsCounts,
    pub breakdown: Vec<DailyCount>,
}

/// Running state for one aggregation.
#[derive(Debug)]
pub struct MetricsAccumulator {
    window: DateWindow,
    total_outbound: u64,
    reached: HashSet<String>,
    replied: HashSet<String>,
    daily: BTreeMap<String, u64>,
}

impl MetricsAccumulator {
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            total_outbound: 0,
            reached: HashSet::new(),
            replied: HashSet::new(),
            daily: BTreeMap::new(),
        }
    }

    /// Fold one message of a conversation whose contact is `contact_id`.
    ///
    /// Messages without a parseable time, or outside the window, are ignored.
    pub fn record(
        &mut self,
        classifier: &Classifier,
        contact_id: Option<&str>,
        message: &Message,
    ) {
        let Some(raw_time) = message.time_field() else {
            return;
        };
        match parse_timestamp(raw_time) {
            Some(at) if self.window.contains(at) => {}
            _ => return,
        }

        let classification = classifier.classify(message);

        if classification.outbound {
            self.total_outbound += 1;
            if let Some(contact) = contact_id {
                self.reached.insert(contact.to_string());
                *self.daily.entry(day_key(raw_time)).or_insert(0) += 1;
            }
        }

        if classification.contact_reply {
            if let Some(contact) = contact_id {
                self.replied.insert(contact.to_string());
            }
        }
    }

    pub fn finish(self) -> MetricsResult {
        MetricsResult {
            counts: MetricsCounts {
                total_outbound_messages: self.total_outbound,
                unique_messaged_contacts: self.reached.len() as u64,
                conversations_replied: self.replied.len() as u64,
            },
            breakdown: breakdown_from(self.daily),
        }
    }
}

/// Computes [`MetricsResult`] for a location against the upstream API.
///
/// Conversation pages are fetched sequentially and all of them must succeed.
/// Message pages are fetched per conversation; a non-success status there
/// stops that conversation only and keeps what was already read.
pub struct MetricsAggregator {
    api: Arc<dyn CrmApi>,
    classifier: Classifier,
}

impl MetricsAggregator {
    pub fn new(api: Arc<dyn CrmApi>, classifier: Classifier) -> Self {
        Self { api, classifier }
    }

    pub async fn aggregate(
        &self,
        credential: &str,
        location_id: &str,
        window: &DateWindow,
    ) -> Result<MetricsResult> {
        if credential.is_empty() {
            return Err(CrmError::MissingCredential);
        }
        if location_id.is_empty() {
            return Err(CrmError::validation("Missing locationId"));
        }

        let conversations = self
            .fetch_conversations(credential, location_id, window)
            .await?;

        let mut acc = MetricsAccumulator::new(*window);
        for conversation in &conversations {
            let Some(conversation_id) = conversation.id() else {
                continue;
            };
            self.fold_messages(credential, conversation_id, conversation, &mut acc)
                .await?;
        }

        let result = acc.finish();
        tracing::info!(
            location_id,
            conversations = conversations.len(),
            outbound = result.counts.total_outbound_messages,
            reached = result.counts.unique_messaged_contacts,
            replied = result.counts.conversations_replied,
            "Aggregated messaging metrics"
        );
        Ok(result)
    }

    /// Every conversation in the window. Any failed page fails the whole call.
    async fn fetch_conversations(
        &self,
        credential: &str,
        location_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<Conversation>> {
        let mut conversations = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .api
                .search_conversations(credential, location_id, window, token.as_deref())
                .await?;
            pages += 1;
            token = page.next_token();
            conversations.extend(page.conversations.unwrap_or_default());
            if token.is_none() {
                break;
            }
        }

        tracing::debug!(pages, count = conversations.len(), "Fetched conversations");
        Ok(conversations)
    }

    /// Read one conversation's messages into `acc`. A non-success status
    /// ends this conversation early; transport and decode failures propagate.
    async fn fold_messages(
        &self,
        credential: &str,
        conversation_id: &str,
        conversation: &Conversation,
        acc: &mut MetricsAccumulator,
    ) -> Result<()> {
        let contact_id = conversation.contact_id();
        let mut token: Option<String> = None;

        loop {
            let page = match self
                .api
                .list_messages(credential, conversation_id, token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(CrmError::Upstream { status, .. }) => {
                    tracing::warn!(
                        conversation_id,
                        status,
                        "Message listing failed, keeping messages read so far"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            token = page.next_token();
            for message in page.messages.iter().flatten() {
                acc.record(&self.classifier, contact_id, message);
            }
            if token.is_none() {
                break;
            }
        }

        Ok(())
    }
}
