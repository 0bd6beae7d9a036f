// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Hookline workspace: webhook envelopes,
//! the closed event-type catalog, queue item shapes, and cron summaries.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HooklineError;

/// Closed catalog of webhook event types.
///
/// Upstream tags outside this catalog parse into [`EventType::Unknown`],
/// which the router logs and treats as success so that schema drift in the
/// upstream event catalog never stalls the queue. Adding a variant here
/// forces an explicit dispatch decision in the router's exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, EnumString)]
pub enum EventType {
    #[strum(serialize = "ContactCreate")]
    ContactCreate,
    #[strum(serialize = "ContactUpdate")]
    ContactUpdate,
    #[strum(serialize = "ContactDelete")]
    ContactDelete,
    #[strum(serialize = "AppointmentCreate")]
    AppointmentCreate,
    #[strum(serialize = "AppointmentUpdate")]
    AppointmentUpdate,
    #[strum(serialize = "AppointmentDelete")]
    AppointmentDelete,
    #[strum(serialize = "InboundMessage")]
    InboundMessage,
    #[strum(serialize = "OutboundMessage")]
    OutboundMessage,
    #[strum(serialize = "ConversationUnreadUpdate")]
    ConversationUnreadUpdate,
    #[strum(serialize = "INSTALL")]
    Install,
    #[strum(serialize = "UNINSTALL")]
    Uninstall,
    #[strum(serialize = "TokenRefresh")]
    TokenRefresh,
    /// Internal cross-tenant sync job, only ever enqueued by the install
    /// handler, never delivered by the upstream platform.
    #[strum(serialize = "agency_sync")]
    AgencySync,
    /// Catch-all for unrecognized upstream tags. Carries the raw tag.
    #[strum(default)]
    Unknown(String),
}

/// A raw webhook delivery as received from the upstream platform.
///
/// Field names follow the upstream wire format (camelCase). The `type` tag
/// is kept as a raw string here and parsed into [`EventType`] at dispatch
/// time so that unknown tags survive the queue round-trip intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    /// External idempotency key, if the source supplied one.
    #[serde(default, rename = "webhookId")]
    pub webhook_id: Option<String>,
    /// Raw event-type tag.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Tenant location, if the event is location-scoped.
    #[serde(default, rename = "locationId")]
    pub location_id: Option<String>,
    /// Tenant company, if the event is company-scoped.
    #[serde(default, rename = "companyId")]
    pub company_id: Option<String>,
    /// Upstream event timestamp (RFC 3339), if supplied.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Type-specific payload, opaque to the queue.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WebhookEnvelope {
    /// Parse the raw tag into the closed event catalog. Never fails:
    /// unrecognized tags become [`EventType::Unknown`].
    pub fn event(&self) -> EventType {
        self.event_type
            .parse()
            .unwrap_or_else(|_| EventType::Unknown(self.event_type.clone()))
    }

    /// The external entity id carried in the payload, for entity events.
    pub fn external_id(&self) -> Option<&str> {
        self.payload.get("id").and_then(|v| v.as_str())
    }

    /// The tenant key for this envelope, or an error if neither company
    /// nor location is present.
    pub fn tenant_key(&self) -> Result<TenantKey, HooklineError> {
        TenantKey::new(self.company_id.clone(), self.location_id.clone())
    }
}

/// Key identifying a tenant for install serialization: a `(company,
/// location)` pair where either side may be absent but not both.
///
/// `(company, None)` is a company-level install and is a distinct key from
/// `(company, Some(location))`; the two do not contend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantKey {
    pub company_id: Option<String>,
    pub location_id: Option<String>,
}

impl TenantKey {
    pub fn new(
        company_id: Option<String>,
        location_id: Option<String>,
    ) -> Result<Self, HooklineError> {
        if company_id.is_none() && location_id.is_none() {
            return Err(HooklineError::Envelope(
                "envelope carries neither companyId nor locationId".into(),
            ));
        }
        Ok(Self {
            company_id,
            location_id,
        })
    }
}

impl std::fmt::Display for TenantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}",
            self.company_id.as_deref().unwrap_or("-"),
            self.location_id.as_deref().unwrap_or("-")
        )
    }
}

/// Logical queue names, all backed by the same physical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum QueueName {
    #[strum(serialize = "webhooks")]
    #[serde(rename = "webhooks")]
    Webhooks,
    #[strum(serialize = "install_retry")]
    #[serde(rename = "install_retry")]
    InstallRetry,
    #[strum(serialize = "sync")]
    #[serde(rename = "sync")]
    Sync,
}

/// Lifecycle states of a queue item.
///
/// `pending -> processing -> {completed | skipped | pending(retry) | failed}`.
/// `failed` and the non-retry exits are terminal; `processing` is only ever
/// left via an explicit transition or the staleness reclaim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
}

/// A persisted unit of work in one of the durable queues.
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// Store-assigned identifier.
    pub id: i64,
    pub queue: QueueName,
    /// External idempotency key, if the source supplied one.
    pub webhook_id: Option<String>,
    /// Raw event-type tag (kept as delivered; see [`EventType::Unknown`]).
    pub event_type: String,
    /// Serialized [`WebhookEnvelope`].
    pub payload: String,
    pub status: QueueStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Provenance tag (e.g. "install_retry") for re-enqueued items.
    pub source: Option<String>,
    pub last_error: Option<String>,
    pub created_at: String,
    /// Earliest eligible dequeue time.
    pub process_after: String,
    pub last_attempt_at: Option<String>,
    pub completed_at: Option<String>,
}

impl QueueItem {
    /// Deserialize the stored envelope.
    pub fn envelope(&self) -> Result<WebhookEnvelope, HooklineError> {
        serde_json::from_str(&self.payload)
            .map_err(|e| HooklineError::Envelope(format!("stored payload is not valid JSON: {e}")))
    }
}

/// Result of attempting to claim a queue item for processing.
///
/// An explicit claim result (rather than last-write-wins) is what keeps two
/// concurrent drivers from double-processing the same item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// This caller atomically transitioned the item to `processing`.
    Claimed,
    /// Another driver got there first (or the item left `pending`).
    AlreadyClaimed,
}

/// Outcome of routing one queue item through its type handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The handler applied the event.
    Applied,
    /// The event-type tag is outside the closed catalog; logged and treated
    /// as success so upstream catalog drift never stalls the queue.
    Unrecognized(String),
    /// The install lock for the tenant key is held; the caller should
    /// re-queue the item, never treat this as fatal.
    Contended,
}

/// Aggregate counts returned by one cron driver run, the operator-facing
/// observability surface for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronSummary {
    /// Items dequeued and attempted this run.
    pub processed: u64,
    pub success: u64,
    pub failed: u64,
    pub skipped: u64,
    /// Housekeeping total: expired locks + aged rows + stale reclaims.
    pub cleaned: u64,
    /// RFC 3339 completion time of the run.
    pub timestamp: String,
}

impl CronSummary {
    pub fn new(cleaned: u64) -> Self {
        Self {
            processed: 0,
            success: 0,
            failed: 0,
            skipped: 0,
            cleaned,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_parse_to_variants() {
        assert_eq!("ContactCreate".parse::<EventType>().unwrap(), EventType::ContactCreate);
        assert_eq!("INSTALL".parse::<EventType>().unwrap(), EventType::Install);
        assert_eq!("agency_sync".parse::<EventType>().unwrap(), EventType::AgencySync);
    }

    #[test]
    fn unknown_tag_is_captured_not_rejected() {
        let parsed = "SomeFutureEvent".parse::<EventType>().unwrap();
        assert_eq!(parsed, EventType::Unknown("SomeFutureEvent".to_string()));
    }

    #[test]
    fn envelope_deserializes_wire_format() {
        let json = r#"{
            "webhookId": "wh-1",
            "type": "ContactCreate",
            "locationId": "loc-1",
            "timestamp": "2026-01-01T00:00:00Z",
            "payload": {"id": "c-1", "name": "Ada"}
        }"#;
        let env: WebhookEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.webhook_id.as_deref(), Some("wh-1"));
        assert_eq!(env.event(), EventType::ContactCreate);
        assert_eq!(env.external_id(), Some("c-1"));
        assert_eq!(env.tenant_key().unwrap().location_id.as_deref(), Some("loc-1"));
    }

    #[test]
    fn envelope_without_tenant_key_is_rejected() {
        let json = r#"{"type": "ContactCreate"}"#;
        let env: WebhookEnvelope = serde_json::from_str(json).unwrap();
        assert!(env.tenant_key().is_err());
    }

    #[test]
    fn company_level_key_is_distinct_from_location_key() {
        let company_only = TenantKey::new(Some("co-1".into()), None).unwrap();
        let with_location = TenantKey::new(Some("co-1".into()), Some("loc-1".into())).unwrap();
        assert_ne!(company_only, with_location);
    }

    #[test]
    fn queue_status_round_trips_as_lowercase() {
        assert_eq!(QueueStatus::Pending.to_string(), "pending");
        assert_eq!("failed".parse::<QueueStatus>().unwrap(), QueueStatus::Failed);
    }

    #[test]
    fn cron_summary_serializes_counts() {
        let mut summary = CronSummary::new(2);
        summary.processed = 5;
        summary.success = 4;
        summary.failed = 1;
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"processed\":5"));
        assert!(json.contains("\"cleaned\":2"));
    }
}
