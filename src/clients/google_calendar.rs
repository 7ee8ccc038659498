use std::fs;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::BridgeSettings;
use crate::error::AppError;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Provider-side timestamp: RFC3339 string plus the named zone. The provider
/// expects the named zone alongside the literal offset, so both are always
/// sent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Event resource as the provider returns it; only the fields the bridge
/// relays.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub html_link: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
}

/// Seam between the bridge's HTTP handlers and the remote calendar store, so
/// the handlers are testable against an in-memory store.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn insert(
        &self,
        summary: &str,
        description: &str,
        start: &str,
        end: &str,
    ) -> Result<ProviderEvent, AppError>;

    async fn patch_window(
        &self,
        event_id: &str,
        start: &str,
        end: &str,
    ) -> Result<ProviderEvent, AppError>;

    async fn remove(&self, event_id: &str) -> Result<(), AppError>;

    async fn window(
        &self,
        time_min: &str,
        time_max: &str,
        max_results: u32,
    ) -> Result<Vec<ProviderEvent>, AppError>;
}

/// Google Calendar v3 client authenticated with a cached OAuth token. The
/// browser consent and refresh flow is out of scope; a missing or expired
/// token surfaces as a provider error on the first call.
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    access_token: String,
    calendar_id: String,
    time_zone: String,
}

#[derive(Debug, Deserialize)]
struct CachedToken {
    // google-auth writes "token"; some tooling writes "access_token".
    token: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventListing {
    #[serde(default)]
    items: Vec<ProviderEvent>,
}

impl GoogleCalendarClient {
    pub fn from_settings(settings: &BridgeSettings) -> Result<Self, AppError> {
        let raw = fs::read_to_string(&settings.token_file).map_err(|e| {
            AppError::Configuration(format!(
                "cannot read token cache {}: {e}",
                settings.token_file
            ))
        })?;
        let cached: CachedToken = serde_json::from_str(&raw).map_err(|e| {
            AppError::Configuration(format!(
                "token cache {} is not valid JSON: {e}",
                settings.token_file
            ))
        })?;
        let access_token = cached.token.or(cached.access_token).ok_or_else(|| {
            AppError::Configuration(format!(
                "token cache {} has no access token",
                settings.token_file
            ))
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            access_token,
            calendar_id: settings.calendar_id.clone(),
            time_zone: settings.time_zone.clone(),
        })
    }

    fn events_url(&self) -> String {
        format!("{API_BASE}/{}/events", self.calendar_id)
    }

    async fn read_event(&self, response: reqwest::Response) -> Result<ProviderEvent, AppError> {
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, body = %text, "calendar provider response");
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "calendar API returned {status}: {text}"
            )));
        }
        serde_json::from_str(&text)
            .map_err(|e| AppError::Provider(format!("unexpected calendar API body: {e}")))
    }

    fn event_time(&self, iso: &str) -> Value {
        json!({ "dateTime": iso, "timeZone": self.time_zone })
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn insert(
        &self,
        summary: &str,
        description: &str,
        start: &str,
        end: &str,
    ) -> Result<ProviderEvent, AppError> {
        let body = json!({
            "summary": summary,
            "description": description,
            "start": self.event_time(start),
            "end": self.event_time(end),
        });
        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        self.read_event(response).await
    }

    async fn patch_window(
        &self,
        event_id: &str,
        start: &str,
        end: &str,
    ) -> Result<ProviderEvent, AppError> {
        let body = json!({
            "start": self.event_time(start),
            "end": self.event_time(end),
        });
        let response = self
            .http
            .patch(format!("{}/{event_id}", self.events_url()))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::Provider(format!("event not found: {event_id}")));
        }
        self.read_event(response).await
    }

    async fn remove(&self, event_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .delete(format!("{}/{event_id}", self.events_url()))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = response.status();
        // Google answers 410 for an already-deleted event.
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(AppError::Provider(format!("event not found: {event_id}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "calendar API returned {status}: {text}"
            )));
        }
        Ok(())
    }

    async fn window(
        &self,
        time_min: &str,
        time_max: &str,
        max_results: u32,
    ) -> Result<Vec<ProviderEvent>, AppError> {
        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", time_min.to_string()),
                ("timeMax", time_max.to_string()),
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "calendar API returned {status}: {text}"
            )));
        }
        let listing: EventListing = serde_json::from_str(&text)
            .map_err(|e| AppError::Provider(format!("unexpected calendar API body: {e}")))?;
        Ok(listing.items)
    }
}
