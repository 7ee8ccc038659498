use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::AppError;
use crate::models::event::{EventDraft, GatewayResult, ListOutcome, ListedEvent, TimeWindow, WindowFilter};
use crate::service::calendar_gateway::{CALL_TIMEOUT_SECS, CalendarGateway};

/// HTTP client for the local calendar bridge. Thin by design: it shapes
/// payloads, applies the one bounded timeout, and folds every failure into
/// the returned value.
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: String,
}

impl BridgeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(CALL_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Configuration(format!("cannot build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> GatewayResult {
        let url = format!("{}{}", self.base_url, path);
        let response = match self.http.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => return GatewayResult::failure(format!("bridge request failed: {e}")),
        };
        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return GatewayResult::failure(format!("bridge response unreadable: {e}")),
        };
        debug!(%status, body = %text, path, "calendar bridge response");
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => GatewayResult::from_response(value),
            Err(_) => GatewayResult::failure(format!("bridge returned non-JSON ({status}): {text}")),
        }
    }
}

#[async_trait]
impl CalendarGateway for BridgeClient {
    async fn create(&self, draft: &EventDraft) -> GatewayResult {
        let body = match serde_json::to_value(draft) {
            Ok(v) => v,
            Err(e) => return GatewayResult::failure(format!("cannot encode event: {e}")),
        };
        self.post("/create_event", body).await
    }

    async fn update(&self, provider_id: &str, window: &TimeWindow) -> GatewayResult {
        self.post(
            "/update_event",
            json!({
                "eventId": provider_id,
                "start": window.start_iso(),
                "end": window.end_iso(),
            }),
        )
        .await
    }

    async fn delete(&self, provider_id: &str) -> GatewayResult {
        self.post("/delete_event", json!({ "event_id": provider_id }))
            .await
    }

    async fn list(&self, filter: &WindowFilter) -> ListOutcome {
        let url = format!("{}/list_events", self.base_url);
        let response = match self
            .http
            .get(&url)
            .query(&[
                ("timeMin", filter.time_min.to_rfc3339()),
                ("timeMax", filter.time_max.to_rfc3339()),
                ("maxResults", filter.max_results.to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return ListOutcome::failure(format!("bridge request failed: {e}")),
        };
        let status = response.status();
        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return ListOutcome::failure(format!("bridge returned non-JSON ({status}): {e}")),
        };
        let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if !ok {
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown bridge error")
                .to_string();
            return ListOutcome::failure(error);
        }
        let events = body
            .get("events")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        let field = |key: &str| {
                            item.get(key)
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string()
                        };
                        ListedEvent {
                            id: field("id"),
                            summary: field("summary"),
                            start: field("start"),
                            end: field("end"),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        ListOutcome {
            ok: true,
            events,
            error: None,
        }
    }
}
