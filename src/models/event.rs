use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;
use serde_json::Value;

/// Default span of an event when the user gives only a start time.
pub const DEFAULT_SPAN_MINUTES: i64 = 30;

/// Page cap for a single `list` call; the bridge never paginates past this.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A concrete start/end pair in the fixed civil zone. Immutable once built;
/// `new` refuses inverted or empty windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Window of the default span starting at `start`.
    pub fn starting_at(start: DateTime<FixedOffset>) -> Self {
        Self {
            start,
            end: start + Duration::minutes(DEFAULT_SPAN_MINUTES),
        }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339()
    }

    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339()
    }
}

/// One calendar event as the caller sees it. The remote provider is the
/// system of record; `provider_id` stays `None` until creation succeeds.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub window: TimeWindow,
    pub provider_id: Option<String>,
}

/// Wire-level payload for `create`. Start/end are plain strings so the
/// guided flow can pass user-typed values straight through and let the
/// provider reject malformed ones.
#[derive(Debug, Clone, Serialize)]
pub struct EventDraft {
    pub summary: String,
    pub description: String,
    pub start: String,
    pub end: String,
}

impl EventDraft {
    pub fn from_event(event: &CalendarEvent) -> Self {
        Self {
            summary: event.summary.clone(),
            description: event.description.clone(),
            start: event.window.start_iso(),
            end: event.window.end_iso(),
        }
    }
}

/// Outcome of one gateway mutation. Failures are encoded here, never thrown
/// across the gateway boundary.
#[derive(Debug, Clone)]
pub struct GatewayResult {
    pub ok: bool,
    pub event_id: Option<String>,
    pub html_link: Option<String>,
    pub error: Option<String>,
    pub raw: Value,
}

impl GatewayResult {
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            ok: false,
            event_id: None,
            html_link: None,
            error: Some(message.clone()),
            raw: serde_json::json!({ "ok": false, "error": message }),
        }
    }

    /// Fold a bridge response body into a result. Any body without
    /// `"ok": true` counts as a failure, whatever the HTTP status was.
    pub fn from_response(raw: Value) -> Self {
        let ok = raw.get("ok").and_then(Value::as_bool).unwrap_or(false);
        let string_field = |key: &str| {
            raw.get(key)
                .and_then(Value::as_str)
                .map(|s| s.to_string())
        };
        Self {
            ok,
            event_id: string_field("eventId"),
            html_link: string_field("htmlLink"),
            error: string_field("error"),
            raw,
        }
    }
}

/// Filter for `list`: a closed time range plus the page cap.
#[derive(Debug, Clone)]
pub struct WindowFilter {
    pub time_min: DateTime<FixedOffset>,
    pub time_max: DateTime<FixedOffset>,
    pub max_results: u32,
}

impl WindowFilter {
    pub fn next_days(from: DateTime<FixedOffset>, days: i64) -> Self {
        Self {
            time_min: from,
            time_max: from + Duration::days(days),
            max_results: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Event row as returned by `list`; times stay provider-formatted strings.
#[derive(Debug, Clone)]
pub struct ListedEvent {
    pub id: String,
    pub summary: String,
    pub start: String,
    pub end: String,
}

/// Outcome of one `list` call, failure encoded like `GatewayResult`.
#[derive(Debug, Clone)]
pub struct ListOutcome {
    pub ok: bool,
    pub events: Vec<ListedEvent>,
    pub error: Option<String>,
}

impl ListOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            events: Vec::new(),
            error: Some(message.into()),
        }
    }
}
