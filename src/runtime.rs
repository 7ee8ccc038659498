use std::convert::Infallible;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::clients::google_calendar::{CalendarProvider, GoogleCalendarClient};
use crate::config::BridgeSettings;
use crate::error::AppError;
use crate::models::event::DEFAULT_PAGE_SIZE;

/// Exact message the create endpoint answers with when the window is
/// incomplete; callers match on it, so it is part of the wire contract.
pub const MISSING_WINDOW_ERROR: &str = "Missing 'start' or 'end' in request payload.";

const DEFAULT_EVENT_SUMMARY: &str = "Study Block";

/// Run the calendar bridge until the process is stopped.
pub async fn run_bridge(settings: BridgeSettings) -> Result<(), AppError> {
    let provider: Arc<dyn CalendarProvider> =
        Arc::new(GoogleCalendarClient::from_settings(&settings)?);
    info!(addr = %settings.bind, "serving calendar bridge");
    warp::serve(bridge_routes(provider)).run(settings.bind).await;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    summary: Option<String>,
    description: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateEventRequest {
    #[serde(rename = "eventId")]
    event_id: Option<String>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteEventRequest {
    event_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListEventsQuery {
    #[serde(rename = "timeMin")]
    time_min: Option<String>,
    #[serde(rename = "timeMax")]
    time_max: Option<String>,
    #[serde(rename = "maxResults")]
    max_results: Option<u32>,
}

/// All bridge routes; the provider is injected so tests can swap in an
/// in-memory store.
pub fn bridge_routes(
    provider: Arc<dyn CalendarProvider>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "ok": true, "message": "calendar bridge is running" })));

    let create = warp::path("create_event")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_provider(provider.clone()))
        .and_then(create_event);

    let list = warp::path("list_events")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<ListEventsQuery>())
        .and(with_provider(provider.clone()))
        .and_then(list_events);

    let update = warp::path("update_event")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_provider(provider.clone()))
        .and_then(update_event);

    let delete = warp::path("delete_event")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_provider(provider))
        .and_then(delete_event);

    health.or(create).or(list).or(update).or(delete)
}

fn with_provider(
    provider: Arc<dyn CalendarProvider>,
) -> impl Filter<Extract = (Arc<dyn CalendarProvider>,), Error = Infallible> + Clone {
    warp::any().map(move || provider.clone())
}

fn json_reply(value: serde_json::Value, status: StatusCode) -> impl Reply {
    warp::reply::with_status(warp::reply::json(&value), status)
}

fn provider_failure(err: AppError) -> impl Reply {
    error!(error = %err, "calendar provider call failed");
    json_reply(
        json!({ "ok": false, "error": err.to_string() }),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

async fn create_event(
    request: CreateEventRequest,
    provider: Arc<dyn CalendarProvider>,
) -> Result<Box<dyn Reply>, Infallible> {
    let (Some(start), Some(end)) = (request.start, request.end) else {
        return Ok(Box::new(json_reply(
            json!({ "ok": false, "error": MISSING_WINDOW_ERROR }),
            StatusCode::BAD_REQUEST,
        )));
    };
    let summary = request
        .summary
        .unwrap_or_else(|| DEFAULT_EVENT_SUMMARY.to_string());
    let description = request.description.unwrap_or_default();

    match provider.insert(&summary, &description, &start, &end).await {
        Ok(event) => Ok(Box::new(json_reply(
            json!({
                "ok": true,
                "eventId": event.id,
                "htmlLink": event.html_link,
                "summary": event.summary,
                "start": event.start,
                "end": event.end,
            }),
            StatusCode::OK,
        ))),
        Err(err) => Ok(Box::new(provider_failure(err))),
    }
}

async fn list_events(
    query: ListEventsQuery,
    provider: Arc<dyn CalendarProvider>,
) -> Result<Box<dyn Reply>, Infallible> {
    let (Some(time_min), Some(time_max)) = (query.time_min, query.time_max) else {
        return Ok(Box::new(json_reply(
            json!({ "ok": false, "error": "Missing 'timeMin' or 'timeMax' in query." }),
            StatusCode::BAD_REQUEST,
        )));
    };
    let max_results = query.max_results.unwrap_or(DEFAULT_PAGE_SIZE);

    match provider.window(&time_min, &time_max, max_results).await {
        Ok(events) => {
            let events: Vec<_> = events
                .into_iter()
                .map(|event| {
                    json!({
                        "id": event.id,
                        "summary": event.summary,
                        "start": event.start.map(|t| t.date_time),
                        "end": event.end.map(|t| t.date_time),
                    })
                })
                .collect();
            Ok(Box::new(json_reply(
                json!({ "ok": true, "events": events }),
                StatusCode::OK,
            )))
        }
        Err(err) => Ok(Box::new(provider_failure(err))),
    }
}

async fn update_event(
    request: UpdateEventRequest,
    provider: Arc<dyn CalendarProvider>,
) -> Result<Box<dyn Reply>, Infallible> {
    let (Some(event_id), Some(start), Some(end)) = (request.event_id, request.start, request.end)
    else {
        return Ok(Box::new(json_reply(
            json!({ "ok": false, "error": "Missing 'eventId', 'start' or 'end' in request payload." }),
            StatusCode::BAD_REQUEST,
        )));
    };

    match provider.patch_window(&event_id, &start, &end).await {
        Ok(event) => Ok(Box::new(json_reply(
            json!({
                "ok": true,
                "start": event.start,
                "end": event.end,
            }),
            StatusCode::OK,
        ))),
        Err(err) => Ok(Box::new(provider_failure(err))),
    }
}

async fn delete_event(
    request: DeleteEventRequest,
    provider: Arc<dyn CalendarProvider>,
) -> Result<Box<dyn Reply>, Infallible> {
    let Some(event_id) = request.event_id else {
        return Ok(Box::new(json_reply(
            json!({ "ok": false, "error": "Missing 'event_id' in request payload." }),
            StatusCode::BAD_REQUEST,
        )));
    };

    match provider.remove(&event_id).await {
        Ok(()) => Ok(Box::new(json_reply(
            json!({ "ok": true }),
            StatusCode::OK,
        ))),
        Err(err) => Ok(Box::new(provider_failure(err))),
    }
}
