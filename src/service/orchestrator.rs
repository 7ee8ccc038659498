use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::AppError;
use crate::models::event::{CalendarEvent, EventDraft, GatewayResult};
use crate::models::today::TodayInfo;
use crate::service::agent_service::AgentClient;
use crate::service::calendar_gateway::CalendarGateway;
use crate::service::routing::{self, Intent};
use crate::service::time_resolver;

const DEFAULT_GUIDED_TITLE: &str = "Study Block";
const DEFAULT_GUIDED_DESCRIPTION: &str = "No description";
const FALLBACK_REPLY: &str = "(No response from model)";

/// Fields the guided flow collects interactively. Date and times are kept as
/// raw strings on purpose: anything malformed is passed through to the
/// gateway and the provider's rejection is surfaced, not second-guessed
/// locally.
#[derive(Debug, Clone, Default)]
pub struct GuidedFields {
    pub title: String,
    pub description: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

/// Seam for interactive field collection; the CLI implements it with
/// `inquire`, tests script it.
pub trait GuidedPrompt: Send + Sync {
    fn collect(&self) -> Result<GuidedFields, AppError>;
}

/// Locally derived confirmation, independent of whatever the model said. The
/// user is never left to trust a hallucinated "event created" claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Created { link: Option<String> },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub confirmation: Option<Confirmation>,
}

/// Per-turn driver: classify, resolve or collect, mutate the calendar,
/// then forward the utterance plus the context bundle to the model.
pub struct Orchestrator {
    agent: Arc<dyn AgentClient>,
    gateway: Arc<dyn CalendarGateway>,
    reference_now: DateTime<FixedOffset>,
    today: TodayInfo,
}

impl Orchestrator {
    pub fn new(
        agent: Arc<dyn AgentClient>,
        gateway: Arc<dyn CalendarGateway>,
        reference_now: DateTime<FixedOffset>,
    ) -> Self {
        let local = reference_now.with_timezone(&time_resolver::zone());
        Self {
            agent,
            gateway,
            reference_now: local,
            today: TodayInfo::at(local, time_resolver::ZONE_NAME),
        }
    }

    pub fn today(&self) -> &TodayInfo {
        &self.today
    }

    pub async fn run_turn(&self, text: &str, prompt: &dyn GuidedPrompt) -> TurnOutcome {
        let mut context = json!({ "today_info": self.today });
        let gateway_result = match routing::classify(text) {
            Intent::NoAction | Intent::QueryDateTime => None,
            Intent::AutoCreateEvent {
                hour,
                minute,
                day_offset,
                summary,
            } => {
                match time_resolver::window_for(self.reference_now, day_offset, hour, minute) {
                    Some(window) => {
                        let event = CalendarEvent {
                            summary,
                            description: text.to_string(),
                            window,
                            provider_id: None,
                        };
                        let draft = EventDraft::from_event(&event);
                        let result = self.gateway.create(&draft).await;
                        context["auto_event_info"] = json!({
                            "summary": draft.summary,
                            "start_iso": draft.start,
                            "end_iso": draft.end,
                            "calendar_result": result.raw.clone(),
                        });
                        Some(result)
                    }
                    // Extraction passed but the window could not be built;
                    // same fallback as an unresolvable time.
                    None => Some(self.run_guided(prompt, &mut context).await),
                }
            }
            Intent::GuidedCreateEvent => Some(self.run_guided(prompt, &mut context).await),
        };

        let reply = match self.agent.generate_reply(text, Some(&context)).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "text generation failed");
                FALLBACK_REPLY.to_string()
            }
        };

        let confirmation = gateway_result.map(|result| {
            if result.ok {
                Confirmation::Created {
                    link: result.html_link,
                }
            } else {
                Confirmation::Failed {
                    error: result
                        .error
                        .unwrap_or_else(|| "unknown gateway error".to_string()),
                }
            }
        });

        TurnOutcome {
            reply,
            confirmation,
        }
    }

    async fn run_guided(&self, prompt: &dyn GuidedPrompt, context: &mut Value) -> GatewayResult {
        context["manual_calendar_flow"] = json!(true);
        let fields = match prompt.collect() {
            Ok(fields) => fields,
            Err(err) => return GatewayResult::failure(format!("guided flow aborted: {err}")),
        };

        let title = non_empty_or(fields.title, DEFAULT_GUIDED_TITLE);
        let description = non_empty_or(fields.description, DEFAULT_GUIDED_DESCRIPTION);
        let draft = EventDraft {
            summary: title,
            description,
            start: format!(
                "{}T{}:00{}",
                fields.date.trim(),
                fields.start_time.trim(),
                time_resolver::OFFSET_SUFFIX
            ),
            end: format!(
                "{}T{}:00{}",
                fields.date.trim(),
                fields.end_time.trim(),
                time_resolver::OFFSET_SUFFIX
            ),
        };

        let result = self.gateway.create(&draft).await;
        context["manual_event_info"] = json!({
            "summary": draft.summary,
            "start_iso": draft.start,
            "end_iso": draft.end,
        });
        context["calendar_result"] = result.raw.clone();
        result
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}
