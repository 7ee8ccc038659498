use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use serde_json::{Value, json};

use study_copilot::error::AppError;
use study_copilot::models::event::{EventDraft, GatewayResult, ListOutcome, TimeWindow, WindowFilter};
use study_copilot::service::agent_service::AgentClient;
use study_copilot::service::calendar_gateway::CalendarGateway;
use study_copilot::service::orchestrator::{
    Confirmation, GuidedFields, GuidedPrompt, Orchestrator,
};

fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}

fn reference_now() -> DateTime<FixedOffset> {
    ist().with_ymd_and_hms(2025, 11, 19, 10, 0, 0).unwrap()
}

struct FakeAgent {
    reply: Result<String, String>,
    seen_context: Mutex<Option<Value>>,
}

impl FakeAgent {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            seen_context: Mutex::new(None),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            seen_context: Mutex::new(None),
        })
    }

    fn context(&self) -> Value {
        self.seen_context.lock().unwrap().clone().unwrap()
    }
}

#[async_trait]
impl AgentClient for FakeAgent {
    async fn generate_reply(
        &self,
        _user_message: &str,
        context: Option<&Value>,
    ) -> Result<String, AppError> {
        *self.seen_context.lock().unwrap() = context.cloned();
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(err) => Err(AppError::Provider(err.clone())),
        }
    }
}

struct FakeGateway {
    create_result: GatewayResult,
    drafts: Mutex<Vec<EventDraft>>,
}

impl FakeGateway {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            create_result: GatewayResult::from_response(json!({
                "ok": true,
                "eventId": "evt-42",
                "htmlLink": "https://calendar.google.com/event?eid=evt-42"
            })),
            drafts: Mutex::new(Vec::new()),
        })
    }

    fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            create_result: GatewayResult::failure(error),
            drafts: Mutex::new(Vec::new()),
        })
    }

    fn drafts(&self) -> Vec<EventDraft> {
        self.drafts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarGateway for FakeGateway {
    async fn create(&self, draft: &EventDraft) -> GatewayResult {
        self.drafts.lock().unwrap().push(draft.clone());
        self.create_result.clone()
    }

    async fn update(&self, _provider_id: &str, _window: &TimeWindow) -> GatewayResult {
        GatewayResult::failure("update not scripted")
    }

    async fn delete(&self, _provider_id: &str) -> GatewayResult {
        GatewayResult::failure("delete not scripted")
    }

    async fn list(&self, _filter: &WindowFilter) -> ListOutcome {
        ListOutcome::failure("list not scripted")
    }
}

struct ScriptedPrompt {
    fields: GuidedFields,
}

impl GuidedPrompt for ScriptedPrompt {
    fn collect(&self) -> Result<GuidedFields, AppError> {
        Ok(self.fields.clone())
    }
}

struct UnusedPrompt;

impl GuidedPrompt for UnusedPrompt {
    fn collect(&self) -> Result<GuidedFields, AppError> {
        panic!("guided prompt must not run for this turn");
    }
}

#[tokio::test]
async fn auto_create_turn_creates_event_and_confirms() {
    let agent = FakeAgent::replying("Done, reminder saved.");
    let gateway = FakeGateway::succeeding();
    let orchestrator = Orchestrator::new(agent.clone(), gateway.clone(), reference_now());

    let outcome = orchestrator
        .run_turn("remind me tomorrow at 11pm for dsa", &UnusedPrompt)
        .await;

    let drafts = gateway.drafts();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].summary, "DSA Task Reminder");
    assert_eq!(drafts[0].description, "remind me tomorrow at 11pm for dsa");
    assert_eq!(drafts[0].start, "2025-11-20T23:00:00+05:30");
    assert_eq!(drafts[0].end, "2025-11-20T23:30:00+05:30");

    assert_eq!(outcome.reply, "Done, reminder saved.");
    assert_eq!(
        outcome.confirmation,
        Some(Confirmation::Created {
            link: Some("https://calendar.google.com/event?eid=evt-42".to_string()),
        })
    );

    let context = agent.context();
    assert_eq!(
        context["auto_event_info"]["start_iso"],
        "2025-11-20T23:00:00+05:30"
    );
    assert_eq!(context["today_info"]["date"], "2025-11-19");
}

#[tokio::test]
async fn gateway_failure_is_reported_independently_of_reply() {
    // The model can claim anything; the confirmation comes from the gateway.
    let agent = FakeAgent::replying("Your event is booked!");
    let gateway = FakeGateway::failing("bridge request failed: connection refused");
    let orchestrator = Orchestrator::new(agent, gateway, reference_now());

    let outcome = orchestrator
        .run_turn("save a reminder tomorrow at 7am for gym", &UnusedPrompt)
        .await;

    assert_eq!(outcome.reply, "Your event is booked!");
    assert_eq!(
        outcome.confirmation,
        Some(Confirmation::Failed {
            error: "bridge request failed: connection refused".to_string(),
        })
    );
}

#[tokio::test]
async fn plain_chat_skips_the_gateway() {
    let agent = FakeAgent::replying("Spaced repetition works well.");
    let gateway = FakeGateway::succeeding();
    let orchestrator = Orchestrator::new(agent.clone(), gateway.clone(), reference_now());

    let outcome = orchestrator
        .run_turn("how should I study for interviews", &UnusedPrompt)
        .await;

    assert!(gateway.drafts().is_empty());
    assert_eq!(outcome.confirmation, None);
    let context = agent.context();
    assert!(context.get("auto_event_info").is_none());
    assert!(context.get("manual_calendar_flow").is_none());
}

#[tokio::test]
async fn date_query_answers_from_context_without_side_effects() {
    let agent = FakeAgent::replying("Today is Wednesday, 19 November 2025.");
    let gateway = FakeGateway::succeeding();
    let orchestrator = Orchestrator::new(agent.clone(), gateway.clone(), reference_now());

    let outcome = orchestrator.run_turn("what is today?", &UnusedPrompt).await;

    assert!(gateway.drafts().is_empty());
    assert_eq!(outcome.confirmation, None);
    assert_eq!(agent.context()["today_info"]["weekday"], "Wednesday");
}

#[tokio::test]
async fn guided_flow_applies_defaults_and_passes_raw_fields() {
    let agent = FakeAgent::replying("Created your study block.");
    let gateway = FakeGateway::succeeding();
    let orchestrator = Orchestrator::new(agent.clone(), gateway.clone(), reference_now());
    let prompt = ScriptedPrompt {
        fields: GuidedFields {
            title: "   ".to_string(),
            description: String::new(),
            date: "2025-12-01".to_string(),
            start_time: "10:00".to_string(),
            end_time: "11:30".to_string(),
        },
    };

    let outcome = orchestrator
        .run_turn("put a study session on my calendar", &prompt)
        .await;

    let drafts = gateway.drafts();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].summary, "Study Block");
    assert_eq!(drafts[0].description, "No description");
    assert_eq!(drafts[0].start, "2025-12-01T10:00:00+05:30");
    assert_eq!(drafts[0].end, "2025-12-01T11:30:00+05:30");
    assert!(matches!(
        outcome.confirmation,
        Some(Confirmation::Created { .. })
    ));

    let context = agent.context();
    assert_eq!(context["manual_calendar_flow"], json!(true));
    assert_eq!(
        context["manual_event_info"]["start_iso"],
        "2025-12-01T10:00:00+05:30"
    );
}

#[tokio::test]
async fn malformed_guided_fields_still_reach_the_gateway() {
    // Validation is the provider's job; the draft carries the typo as-is.
    let agent = FakeAgent::replying("ok");
    let gateway = FakeGateway::failing("calendar API returned 400 Bad Request: bad start");
    let orchestrator = Orchestrator::new(agent, gateway.clone(), reference_now());
    let prompt = ScriptedPrompt {
        fields: GuidedFields {
            title: "Python Basics".to_string(),
            description: "intro".to_string(),
            date: "2025-13-40".to_string(),
            start_time: "26:00".to_string(),
            end_time: "27:00".to_string(),
        },
    };

    let outcome = orchestrator
        .run_turn("remainder for python", &prompt)
        .await;

    let drafts = gateway.drafts();
    assert_eq!(drafts[0].start, "2025-13-40T26:00:00+05:30");
    assert!(matches!(
        outcome.confirmation,
        Some(Confirmation::Failed { .. })
    ));
}

#[tokio::test]
async fn model_failure_falls_back_to_placeholder_reply() {
    let agent = FakeAgent::failing("text generation failed with status 503");
    let gateway = FakeGateway::succeeding();
    let orchestrator = Orchestrator::new(agent, gateway, reference_now());

    let outcome = orchestrator
        .run_turn("reminder tomorrow at 9am for exam", &UnusedPrompt)
        .await;

    assert_eq!(outcome.reply, "(No response from model)");
    // The calendar mutation still happened and is still confirmed locally.
    assert!(matches!(
        outcome.confirmation,
        Some(Confirmation::Created { .. })
    ));
}
