use std::sync::Arc;

use chrono::{DateTime, Utc};
use inquire::Text;

use crate::clients::bridge_client::BridgeClient;
use crate::config::ChatSettings;
use crate::error::AppError;
use crate::models::event::{TimeWindow, WindowFilter};
use crate::service::agent_service::GeminiService;
use crate::service::calendar_gateway::CalendarGateway;
use crate::service::orchestrator::{Confirmation, GuidedFields, GuidedPrompt, Orchestrator};
use crate::service::time_resolver;

/// Guided-flow prompts backed by interactive stdin questions.
pub struct InquirePrompt;

impl GuidedPrompt for InquirePrompt {
    fn collect(&self) -> Result<GuidedFields, AppError> {
        println!("Let's create a calendar event.");
        let ask = |label: &str| {
            Text::new(label)
                .prompt()
                .map_err(|e| AppError::Validation(format!("prompt failed: {e}")))
        };
        Ok(GuidedFields {
            title: ask("Event title (e.g. 'DSA Practice'):")?,
            description: ask("Short description:")?,
            date: ask("Date (YYYY-MM-DD) in IST:")?,
            start_time: ask("Start time (HH:MM, 24h):")?,
            end_time: ask("End time (HH:MM, 24h):")?,
        })
    }
}

/// Interactive chat loop; returns when the user types exit/quit or stdin
/// closes.
pub async fn chat_loop(settings: ChatSettings) -> Result<(), AppError> {
    let agent = Arc::new(GeminiService::new(&settings));
    let gateway = Arc::new(BridgeClient::new(&settings.bridge_url)?);
    let now = Utc::now().with_timezone(&time_resolver::zone());
    let orchestrator = Orchestrator::new(agent, gateway, now);

    println!("=== Study & Career Co-Pilot ===");
    println!("Type 'exit' to quit.\n");
    println!(
        "[INFO] Today is: {} ({})",
        orchestrator.today().human_readable,
        orchestrator.today().timezone
    );

    let prompt = InquirePrompt;
    loop {
        let line = match Text::new("You >").prompt() {
            Ok(line) => line,
            // Ctrl-C / Ctrl-D ends the session like "exit" does.
            Err(_) => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit") {
            println!("Bye!");
            break;
        }

        let outcome = orchestrator.run_turn(trimmed, &prompt).await;
        println!("\nAgent > {}", outcome.reply);
        print_confirmation(outcome.confirmation.as_ref());
    }
    Ok(())
}

fn print_confirmation(confirmation: Option<&Confirmation>) {
    match confirmation {
        Some(Confirmation::Created { link }) => {
            println!("✅ Event created successfully.");
            if let Some(link) = link {
                println!("   Link: {link}");
            }
        }
        Some(Confirmation::Failed { error }) => {
            println!("❌ Failed to create event.");
            println!("   Error: {error}");
        }
        None => {}
    }
}

/// Find an upcoming event by its exact summary and move it to a new window.
pub async fn reschedule(
    bridge_url: &str,
    summary: &str,
    start: &str,
    end: &str,
) -> Result<(), AppError> {
    let gateway = BridgeClient::new(bridge_url)?;
    let start = parse_rfc3339(start)?;
    let end = parse_rfc3339(end)?;
    let window = TimeWindow::new(start, end)
        .ok_or_else(|| AppError::Validation("end must be after start".to_string()))?;

    let now = Utc::now().with_timezone(&time_resolver::zone());
    let listing = gateway.list(&WindowFilter::next_days(now, 7)).await;
    if !listing.ok {
        println!(
            "❌ Failed to list events: {}",
            listing.error.as_deref().unwrap_or("unknown error")
        );
        return Ok(());
    }

    let Some(event) = listing.events.iter().find(|e| e.summary == summary) else {
        println!("Event '{summary}' not found in the next 7 days.");
        return Ok(());
    };
    println!(
        "Found event: {} (ID: {}), current start {}",
        event.summary, event.id, event.start
    );

    let result = gateway.update(&event.id, &window).await;
    if result.ok {
        println!("✅ Event updated successfully.");
        println!("   New window: {} -> {}", window.start_iso(), window.end_iso());
    } else {
        println!(
            "❌ Failed to update event: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Delete one event by provider id.
pub async fn delete_event(bridge_url: &str, event_id: &str) -> Result<(), AppError> {
    let gateway = BridgeClient::new(bridge_url)?;
    let result = gateway.delete(event_id).await;
    if result.ok {
        println!("✅ Event deleted.");
    } else {
        println!(
            "❌ Failed to delete event: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn parse_rfc3339(value: &str) -> Result<DateTime<chrono::FixedOffset>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| AppError::Validation(format!("invalid RFC3339 timestamp '{value}': {e}")))
}
