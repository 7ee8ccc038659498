use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::AppError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const SYSTEM_PROMPT: &str = "\
You are a personal Study & Career Co-Pilot.\n\
\n\
Capabilities:\n\
- Help plan study sessions, AI/ML learning, competitions and exam prep.\n\
- You can reason about today's date and relative dates from the [CONTEXT] block.\n\
- Calendar events are created by the wrapper program, never by you.\n\
\n\
VERY IMPORTANT:\n\
\n\
1) When the user asks for the current date/day, answer from the today_info\n\
   values in [CONTEXT].\n\
\n\
2) Interpret phrases like \"tomorrow\" or explicit dates as concrete\n\
   datetimes in IST (Asia/Kolkata).\n\
\n\
3) There are TWO ways events get created:\n\
   (A) Direct auto-save: the wrapper may already have created an event and\n\
       passes the details in [CONTEXT] under 'auto_event_info'. Just confirm\n\
       what was done.\n\
   (B) Manual wizard: if 'manual_calendar_flow' is set in [CONTEXT], speak\n\
       like a conversational wizard while the wrapper collects the exact\n\
       date/time from the user.\n\
\n\
4) You DO NOT call any tools yourself. Results are already in [CONTEXT].";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// One blocking turn against Gemini's generateContent endpoint. The system
/// prompt, optional context bundle and user utterance travel as three parts
/// of a single user content; nothing structured is read back from the reply.
pub async fn generate_reply(
    http: &reqwest::Client,
    api_key: &str,
    model: &str,
    context: Option<&Value>,
    user_message: &str,
) -> Result<String, AppError> {
    let mut parts = vec![Part {
        text: SYSTEM_PROMPT.to_string(),
    }];
    if let Some(context) = context {
        parts.push(Part {
            text: format!("[CONTEXT]\n{context}"),
        });
    }
    parts.push(Part {
        text: format!("[USER]\n{user_message}"),
    });

    let request = GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts,
        }],
    };

    let url = format!("{GEMINI_API_BASE}/{model}:generateContent");
    let response = http
        .post(&url)
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        debug!(%status, body = %text, "gemini call failed");
        return Err(AppError::Provider(format!(
            "text generation failed with status {status}"
        )));
    }

    let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
        AppError::Provider(format!("failed to parse model response: {e}\nraw body: {text}"))
    })?;

    let reply = parsed
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.as_deref())
        .map(|t| t.trim().to_string());

    match reply {
        Some(reply) if !reply.is_empty() => Ok(reply),
        _ => Err(AppError::Provider("no response from model".to_string())),
    }
}
