use crate::service::time_resolver;

/// Classified purpose of one user utterance. Produced fresh per turn, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Forward to the model unchanged, no calendar side effect.
    NoAction,
    /// "what is today" style question; answered from the context bundle.
    QueryDateTime,
    /// Enough was extracted to create the event without asking anything.
    /// Hour/minute are already 24-hour civil time.
    AutoCreateEvent {
        hour: u32,
        minute: u32,
        day_offset: u32,
        summary: String,
    },
    /// Calendar request without a resolvable time; collect fields
    /// interactively.
    GuidedCreateEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleTag {
    QueryDateTime,
    CalendarRequest,
}

/// Ordered rule table, first match wins. The matching policy is data, not
/// scattered conditionals, so adding a phrase set is a one-line change.
const RULES: &[(fn(&str) -> bool, RuleTag)] = &[
    (is_date_query, RuleTag::QueryDateTime),
    (is_calendar_request, RuleTag::CalendarRequest),
];

const DATE_QUERY_PHRASES: &[&str] = &[
    "today's date",
    "today date",
    "what is today",
    "what day is it",
];

/// Summary heuristic, fixed priority, first match wins.
const SUMMARY_RULES: &[(&str, &str)] = &[
    ("dsa", "DSA Task Reminder"),
    ("gym", "GYM"),
    ("exam", "Exam Prep"),
];

const DEFAULT_SUMMARY: &str = "Reminder";

fn is_date_query(lower: &str) -> bool {
    DATE_QUERY_PHRASES.iter().any(|p| lower.contains(p))
}

fn is_calendar_request(lower: &str) -> bool {
    lower.contains("calendar")
        || lower.contains("reminder")
        // common misspelling
        || lower.contains("remainder")
        || (lower.contains("save") && lower.contains("tomorrow"))
}

pub fn keyword_summary(lower: &str) -> String {
    SUMMARY_RULES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, summary)| summary.to_string())
        .unwrap_or_else(|| DEFAULT_SUMMARY.to_string())
}

/// Classify one utterance. Case-insensitive throughout.
///
/// A calendar request goes down the auto path only when "tomorrow" and an
/// am/pm token are both present and the extracted time survives validation;
/// otherwise it falls back to the guided flow. Auto-create wins whenever
/// time extraction succeeds.
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();
    let tag = RULES
        .iter()
        .find(|(predicate, _)| predicate(&lower))
        .map(|(_, tag)| *tag);
    match tag {
        Some(RuleTag::QueryDateTime) => Intent::QueryDateTime,
        Some(RuleTag::CalendarRequest) => classify_calendar_request(&lower),
        None => Intent::NoAction,
    }
}

fn classify_calendar_request(lower: &str) -> Intent {
    if lower.contains("tomorrow") && has_meridiem_token(lower) {
        if let Some(clock) = time_resolver::extract_clock_time(lower) {
            if let Some((hour, minute)) = clock.to_civil() {
                return Intent::AutoCreateEvent {
                    hour,
                    minute,
                    day_offset: 1,
                    summary: keyword_summary(lower),
                };
            }
        }
    }
    Intent::GuidedCreateEvent
}

/// Standalone "am"/"pm" with non-alphabetic neighbours, so "tomorrow 5pm"
/// counts but "program tomorrow" does not.
fn has_meridiem_token(lower: &str) -> bool {
    let bytes = lower.as_bytes();
    for i in 0..bytes.len().saturating_sub(1) {
        let first = bytes[i];
        let second = bytes[i + 1];
        if (first == b'a' || first == b'p') && second == b'm' {
            let before = if i == 0 { None } else { Some(bytes[i - 1]) };
            let after = if i + 2 >= bytes.len() {
                None
            } else {
                Some(bytes[i + 2])
            };
            let boundary_before = before.map_or(true, |b| !b.is_ascii_alphabetic());
            let boundary_after = after.map_or(true, |b| !b.is_ascii_alphabetic());
            if boundary_before && boundary_after {
                return true;
            }
        }
    }
    false
}
