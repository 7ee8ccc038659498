use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Snapshot of "now" taken once at startup and reused for every turn of a
/// session. Long sessions therefore see a stale date; acceptable for an
/// interactive demo, worth refreshing per turn if this ever runs as a
/// service.
#[derive(Debug, Clone, Serialize)]
pub struct TodayInfo {
    pub iso: String,
    pub date: String,
    pub time: String,
    pub weekday: String,
    pub human_readable: String,
    pub timezone: String,
}

impl TodayInfo {
    pub fn at(now: DateTime<FixedOffset>, timezone: &str) -> Self {
        Self {
            iso: now.to_rfc3339(),
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M").to_string(),
            weekday: now.format("%A").to_string(),
            human_readable: now.format("%A, %d %B %Y, %I:%M %p").to_string(),
            timezone: timezone.to_string(),
        }
    }
}
