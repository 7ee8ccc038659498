use std::sync::OnceLock;

use chrono::{DateTime, Days, FixedOffset};
use regex::Regex;

use crate::models::event::TimeWindow;

/// Zone name attached to every event alongside the literal offset; the
/// provider wants both.
pub const ZONE_NAME: &str = "Asia/Kolkata";

/// Fixed +05:30 civil offset. Deliberately not a tz-database zone: IST has no
/// daylight-saving rules, and a constant offset behaves identically whether
/// or not tzdata is installed.
pub const UTC_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// Offset suffix used when assembling ISO strings from user-typed fields.
pub const OFFSET_SUFFIX: &str = "+05:30";

pub fn zone() -> FixedOffset {
    FixedOffset::east_opt(UTC_OFFSET_SECONDS).expect("IST offset is within range")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

/// Raw capture of an "H[:MM] am/pm" token before 24-hour normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
    pub meridiem: Meridiem,
}

impl ClockTime {
    /// 24-hour civil time: pm maps 1-11 to 13-23 and keeps 12; am maps 12 to
    /// 0 and keeps the rest. `None` when the captured digits don't form a
    /// real clock time (e.g. "99pm").
    pub fn to_civil(&self) -> Option<(u32, u32)> {
        let hour = match self.meridiem {
            Meridiem::Pm if self.hour != 12 => self.hour + 12,
            Meridiem::Am if self.hour == 12 => 0,
            _ => self.hour,
        };
        (hour <= 23 && self.minute <= 59).then_some((hour, self.minute))
    }
}

fn time_pattern() -> &'static Regex {
    static TIME_RE: OnceLock<Regex> = OnceLock::new();
    TIME_RE.get_or_init(|| {
        Regex::new(r"(\d{1,2})(?::(\d{2}))?\s*(am|pm)").expect("time pattern compiles")
    })
}

/// First "11pm" / "7 am" / "07:30pm" style token in the text, if any.
/// Absence of a match is ordinary control flow, never an error.
pub fn extract_clock_time(text: &str) -> Option<ClockTime> {
    let lower = text.to_lowercase();
    let caps = time_pattern().captures(&lower)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps
        .get(2)
        .map(|m| m.as_str().parse())
        .transpose()
        .ok()?
        .unwrap_or(0);
    let meridiem = match caps.get(3)?.as_str() {
        "am" => Meridiem::Am,
        _ => Meridiem::Pm,
    };
    Some(ClockTime {
        hour,
        minute,
        meridiem,
    })
}

/// Window of the default span at `reference_now`'s civil date plus
/// `day_offset`, at the given 24-hour time, anchored in the fixed zone.
pub fn window_for(
    reference_now: DateTime<FixedOffset>,
    day_offset: u32,
    hour: u32,
    minute: u32,
) -> Option<TimeWindow> {
    let local = reference_now.with_timezone(&zone());
    let date = local
        .date_naive()
        .checked_add_days(Days::new(u64::from(day_offset)))?;
    let start = date
        .and_hms_opt(hour, minute, 0)?
        .and_local_timezone(zone())
        .single()?;
    Some(TimeWindow::starting_at(start))
}

/// Resolve a free-text temporal phrase against a reference "now".
///
/// Only the literal word "tomorrow" triggers; every other relative phrase
/// ("next monday", "tonight") returns `None` rather than guessing. Pure and
/// deterministic: no clock reads, no I/O.
pub fn resolve(reference_now: DateTime<FixedOffset>, text: &str) -> Option<TimeWindow> {
    let lower = text.to_lowercase();
    if !lower.contains("tomorrow") {
        return None;
    }
    let clock = extract_clock_time(&lower)?;
    let (hour, minute) = clock.to_civil()?;
    window_for(reference_now, 1, hour, minute)
}
