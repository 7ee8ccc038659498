pub mod bridge_client;
pub mod gemini_client;
pub mod google_calendar;
