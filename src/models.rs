pub mod event;
pub mod today;
