use async_trait::async_trait;

use crate::models::event::{EventDraft, GatewayResult, ListOutcome, TimeWindow, WindowFilter};

/// Single bounded wait per call; no automatic retries anywhere. A failed
/// call is reported once and the caller decides whether to re-issue.
pub const CALL_TIMEOUT_SECS: u64 = 10;

/// Boundary to the external calendar service. Every operation folds
/// transport and provider failures into its result value; none of them may
/// propagate a fault to the orchestrator.
///
/// `create` is not idempotent: repeated calls create duplicate events, so
/// callers must not retry blindly.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    async fn create(&self, draft: &EventDraft) -> GatewayResult;

    /// Fails (ok:false) when `provider_id` is unknown to the remote store.
    async fn update(&self, provider_id: &str, window: &TimeWindow) -> GatewayResult;

    /// Repeated deletes after the first success come back ok:false, never a
    /// fault.
    async fn delete(&self, provider_id: &str) -> GatewayResult;

    /// At most one page of results, capped by the filter's `max_results`.
    async fn list(&self, filter: &WindowFilter) -> ListOutcome;
}
