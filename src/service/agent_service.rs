use async_trait::async_trait;
use serde_json::Value;

use crate::clients::gemini_client;
use crate::config::ChatSettings;
use crate::error::AppError;

/// Seam for the external text-generation call so the orchestrator can be
/// exercised with fakes.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn generate_reply(
        &self,
        user_message: &str,
        context: Option<&Value>,
    ) -> Result<String, AppError>;
}

pub struct GeminiService {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiService {
    pub fn new(settings: &ChatSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: settings.gemini_api_key.clone(),
            model: settings.gemini_model.clone(),
        }
    }
}

#[async_trait]
impl AgentClient for GeminiService {
    async fn generate_reply(
        &self,
        user_message: &str,
        context: Option<&Value>,
    ) -> Result<String, AppError> {
        gemini_client::generate_reply(&self.http, &self.api_key, &self.model, context, user_message)
            .await
    }
}
