//! Free-text questions about the analyzed dataset

use tracing::{debug, info, warn};

use super::{Flow, FlowGuard};
use crate::api::{AskReply, AskRequest};
use crate::app::Controller;
use crate::error::ControllerError;

/// How an AI question ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// Empty prompt, nothing sent
    Skipped,
    /// Model answer
    Answered(String),
    /// Backend error text, shown verbatim in place of an answer
    Rejected(String),
    /// Request never completed
    Failed(String),
}

impl AskOutcome {
    /// Text for the shared answer surface
    pub fn display_text(&self) -> Option<&str> {
        match self {
            AskOutcome::Skipped => None,
            AskOutcome::Answered(text) | AskOutcome::Rejected(text) | AskOutcome::Failed(text) => {
                Some(text)
            }
        }
    }
}

impl Controller {
    /// Ask about the last analyzed dataset
    ///
    /// `api_key` overrides the configured key for this question only.
    /// Only `Busy` is returned as an error; every other failure is an outcome.
    pub async fn ask_question(
        &self,
        prompt: &str,
        api_key: Option<String>,
    ) -> Result<AskOutcome, ControllerError> {
        if prompt.trim().is_empty() {
            debug!("Empty question, nothing to ask");
            return Ok(AskOutcome::Skipped);
        }

        let (request, _asking) = {
            let mut s = self.session.lock();
            let asking = FlowGuard::engage(&mut s, &self.session, Flow::Ask)?;
            s.ai_answer = None;
            let request = AskRequest {
                prompt: prompt.to_string(),
                context: s.conversation_context.clone(),
                api_key: api_key
                    .filter(|k| !k.is_empty())
                    .or_else(|| self.default_api_key.clone()),
            };
            (request, asking)
        };

        info!("Asking AI: {}", request.prompt);
        let outcome = match self.backend.ask_ai(&request).await {
            Ok(AskReply {
                response: Some(text),
                ..
            }) if !text.is_empty() => AskOutcome::Answered(text),
            Ok(AskReply {
                error: Some(message),
                ..
            }) => {
                warn!("AI request refused: {}", message);
                AskOutcome::Rejected(message)
            }
            Ok(_) => AskOutcome::Rejected("Unknown error".to_string()),
            Err(e) => {
                warn!("AI request failed: {}", e);
                AskOutcome::Failed(format!("Network Error: {}", e))
            }
        };

        self.session.lock().ai_answer = outcome.display_text().map(str::to_string);
        Ok(outcome)
    }
}
