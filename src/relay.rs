use tracing::{info, warn};

use crate::config::Config;
use crate::model_gateway::{ModelGateway, ModelGatewayRequest};
use crate::prompt::{build_prompt, parse_output};

/// What one submitted input produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The inference API key is missing; nothing past the sidebar is rendered.
    Halted,
    /// Empty input; nothing to send.
    Idle,
    Answered(String),
    Failed(String),
}

/// Turns one question into an answer through format, call and parse.
///
/// Errors from the gateway are folded into [`Outcome::Failed`], so the caller
/// always gets something it can render.
pub async fn respond<G>(cfg: &Config, gateway: &G, question: &str) -> Outcome
where
    G: ModelGateway + ?Sized,
{
    if cfg.inference_api_key().is_none() {
        warn!("inference API key missing; skipping model call");
        return Outcome::Halted;
    }

    if question.trim().is_empty() {
        return Outcome::Idle;
    }

    let messages = build_prompt(&cfg.system_prompt, question);
    info!(
        model = %cfg.model,
        question_len = question.len(),
        "relaying question to model"
    );

    match gateway.chat(ModelGatewayRequest { messages }).await {
        Ok(response) => {
            let answer = parse_output(&response.content);
            info!(answer_len = answer.len(), "model answered");
            Outcome::Answered(answer)
        }
        Err(err) => {
            let message = format!("{err:#}");
            warn!(model = %cfg.model, error = %message, "model call failed");
            Outcome::Failed(message)
        }
    }
}
