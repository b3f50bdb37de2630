use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Config, GenerationParams, ModelTask};
use crate::model::Message;
use crate::prompt::render_prompt;
use crate::providers::http_errors::{model_api_request_error, model_api_status_error};

#[derive(Debug, Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    temperature: f32,
    max_length: u32,
    repetition_penalty: f32,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Generations(Vec<Generation>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

fn inference_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}",
        base_url.trim_end_matches('/'),
        model.trim_matches('/')
    )
}

impl From<GenerationParams> for InferenceParameters {
    fn from(params: GenerationParams) -> Self {
        Self {
            temperature: params.temperature,
            max_length: params.max_length,
            repetition_penalty: params.repetition_penalty,
        }
    }
}

/// Text-generation models echo the prompt ahead of the continuation.
fn strip_echoed_prompt(task: ModelTask, prompt: &str, generated: String) -> String {
    match task {
        ModelTask::TextGeneration => match generated.strip_prefix(prompt) {
            Some(rest) => rest.to_string(),
            None => generated,
        },
        ModelTask::Text2TextGeneration => generated,
    }
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

pub async fn chat(client: &Client, cfg: &Config, messages: &[Message]) -> Result<String> {
    let api_key = cfg
        .inference_api_key()
        .context("HUGGINGFACE_API_KEY is not set; refusing to call the inference API")?;
    let api_url = inference_url(&cfg.model_base_url, &cfg.model);
    let prompt = render_prompt(messages);
    let body = InferenceRequest {
        inputs: prompt.clone(),
        parameters: cfg.generation.into(),
        options: InferenceOptions {
            wait_for_model: true,
        },
    };
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        task = cfg.model_task.as_str(),
        prompt_len = prompt.len(),
        "sending inference request"
    );

    let response = client
        .post(&api_url)
        .bearer_auth(api_key)
        .timeout(Duration::from_secs(cfg.model_timeout_secs))
        .json(&body)
        .send()
        .await
        .map_err(|err| {
            warn!(
                api_url = %api_url,
                model = %cfg.model,
                error = %err,
                "inference request failed"
            );
            model_api_request_error(err, &api_url, cfg.model_timeout_secs)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %cfg.model,
            status = %status,
            response_body_len = response_body.len(),
            "inference API returned non-success status"
        );
        return Err(model_api_status_error(
            status,
            &error_detail(&response_body),
            &cfg.model,
        ));
    }

    let parsed: InferenceResponse = response
        .json()
        .await
        .context("Failed to parse inference API response")?;
    let generated = match parsed {
        InferenceResponse::Generations(generations) => generations
            .into_iter()
            .next()
            .map(|generation| generation.generated_text)
            .ok_or_else(|| anyhow!("Inference API returned no generations"))?,
        InferenceResponse::Error { error } => {
            return Err(anyhow!("Inference API returned an error: {}", error));
        }
    };
    let text = strip_echoed_prompt(cfg.model_task, &prompt, generated);
    debug!(
        model = %cfg.model,
        response_len = text.len(),
        "received inference response"
    );
    Ok(text)
}
