//! Run tracing for LangSmith. Enabled by the presence of `LANGCHAIN_API_KEY`;
//! reporting is best effort and never changes the answer shown to the user.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::model::Message;
use crate::prompt::render_prompt;

const RUN_NAME: &str = "HuggingFaceHub";
const SUBMIT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub name: &'static str,
    pub run_type: &'static str,
    pub inputs: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub session_name: String,
    pub extra: Value,
}

impl RunRecord {
    pub fn new(
        cfg: &Config,
        messages: &[Message],
        result: Result<&str, &anyhow::Error>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let (outputs, error) = match result {
            Ok(text) => (Some(json!({ "generations": [[{ "text": text }]] })), None),
            Err(err) => (None, Some(format!("{err:#}"))),
        };

        Self {
            id: Uuid::new_v4(),
            name: RUN_NAME,
            run_type: "llm",
            inputs: json!({ "prompts": [render_prompt(messages)] }),
            outputs,
            error,
            start_time: started_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            end_time: ended_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            session_name: cfg.langchain_project.clone(),
            extra: json!({
                "invocation_params": {
                    "repo_id": cfg.model,
                    "task": cfg.model_task.as_str(),
                    "temperature": cfg.generation.temperature,
                    "max_length": cfg.generation.max_length,
                    "repetition_penalty": cfg.generation.repetition_penalty,
                }
            }),
        }
    }
}

fn runs_url(endpoint: &str) -> String {
    format!("{}/runs", endpoint.trim_end_matches('/'))
}

/// Posts `record`; failures are logged and swallowed.
pub async fn submit_run(client: &Client, cfg: &Config, record: &RunRecord) {
    let Some(api_key) = cfg.langchain_api_key.as_deref() else {
        return;
    };
    let url = runs_url(&cfg.langsmith_endpoint);

    let result = client
        .post(&url)
        .header("x-api-key", api_key)
        .timeout(Duration::from_secs(SUBMIT_TIMEOUT_SECS))
        .json(record)
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            debug!(run_id = %record.id, project = %record.session_name, "submitted trace run");
        }
        Ok(response) => {
            warn!(
                run_id = %record.id,
                status = %response.status(),
                "trace endpoint rejected run"
            );
        }
        Err(err) => {
            warn!(run_id = %record.id, url = %url, error = %err, "failed to submit trace run");
        }
    }
}
