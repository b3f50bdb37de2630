use std::env;

const DEFAULT_MODEL_PROVIDER: &str = "huggingface";
const DEFAULT_MODEL: &str = "google/flan-t5-small";
const DEFAULT_MODEL_BASE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LANGCHAIN_PROJECT: &str = "insurance-bot";
const DEFAULT_LANGSMITH_ENDPOINT: &str = "https://api.smith.langchain.com";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant which helps with advising insurance policies. Please respond to the question asked";

pub const HUGGINGFACE_API_KEY_VAR: &str = "HUGGINGFACE_API_KEY";
pub const LANGCHAIN_API_KEY_VAR: &str = "LANGCHAIN_API_KEY";
pub const LANGCHAIN_PROJECT_VAR: &str = "LANGCHAIN_PROJECT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTask {
    Text2TextGeneration,
    TextGeneration,
}

impl ModelTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text2TextGeneration => "text2text-generation",
            Self::TextGeneration => "text-generation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    Web,
    Repl,
}

impl Interface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Repl => "repl",
        }
    }
}

/// Sampling parameters sent with every inference request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_length: u32,
    pub repetition_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_length: 128,
            repetition_penalty: 1.2,
        }
    }
}

/// Presence flags shown in the sidebar. Values themselves are never exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStatus {
    pub entries: Vec<(&'static str, bool)>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub huggingface_api_key: Option<String>,
    pub langchain_api_key: Option<String>,
    pub langchain_project: String,
    pub model_provider: String,
    pub model: String,
    pub model_task: ModelTask,
    pub model_base_url: String,
    pub model_timeout_secs: u64,
    pub generation: GenerationParams,
    pub system_prompt: String,
    pub langsmith_endpoint: String,
    pub interface: Interface,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub(crate) fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let model_timeout_secs = parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref());
        let model_task = parse_model_task(get_var("MODEL_TASK").as_deref());
        let interface = parse_interface(get_var("BOT_INTERFACE").as_deref());

        Self {
            huggingface_api_key: non_empty(get_var(HUGGINGFACE_API_KEY_VAR)),
            langchain_api_key: non_empty(get_var(LANGCHAIN_API_KEY_VAR)),
            langchain_project: get_var(LANGCHAIN_PROJECT_VAR)
                .unwrap_or_else(|| DEFAULT_LANGCHAIN_PROJECT.to_string()),
            model_provider: get_var("MODEL_PROVIDER")
                .unwrap_or_else(|| DEFAULT_MODEL_PROVIDER.to_string()),
            model: get_var("MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_task,
            model_base_url: get_var("MODEL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
            model_timeout_secs,
            generation: GenerationParams::default(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            langsmith_endpoint: get_var("LANGCHAIN_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_LANGSMITH_ENDPOINT.to_string()),
            interface,
            bind_addr: get_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    pub fn inference_api_key(&self) -> Option<&str> {
        self.huggingface_api_key.as_deref()
    }

    pub fn tracing_enabled(&self) -> bool {
        self.langchain_api_key.is_some()
    }

    pub fn status(&self) -> ConfigStatus {
        ConfigStatus {
            entries: vec![
                (HUGGINGFACE_API_KEY_VAR, self.huggingface_api_key.is_some()),
                (LANGCHAIN_API_KEY_VAR, self.langchain_api_key.is_some()),
                (LANGCHAIN_PROJECT_VAR, !self.langchain_project.is_empty()),
            ],
        }
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_model_timeout_secs(raw: Option<&str>) -> u64 {
    parse_positive_u64(raw, DEFAULT_MODEL_TIMEOUT_SECS)
}

fn parse_model_task(raw: Option<&str>) -> ModelTask {
    match raw
        .unwrap_or("text2text-generation")
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "text-generation" => ModelTask::TextGeneration,
        _ => ModelTask::Text2TextGeneration,
    }
}

fn parse_interface(raw: Option<&str>) -> Interface {
    match raw.unwrap_or("web").trim().to_ascii_lowercase().as_str() {
        "repl" => Interface::Repl,
        _ => Interface::Web,
    }
}

#[cfg(test)]
pub(crate) fn config_from_pairs(pairs: &[(&str, &str)]) -> Config {
    use std::collections::HashMap;

    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    Config::from_env_with(|key| vars.get(key).cloned())
}
