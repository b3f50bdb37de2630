use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::Config;
use crate::langsmith::{self, RunRecord};
use crate::model::{self, Message};

pub struct ModelGatewayRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGatewayResponse {
    pub content: String,
}

pub type ModelGatewayFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ModelGatewayResponse>> + Send + 'a>>;

/// Seam between the relay and whatever answers the prompt.
pub trait ModelGateway: Send + Sync {
    fn chat<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a>;
}

type ModelChatFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

trait ChatBackend {
    fn chat<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        messages: &'a [Message],
    ) -> ModelChatFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderChatBackend;

impl ChatBackend for ProviderChatBackend {
    fn chat<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        messages: &'a [Message],
    ) -> ModelChatFuture<'a> {
        Box::pin(async move { model::chat(client, cfg, messages).await })
    }
}

/// Calls the configured provider and, when a tracing key is present, reports
/// each call as a LangSmith run.
pub struct HostModelGateway<B = ProviderChatBackend> {
    client: Client,
    cfg: Arc<Config>,
    backend: B,
}

impl HostModelGateway<ProviderChatBackend> {
    pub fn new(client: Client, cfg: Arc<Config>) -> Self {
        Self {
            client,
            cfg,
            backend: ProviderChatBackend,
        }
    }
}

impl<B> HostModelGateway<B> {
    #[cfg(test)]
    fn with_backend(client: Client, cfg: Arc<Config>, backend: B) -> Self {
        Self {
            client,
            cfg,
            backend,
        }
    }
}

impl<B> ModelGateway for HostModelGateway<B>
where
    B: ChatBackend + Send + Sync,
{
    fn chat<'b>(&'b self, request: ModelGatewayRequest) -> ModelGatewayFuture<'b> {
        Box::pin(async move {
            let started_at = Utc::now();
            let result = self
                .backend
                .chat(&self.client, &self.cfg, &request.messages)
                .await;

            if self.cfg.tracing_enabled() {
                let record = RunRecord::new(
                    &self.cfg,
                    &request.messages,
                    result.as_ref().map(String::as_str),
                    started_at,
                    Utc::now(),
                );
                langsmith::submit_run(&self.client, &self.cfg, &record).await;
            }

            let content = result?;
            Ok(ModelGatewayResponse { content })
        })
    }
}
