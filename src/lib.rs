pub mod config;
pub mod langsmith;
pub mod logging;
pub mod model;
pub mod model_gateway;
pub mod page;
pub mod prompt;
pub mod providers;
pub mod relay;
pub mod repl;
pub mod web;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use std::env;
use std::sync::Arc;
use tracing::info;

use config::{Config, Interface};
use model_gateway::{HostModelGateway, ModelGateway};
use relay::Outcome;
use repl::run_repl;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cfg = Arc::new(Config::from_env());
    info!(
        provider = %cfg.model_provider,
        model = %cfg.model,
        task = cfg.model_task.as_str(),
        interface = cfg.interface.as_str(),
        inference_key_present = cfg.inference_api_key().is_some(),
        tracing_enabled = cfg.tracing_enabled(),
        project = %cfg.langchain_project,
        "loaded runtime configuration"
    );

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;
    let gateway = Arc::new(HostModelGateway::new(client, Arc::clone(&cfg)));

    let args: Vec<String> = env::args().skip(1).collect();
    if !args.is_empty() {
        return ask_once(&cfg, gateway.as_ref(), &args.join(" ")).await;
    }

    let interface = cfg.interface;
    match interface {
        Interface::Web => web::serve(cfg, gateway).await,
        Interface::Repl => run_repl(&cfg, gateway.as_ref()).await,
    }
}

/// Answers a question passed on the command line. Panels go to stderr and
/// the process exits non-zero when no answer was produced.
async fn ask_once(cfg: &Config, gateway: &dyn ModelGateway, question: &str) -> Result<()> {
    let outcome = relay::respond(cfg, gateway, question).await;
    match &outcome {
        Outcome::Answered(answer) => {
            println!("{answer}");
            Ok(())
        }
        Outcome::Idle => Ok(()),
        Outcome::Halted => {
            eprintln!("{}", page::render_sidebar(&cfg.status()));
            eprintln!("{}", page::MISSING_KEY_HELP);
            bail!("{} is not set", config::HUGGINGFACE_API_KEY_VAR)
        }
        Outcome::Failed(message) => {
            eprintln!("{}", page::render_suggestions());
            bail!("{}", message)
        }
    }
}
