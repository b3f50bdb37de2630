use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::model_gateway::ModelGateway;
use crate::page::{self, FALLBACK_MODELS, FALLBACK_PROVIDERS};
use crate::relay::{self, Outcome};

const PAGE_TEMPLATE: &str = "page.html";

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<Config>,
    gateway: Arc<dyn ModelGateway>,
    templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, gateway: Arc<dyn ModelGateway>) -> Result<Self> {
        let mut templates = Environment::new();
        templates
            .add_template(PAGE_TEMPLATE, include_str!("../templates/page.html"))
            .context("Failed to load page template")?;
        Ok(Self {
            cfg,
            gateway,
            templates: Arc::new(templates),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    #[serde(default)]
    question: String,
}

#[derive(Debug, Serialize)]
struct StatusView {
    name: &'static str,
    label: &'static str,
}

struct PageError(anyhow::Error);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        error!(error = %format!("{:#}", self.0), "failed to render page");
        (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
    }
}

impl From<minijinja::Error> for PageError {
    fn from(err: minijinja::Error) -> Self {
        Self(err.into())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "insurance-bot" }))
}

/// One page render per submitted question.
async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, PageError> {
    let outcome = relay::respond(&state.cfg, state.gateway.as_ref(), &query.question).await;

    let statuses: Vec<StatusView> = page::status_lines(&state.cfg.status())
        .into_iter()
        .map(|line| StatusView {
            name: line.name,
            label: page::presence_label(line.present),
        })
        .collect();
    let (answer, error) = match &outcome {
        Outcome::Answered(answer) => (Some(answer.as_str()), None),
        Outcome::Failed(message) => (None, Some(page::error_heading(message))),
        Outcome::Halted | Outcome::Idle => (None, None),
    };

    let template = state.templates.get_template(PAGE_TEMPLATE)?;
    let html = template.render(context! {
        title => page::TITLE,
        statuses => statuses,
        halted => outcome == Outcome::Halted,
        help => page::MISSING_KEY_HELP,
        input_label => page::INPUT_LABEL,
        spinner_text => page::SPINNER_TEXT,
        question => query.question,
        answer => answer,
        error => error,
        fallback_models => FALLBACK_MODELS,
        fallback_providers => FALLBACK_PROVIDERS,
    })?;
    Ok(Html(html))
}

pub async fn serve(cfg: Arc<Config>, gateway: Arc<dyn ModelGateway>) -> Result<()> {
    let state = AppState::new(Arc::clone(&cfg), gateway)?;
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind BIND_ADDR='{}'", cfg.bind_addr))?;
    let addr = listener
        .local_addr()
        .context("Failed to read bound address")?;
    info!(addr = %addr, "serving insurance bot on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down web server");
        })
        .await
        .context("Web server failed")
}
