use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::model_gateway::ModelGateway;
use crate::page;
use crate::relay;

pub async fn run_repl(cfg: &Config, gateway: &dyn ModelGateway) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_repl_with(cfg, gateway, stdin.lock(), stdout.lock()).await
}

async fn run_repl_with<R, W>(
    cfg: &Config,
    gateway: &dyn ModelGateway,
    mut input: R,
    mut output: W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{}", page::TITLE).context("Failed to write to stdout")?;
    writeln!(output, "{}", page::render_sidebar(&cfg.status()))
        .context("Failed to write to stdout")?;

    if cfg.inference_api_key().is_none() {
        writeln!(output, "{}", page::MISSING_KEY_HELP).context("Failed to write to stdout")?;
        return Ok(());
    }

    writeln!(output, "model: {}", cfg.model).context("Failed to write to stdout")?;
    writeln!(output, "type a question, or 'exit' to quit").context("Failed to write to stdout")?;

    loop {
        write!(output, "{} ", page::INPUT_LABEL).context("Failed to write to stdout")?;
        output.flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .context("Failed to read stdin")?;
        if read == 0 {
            break;
        }

        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        if question.is_empty() {
            continue;
        }

        writeln!(output, "{}", page::SPINNER_TEXT).context("Failed to write to stdout")?;
        let outcome = relay::respond(cfg, gateway, question).await;
        if let Some(text) = page::render_outcome(&outcome) {
            writeln!(output, "{}\n", text).context("Failed to write to stdout")?;
        }
    }

    Ok(())
}
