//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - run: translate a single piece of text
//! - batch: translate a file line by line
//! - config show / validate: inspect the loaded configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::cascade::{is_failure_sentinel, TranslationRequest, Translator};
use crate::config::Config;
use crate::relay::HttpRelay;
use crate::scheduler::BatchScheduler;
use sdk::relay::Relay;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Build a translator wired to the configured HTTP backend.
fn build_translator(config: &Config) -> Arc<Translator> {
    let relay: Arc<dyn Relay> = Arc::new(HttpRelay::new(config.backend.url.clone()));
    Arc::new(Translator::new(relay, config))
}

/// Instructions for a request: the explicit flag wins, the configured
/// default fills in otherwise.
fn resolve_instructions(explicit: Option<String>, config: &Config) -> String {
    explicit.unwrap_or_else(|| config.translation.default_instructions.clone())
}

/// Translate one piece of text and print the result.
pub async fn handle_run(
    text: String,
    context: Option<String>,
    instructions: Option<String>,
    no_conversation: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let translator = build_translator(config);

    let mut request = TranslationRequest::new(text.clone())
        .with_instructions(resolve_instructions(instructions, config));
    if let Some(context) = context {
        request = request.with_context(context);
    }
    if no_conversation {
        request = request.without_conversation();
    }

    let translation = translator.translate(&request).await;
    if is_failure_sentinel(&translation) {
        tracing::warn!("All strategies exhausted for the given text");
    }

    match format {
        OutputFormat::Text => println!("{}", translation),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "source": text,
                "translation": translation,
            }))?
        ),
    }
    Ok(())
}

/// Translate a file line by line, preserving blank lines.
pub async fn handle_batch(
    file: &Path,
    instructions: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read input file {:?}", file))?;
    let lines: Vec<&str> = contents.lines().collect();
    let items: Vec<String> = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect();

    let translator = build_translator(config);
    let scheduler = BatchScheduler::new(translator, config);
    let instructions = resolve_instructions(instructions, config);
    let translated = scheduler.run(items, &instructions).await;

    let output = restore_blank_lines(&lines, translated);
    match format {
        OutputFormat::Text => {
            for line in &output {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            let pairs: Vec<_> = lines
                .iter()
                .zip(&output)
                .map(|(source, translation)| json!({ "source": source, "translation": translation }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&pairs)?);
        }
    }
    Ok(())
}

/// Re-interleave translations with the blank lines of the original file so
/// the output stays line-aligned with the input.
fn restore_blank_lines(lines: &[&str], translated: Vec<String>) -> Vec<String> {
    let mut translated = translated.into_iter();
    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                translated.next().unwrap_or_default()
            }
        })
        .collect()
}

/// Print the loaded configuration.
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
            println!("{}", rendered);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Validate the loaded configuration.
pub fn handle_config_validate(config: &Config) -> Result<()> {
    config.validate()?;
    println!("Configuration is valid.");
    Ok(())
}
