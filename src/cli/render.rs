//! Render a single template from the command line.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tera::Context as TeraContext;

use super::GlobalOptions;
use crate::provider::ProviderRegistry;
use crate::template::{TemplateId, TemplateRenderer};
use crate::utils::fs::safe_write;

/// Render a template through the full provider pipeline.
///
/// Stylesheets are compiled and links collected exactly as they would be for
/// a request, which makes this handy for checking provider configuration.
///
/// # Examples
///
/// ```bash
/// pagewright render homepage/index.html
/// pagewright render account/login.html --context login.json --var next=/account/ --output login.html
/// ```
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Template to render, as `app/path`
    #[arg(value_name = "APP/TEMPLATE")]
    pub template: String,

    /// JSON file whose top-level object becomes the template context
    #[arg(long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Context variable for the template (repeatable, applied after `--context`)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Write the HTML to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl RenderCommand {
    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Invalid settings, an unknown template, and provider or render failures
    pub async fn execute_with_options(self, options: &GlobalOptions) -> Result<()> {
        let settings = Arc::new(options.load_settings().await?);
        let id = TemplateId::parse(&self.template)?;
        let context = self.context().await?;

        let html = tokio::task::spawn_blocking(move || -> Result<String> {
            let renderer = TemplateRenderer::from_settings(settings, &ProviderRegistry::with_builtins())?;
            renderer.render(&id, &context)
        })
        .await
        .context("Render task failed")??;

        match &self.output {
            Some(path) => safe_write(path, &html)?,
            None => println!("{html}"),
        }
        Ok(())
    }

    /// The template context: `--context` file contents overlaid with `--var` pairs.
    ///
    /// # Errors
    ///
    /// An unreadable context file, or one that is not a JSON object
    pub async fn context(&self) -> Result<TeraContext> {
        let mut context = match &self.context {
            Some(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read context file {}", path.display()))?;
                let value: serde_json::Value = serde_json::from_str(&content)
                    .with_context(|| format!("Invalid JSON in {}", path.display()))?;
                TeraContext::from_value(value)
                    .with_context(|| format!("Context file {} must hold a JSON object", path.display()))?
            }
            None => TeraContext::new(),
        };
        for (key, value) in &self.vars {
            context.insert(key, value);
        }
        Ok(context)
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
