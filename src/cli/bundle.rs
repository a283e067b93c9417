//! Bundler entry-file generation command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::GlobalOptions;
use crate::bundle::{EntryGenerator, EntryOutcome, ScriptMap, app_entry_path};
use crate::config::{AppConfig, Settings};
use crate::core::PagewrightError;
use crate::provider::ProviderRegistry;
use crate::utils::fs::relative_path;

/// Generate bundler entry files that register each template's scripts.
///
/// Scripts are found by running the `webpack` provider group over every
/// template of the selected apps, the same way rendering would. Without
/// `--single`, each app gets `{app}/scripts/__entry__.js` listing only its own
/// scripts. With `--single`, one file covers all selected apps.
///
/// # Examples
///
/// ```bash
/// pagewright bundle
/// pagewright bundle homepage
/// pagewright bundle --overwrite --single static/bundle.js
/// ```
#[derive(Args, Debug)]
pub struct BundleCommand {
    /// Replace entry files left by a previous run
    #[arg(long)]
    pub overwrite: bool,

    /// Write one entry file for all selected apps instead of one per app
    #[arg(long, value_name = "FILENAME")]
    pub single: Option<PathBuf>,

    /// Apps to process (default: every registered app)
    #[arg(value_name = "APPNAME")]
    pub appname: Vec<String>,
}

impl BundleCommand {
    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Invalid settings, unknown app names, an existing entry file without
    /// `--overwrite`, and provider or I/O failures
    pub async fn execute_with_options(self, options: &GlobalOptions) -> Result<()> {
        let settings = options.load_settings().await?;
        let apps = self.selected_apps(&settings)?;
        if apps.is_empty() {
            if !options.quiet {
                println!("{}", "No apps registered; nothing to bundle".yellow());
            }
            return Ok(());
        }

        let generator = Arc::new(EntryGenerator::from_settings(&settings, &ProviderRegistry::with_builtins())?);
        let scanned = scan_apps(&generator, &apps, options.quiet).await?;
        let invocation = std::env::args().collect::<Vec<_>>().join(" ");
        let base_dir = settings.base_dir()?;

        match &self.single {
            None => {
                // Nothing is written while any target already exists
                if !self.overwrite {
                    if let Some(existing) =
                        scanned.iter().map(|(app, _)| app_entry_path(app)).find(|path| path.exists())
                    {
                        return Err(PagewrightError::EntryFileExists {
                            path: existing.display().to_string(),
                        }
                        .into());
                    }
                }
                for (app, script_map) in &scanned {
                    let outcome = generator.create_entry_file(
                        &app_entry_path(app),
                        script_map,
                        &[app],
                        self.overwrite,
                        &invocation,
                    )?;
                    report(&outcome, base_dir, options.quiet);
                }
            }
            Some(filename) => {
                let mut script_map = ScriptMap::new();
                for (_, app_map) in &scanned {
                    script_map.extend(app_map.iter().map(|(key, paths)| (key.clone(), paths.clone())));
                }
                let apps: Vec<&AppConfig> = scanned.iter().map(|(app, _)| app).collect();
                let outcome =
                    generator.create_entry_file(filename, &script_map, &apps, self.overwrite, &invocation)?;
                report(&outcome, base_dir, options.quiet);
            }
        }
        Ok(())
    }

    /// The apps named on the command line, or all registered apps.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::UnknownApp`](crate::core::PagewrightError::UnknownApp)
    /// for a name that is not registered
    pub fn selected_apps(&self, settings: &Settings) -> Result<Vec<AppConfig>> {
        if self.appname.is_empty() {
            return Ok(settings.apps.clone());
        }
        self.appname.iter().map(|name| settings.require_app(name).cloned()).collect()
    }
}

/// Builds each app's script map on the blocking pool, in parallel.
async fn scan_apps(
    generator: &Arc<EntryGenerator>,
    apps: &[AppConfig],
    quiet: bool,
) -> Result<Vec<(AppConfig, ScriptMap)>> {
    let tasks = apps.iter().cloned().map(|app| {
        let generator = Arc::clone(generator);
        tokio::task::spawn_blocking(move || {
            let script_map = generator.generate_script_map(&app)?;
            Ok::<_, anyhow::Error>((app, script_map))
        })
    });

    let results = try_join_all(tasks).await.context("Script scan task failed")?;
    let scanned = results.into_iter().collect::<Result<Vec<_>>>()?;

    if !quiet {
        for (app, script_map) in &scanned {
            println!("Searched {} app: {} templates with scripts", app.name.cyan(), script_map.len());
        }
    }
    Ok(scanned)
}

fn report(outcome: &EntryOutcome, base_dir: &Path, quiet: bool) {
    if quiet {
        return;
    }
    match outcome {
        EntryOutcome::Written {
            path,
            templates,
        } => {
            println!(
                "{} Created {} ({} templates)",
                "✓".green(),
                relative_path(base_dir, path).display(),
                templates
            );
        }
        EntryOutcome::Empty => println!("{}", "No scripts found; no entry file written".yellow()),
    }
}
