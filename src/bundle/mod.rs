//! Bundler entry-file generation.
//!
//! Bundlers such as webpack need one entry file that pulls in every page
//! script. This module finds those scripts by running the `webpack` provider
//! group over each template as if it were being rendered, then writes an entry
//! file that registers one function per template:
//!
//! ```text
//! // Generated on 2026-10-18 09:30 by `pagewright bundle --single bundle.js`
//! // Contains links for apps: account, homepage
//!
//! (context => {
//!   PAGEWRIGHT_CONTEXT.setTemplateFunction("homepage/index", () => {
//!     require("./homepage/scripts/base.js");
//!     require("./homepage/scripts/index.js");
//!   })
//! })(PAGEWRIGHT_CONTEXT.get());
//! ```
//!
//! Only providers exposing [`AssetProvider`](crate::provider::AssetProvider)
//! contribute; in practice that means `js_link` entries in the group.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tera::{Context as TeraContext, Tera};

use crate::config::{AppConfig, Settings};
use crate::core::PagewrightError;
use crate::provider::{ProviderGroup, ProviderRegistry, ProviderRun, WEBPACK_PROVIDERS};
use crate::template::{TemplateId, TemplateLibrary, format_tera_error};
use crate::utils::fs::{is_within, normalize_path, relative_path, safe_write, to_forward_slashes};

/// File name of per-app entry files, written to `{app}/scripts/`.
pub const ENTRY_FILE_NAME: &str = "__entry__.js";

const ENTRY_TEMPLATE: &str = r#"// Generated on {{ generated }} by `{{ command }}`
// Contains links for {{ apps_label }}: {{ app_names }}

(context => {
{%- for entry in entries %}
  PAGEWRIGHT_CONTEXT.setTemplateFunction("{{ entry.name }}", () => {
  {%- for path in entry.requires %}
    require("{{ path }}");
  {%- endfor %}
  })
{%- endfor %}
})(PAGEWRIGHT_CONTEXT.get());
"#;

/// Script files per `(app, template stem)`, each list base template first.
pub type ScriptMap = BTreeMap<(String, String), Vec<PathBuf>>;

/// What [`EntryGenerator::create_entry_file`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The file was written with this many template functions
    Written {
        path: PathBuf,
        templates: usize,
    },
    /// No script survived pruning; nothing was written
    Empty,
}

#[derive(Serialize)]
struct EntryData {
    name: String,
    requires: Vec<String>,
}

/// Generates entry files from the `webpack` provider group.
#[derive(Debug, Clone)]
pub struct EntryGenerator {
    settings: Arc<Settings>,
    library: Arc<TemplateLibrary>,
    providers: ProviderGroup,
}

impl EntryGenerator {
    pub fn new(settings: Arc<Settings>, library: Arc<TemplateLibrary>, providers: ProviderGroup) -> Self {
        Self {
            settings,
            library,
            providers,
        }
    }

    /// Loads the templates and the `webpack` group.
    ///
    /// Debug mode is forced on so script paths point into the source tree
    /// under `base_dir`, whatever the deployed setting is.
    ///
    /// # Errors
    ///
    /// Template discovery errors and unknown provider kinds
    pub fn from_settings(settings: &Settings, registry: &ProviderRegistry) -> Result<Self> {
        let mut settings = settings.clone();
        settings.debug = true;

        let library = Arc::new(TemplateLibrary::load(&settings)?);
        let providers = registry.factories(&settings, WEBPACK_PROVIDERS)?;
        if providers.is_empty() {
            tracing::warn!(target: "bundle", "No providers configured in the '{}' group", WEBPACK_PROVIDERS);
        }
        Ok(Self::new(Arc::new(settings), library, providers))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    /// Script files used by `id` and its ancestors, base first.
    ///
    /// # Errors
    ///
    /// Ancestor resolution and provider construction errors
    pub fn template_scripts(&self, id: &TemplateId) -> Result<Vec<PathBuf>> {
        let run = ProviderRun::run(self.library.as_ref(), id, &self.providers, &self.settings)?;
        Ok(run.asset_paths())
    }

    /// Maps every template of `app` that uses at least one script to its
    /// scripts.
    ///
    /// # Errors
    ///
    /// See [`template_scripts`](Self::template_scripts)
    pub fn generate_script_map(&self, app: &AppConfig) -> Result<ScriptMap> {
        let mut script_map = ScriptMap::new();
        for id in self.library.templates_for(&app.name) {
            let scripts = self.template_scripts(id)?;
            tracing::debug!(target: "bundle", "Found template: {}; scripts: {:?}", id, scripts);
            if !scripts.is_empty() {
                script_map.insert((app.name.clone(), id.stem().to_string()), scripts);
            }
        }
        Ok(script_map)
    }

    /// Writes the entry file for `script_map` to `filename`.
    ///
    /// Scripts outside the directories of `apps` are dropped first. An
    /// existing file is an error unless `overwrite` is set, in which case it
    /// is removed, even when pruning leaves nothing to write. `invocation` is
    /// the command line recorded in the header.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::EntryFileExists`] and I/O errors
    pub fn create_entry_file(
        &self,
        filename: &Path,
        script_map: &ScriptMap,
        apps: &[&AppConfig],
        overwrite: bool,
        invocation: &str,
    ) -> Result<EntryOutcome> {
        let filename = normalize_path(
            &std::path::absolute(filename)
                .with_context(|| format!("Failed to resolve path: {}", filename.display()))?,
        );

        if filename.exists() {
            if !overwrite {
                return Err(PagewrightError::EntryFileExists {
                    path: filename.display().to_string(),
                }
                .into());
            }
            std::fs::remove_file(&filename)
                .with_context(|| format!("Failed to remove existing file: {}", filename.display()))?;
        }

        let pruned = prune_to_apps(script_map, apps);
        if pruned.is_empty() {
            tracing::debug!(target: "bundle", "No scripts found for {}, skipping", filename.display());
            return Ok(EntryOutcome::Empty);
        }

        let content = render_entry(&filename, &pruned, apps, invocation)?;
        safe_write(&filename, &content)?;

        tracing::debug!(target: "bundle", "Created {} ({} templates)", filename.display(), pruned.len());
        Ok(EntryOutcome::Written {
            path: filename,
            templates: pruned.len(),
        })
    }
}

/// Default location of the entry file for one app.
pub fn app_entry_path(app: &AppConfig) -> PathBuf {
    app.scripts_dir().join(ENTRY_FILE_NAME)
}

fn prune_to_apps(script_map: &ScriptMap, apps: &[&AppConfig]) -> ScriptMap {
    script_map
        .iter()
        .filter_map(|(key, paths)| {
            let kept: Vec<PathBuf> =
                paths.iter().filter(|path| apps.iter().any(|app| is_within(&app.path, path))).cloned().collect();
            (!kept.is_empty()).then(|| (key.clone(), kept))
        })
        .collect()
}

fn render_entry(filename: &Path, script_map: &ScriptMap, apps: &[&AppConfig], invocation: &str) -> Result<String> {
    let entry_dir = filename.parent().unwrap_or_else(|| Path::new(""));

    let entries: Vec<EntryData> = script_map
        .iter()
        .map(|((app, stem), paths)| EntryData {
            name: format!("{app}/{stem}"),
            requires: paths
                .iter()
                .map(|path| format!("./{}", to_forward_slashes(&relative_path(entry_dir, path))))
                .collect(),
        })
        .collect();

    let mut app_names: Vec<&str> = apps.iter().map(|app| app.name.as_str()).collect();
    app_names.sort_unstable();

    let mut context = TeraContext::new();
    context.insert("generated", &chrono::Local::now().format("%Y-%m-%d %H:%M").to_string());
    context.insert("command", invocation);
    context.insert("apps_label", if apps.len() == 1 { "app" } else { "apps" });
    context.insert("app_names", &app_names.join(", "));
    context.insert("entries", &entries);

    let rendered = Tera::one_off(ENTRY_TEMPLATE, &context, false).map_err(|e| PagewrightError::RenderFailed {
        name: filename.display().to_string(),
        reason: format_tera_error(&e),
    })?;
    Ok(format!("{}\n", rendered.trim_end()))
}
