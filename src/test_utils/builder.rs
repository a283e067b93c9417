//! Project builder for tests
//!
//! Lays out a throwaway project with a `pagewright.toml`, app directories,
//! templates and asset files.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{AppConfig, SETTINGS_FILE_NAME, Settings};
use crate::provider::ProviderSpec;

/// A builder for test projects with a fluent API
pub struct ProjectBuilder {
    temp_dir: TempDir,
    settings: Settings,
    files: Vec<(String, String)>,
}

impl ProjectBuilder {
    /// Create a new project builder with `base_dir = "."` and debug mode on
    pub fn new() -> Result<Self> {
        let settings = Settings {
            base_dir: Some(PathBuf::from(".")),
            static_root: PathBuf::from("static"),
            debug: true,
            ..Settings::default()
        };
        Ok(Self {
            temp_dir: TempDir::new()?,
            settings,
            files: Vec::new(),
        })
    }

    /// Register an app living in the directory of the same name
    pub fn with_app(self, name: &str) -> Self {
        self.with_app_at(name, name)
    }

    /// Register an app living at `path` under the project root
    pub fn with_app_at(mut self, name: &str, path: &str) -> Self {
        self.settings.apps.push(AppConfig::new(name, path));
        self
    }

    /// The directory files for `app` are written to: its registered path, or
    /// its name when unregistered
    fn app_dir(&self, app: &str) -> String {
        self.settings
            .app(app)
            .map_or_else(|| app.to_string(), |config| config.path.display().to_string())
    }

    /// Append a provider of `kind` with default options to `group`
    pub fn with_provider(self, group: &str, kind: &str) -> Self {
        self.with_provider_spec(
            group,
            ProviderSpec {
                kind: kind.to_string(),
                ..ProviderSpec::default()
            },
        )
    }

    /// Append a fully specified provider to `group`
    pub fn with_provider_spec(mut self, group: &str, spec: ProviderSpec) -> Self {
        self.settings.providers.entry(group.to_string()).or_default().push(spec);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.settings.debug = debug;
        self
    }

    /// Edit the settings before they are written
    pub fn with_settings(mut self, edit: impl FnOnce(&mut Settings)) -> Self {
        edit(&mut self.settings);
        self
    }

    /// Add `templates/{path}` in the app's directory
    pub fn with_template(self, app: &str, path: &str, content: &str) -> Self {
        let dir = self.app_dir(app);
        self.with_file(format!("{dir}/templates/{path}"), content)
    }

    /// Add `scripts/{stem}.js` in the app's directory
    pub fn with_script(self, app: &str, stem: &str) -> Self {
        let dir = self.app_dir(app);
        self.with_file(format!("{dir}/scripts/{stem}.js"), format!("// {app}/{stem}\n"))
    }

    /// Add `styles/{stem}.css` in the app's directory
    pub fn with_style(self, app: &str, stem: &str) -> Self {
        let dir = self.app_dir(app);
        self.with_file(format!("{dir}/styles/{stem}.css"), format!("/* {app}/{stem} */\n"))
    }

    /// Add a file relative to the project root
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Write everything to disk
    pub fn build(self) -> Result<TestProject> {
        let root = self.temp_dir.path().to_path_buf();

        for app in &self.settings.apps {
            std::fs::create_dir_all(root.join(&app.path))?;
        }
        for (path, content) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full_path, content)?;
        }

        let settings_path = root.join(SETTINGS_FILE_NAME);
        std::fs::write(&settings_path, toml::to_string_pretty(&self.settings)?)?;

        Ok(TestProject {
            _temp_dir: self.temp_dir,
            root,
            settings_path,
        })
    }
}

/// A built test project
pub struct TestProject {
    _temp_dir: TempDir, // Keep temp dir alive
    root: PathBuf,
    settings_path: PathBuf,
}

impl TestProject {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Absolute path of a project-relative file
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Parse the written settings, resolving paths against the project root
    pub fn settings(&self) -> Result<Settings> {
        let content = std::fs::read_to_string(&self.settings_path)?;
        Settings::from_toml_str(&content, &self.root)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path(relative))?)
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}
