//! Project settings loaded from `pagewright.toml`.
//!
//! # File Format
//!
//! ```toml
//! base_dir = "."
//! static_root = "static"
//! static_url = "/static/"
//! debug = false
//! default_app = "homepage"
//! default_page = "index"
//! max_redirects = 20
//! command_timeout_secs = 60
//!
//! [[apps]]
//! name = "homepage"
//! path = "homepage"
//!
//! [[providers.template]]
//! kind = "compile_scss"
//!
//! [[providers.template]]
//! kind = "css_link"
//!
//! [[providers.webpack]]
//! kind = "js_link"
//! ```
//!
//! Relative `base_dir` and `static_root` values resolve against the directory
//! containing the settings file. App paths resolve against `base_dir`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::core::PagewrightError;
use crate::provider::ProviderSpec;
use crate::utils::fs::{is_within, normalize_path, relative_path, to_forward_slashes};

/// Default settings file name, looked up in the current directory.
pub const SETTINGS_FILE_NAME: &str = "pagewright.toml";

/// Environment variable naming an explicit settings file.
pub const SETTINGS_ENV_VAR: &str = "PAGEWRIGHT_SETTINGS";

/// Environment variable forcing debug mode on (`1`, `true`, `yes`) or off.
pub const DEBUG_ENV_VAR: &str = "PAGEWRIGHT_DEBUG";

fn default_static_root() -> PathBuf {
    PathBuf::from("static")
}

fn default_static_url() -> String {
    "/static/".to_string()
}

fn default_app() -> String {
    "homepage".to_string()
}

fn default_page() -> String {
    "index".to_string()
}

const fn default_max_redirects() -> usize {
    20
}

/// A registered application: a named directory holding `templates/`,
/// `styles/` and `scripts/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// App name, the first segment of URLs and template names
    pub name: String,
    /// App directory; defaults to `<base_dir>/<name>`
    #[serde(default)]
    pub path: PathBuf,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.path.join("templates")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.path.join("scripts")
    }
}

/// Project settings.
///
/// Construct with [`Settings::load_from`] or [`Settings::from_toml_str`]; both
/// resolve relative paths. `Default` gives an unconfigured project with no
/// `base_dir`, which [`Settings::validate`] rejects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Project root. Source assets live here and are served from here in debug mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,

    /// Collected static files, used instead of `base_dir` outside debug mode.
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,

    /// URL prefix for emitted asset links.
    #[serde(default = "default_static_url")]
    pub static_url: String,

    #[serde(default)]
    pub debug: bool,

    /// App used when a URL does not start with a registered app name.
    #[serde(default = "default_app")]
    pub default_app: String,

    /// Page (module) used when a URL names no page.
    #[serde(default = "default_page")]
    pub default_page: String,

    /// Upper bound on chained internal redirects for one request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Kill compiler commands that run longer than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    #[serde(default)]
    pub apps: Vec<AppConfig>,

    /// Provider groups by name (`template`, `webpack`, ...), each an ordered list.
    #[serde(default)]
    pub providers: BTreeMap<String, Vec<ProviderSpec>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: None,
            static_root: default_static_root(),
            static_url: default_static_url(),
            debug: false,
            default_app: default_app(),
            default_page: default_page(),
            max_redirects: default_max_redirects(),
            command_timeout_secs: None,
            apps: Vec::new(),
            providers: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from an optional path.
    ///
    /// Lookup order: `path`, then `$PAGEWRIGHT_SETTINGS`, then
    /// `./pagewright.toml`. A missing file yields default settings (which fail
    /// [`validate`](Self::validate) for lack of a `base_dir`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = path
            .or_else(|| std::env::var_os(SETTINGS_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME));

        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            let mut settings = Self::default();
            settings.apply_env_overrides();
            Ok(settings)
        }
    }

    /// Load settings from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let mut settings = Self::from_toml_str(&content, &root)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Parse settings from TOML, resolving relative paths against `root`.
    ///
    /// Environment overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or names unknown keys
    pub fn from_toml_str(content: &str, root: &Path) -> Result<Self> {
        let mut settings: Self = toml::from_str(content).map_err(PagewrightError::from)?;
        settings.resolve_paths(root);
        Ok(settings)
    }

    /// Make `base_dir`, `static_root` and app paths absolute.
    pub fn resolve_paths(&mut self, root: &Path) {
        let base_dir = self.base_dir.as_ref().map(|dir| normalize_path(&root.join(dir)));
        self.static_root = normalize_path(&root.join(&self.static_root));

        let app_root = base_dir.clone().unwrap_or_else(|| root.to_path_buf());
        for app in &mut self.apps {
            let relative = if app.path.as_os_str().is_empty() {
                PathBuf::from(&app.name)
            } else {
                app.path.clone()
            };
            app.path = normalize_path(&app_root.join(relative));
        }
        self.base_dir = base_dir;
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(DEBUG_ENV_VAR) {
            self.debug = matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
            tracing::debug!("{} overrides debug = {}", DEBUG_ENV_VAR, self.debug);
        }
    }

    /// Checks that `base_dir` is set and is an existing directory, and that
    /// app names are unique.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::MissingBaseDir`], [`PagewrightError::InvalidBaseDir`]
    /// or [`PagewrightError::DuplicateApp`]
    pub fn validate(&self) -> Result<()> {
        let base_dir = self.base_dir()?;
        if !base_dir.is_dir() {
            return Err(PagewrightError::InvalidBaseDir {
                path: base_dir.display().to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        if let Some(app) = self.apps.iter().find(|app| !seen.insert(app.name.as_str())) {
            return Err(PagewrightError::DuplicateApp {
                name: app.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// The project root.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::MissingBaseDir`] when unset
    pub fn base_dir(&self) -> Result<&Path> {
        self.base_dir.as_deref().ok_or_else(|| PagewrightError::MissingBaseDir.into())
    }

    /// Directory that relative asset paths are joined to: `base_dir` in debug
    /// mode, `static_root` otherwise.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::MissingBaseDir`] in debug mode without a `base_dir`
    pub fn asset_root(&self) -> Result<&Path> {
        if self.debug { self.base_dir() } else { Ok(&self.static_root) }
    }

    /// Where an app's assets live relative to either asset root: its path
    /// under `base_dir`, or its name when the app lives elsewhere.
    pub fn app_asset_dir(&self, app: &AppConfig) -> String {
        let relative = match self.base_dir.as_deref() {
            Some(base_dir) if is_within(base_dir, &app.path) => relative_path(base_dir, &app.path),
            _ => PathBuf::new(),
        };
        if relative.as_os_str().is_empty() {
            app.name.clone()
        } else {
            to_forward_slashes(&relative)
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn app(&self, name: &str) -> Option<&AppConfig> {
        self.apps.iter().find(|app| app.name == name)
    }

    pub fn is_app(&self, name: &str) -> bool {
        self.app(name).is_some()
    }

    /// Looks up a registered app.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::UnknownApp`] if no app has this name
    pub fn require_app(&self, name: &str) -> Result<&AppConfig> {
        self.app(name).ok_or_else(|| {
            PagewrightError::UnknownApp {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Provider specs configured for `group`; empty when the group is absent.
    pub fn provider_specs(&self, group: &str) -> &[ProviderSpec] {
        self.providers.get(group).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
base_dir = "project"
static_url = "/assets/"
command_timeout_secs = 30

[[apps]]
name = "homepage"

[[apps]]
name = "account"
path = "apps/account"

[[providers.template]]
kind = "compile_scss"

[[providers.template]]
kind = "css_link"
skip_duplicates = false

[[providers.webpack]]
kind = "js_link"
filepath = "{app}/scripts/{template}.js"
"#;

    #[test]
    fn test_from_toml_resolves_paths() {
        let settings = Settings::from_toml_str(SAMPLE, Path::new("/srv/site")).unwrap();

        assert_eq!(settings.base_dir().unwrap(), Path::new("/srv/site/project"));
        assert_eq!(settings.static_root, PathBuf::from("/srv/site/static"));
        assert_eq!(settings.static_url, "/assets/");
        assert_eq!(settings.app("homepage").unwrap().path, PathBuf::from("/srv/site/project/homepage"));
        assert_eq!(settings.app("account").unwrap().path, PathBuf::from("/srv/site/project/apps/account"));
        assert_eq!(settings.command_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml_str("", Path::new("/srv")).unwrap();

        assert!(settings.base_dir.is_none());
        assert!(!settings.debug);
        assert_eq!(settings.default_app, "homepage");
        assert_eq!(settings.default_page, "index");
        assert_eq!(settings.max_redirects, 20);
        assert_eq!(settings.static_url, "/static/");
        assert!(settings.provider_specs("template").is_empty());
    }

    #[test]
    fn test_provider_groups_keep_order() {
        let settings = Settings::from_toml_str(SAMPLE, Path::new("/srv")).unwrap();

        let kinds: Vec<&str> =
            settings.provider_specs("template").iter().map(|spec| spec.kind.as_str()).collect();
        assert_eq!(kinds, vec!["compile_scss", "css_link"]);
        assert_eq!(settings.provider_specs("template")[1].skip_duplicates, Some(false));
        assert_eq!(
            settings.provider_specs("webpack")[0].filepath.as_deref(),
            Some("{app}/scripts/{template}.js")
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Settings::from_toml_str("base_dirr = \".\"", Path::new("/srv")).unwrap_err();
        assert!(matches!(err.downcast_ref::<PagewrightError>(), Some(PagewrightError::TomlError(_))));
    }

    #[test]
    fn test_validate_base_dir() {
        let settings = Settings::default();
        assert!(matches!(
            settings.validate().unwrap_err().downcast_ref::<PagewrightError>(),
            Some(PagewrightError::MissingBaseDir)
        ));

        let temp = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.base_dir = Some(temp.path().join("missing"));
        assert!(matches!(
            settings.validate().unwrap_err().downcast_ref::<PagewrightError>(),
            Some(PagewrightError::InvalidBaseDir { .. })
        ));

        settings.base_dir = Some(temp.path().to_path_buf());
        settings.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_duplicate_apps() {
        let temp = TempDir::new().unwrap();
        let content = "base_dir = \".\"\n[[apps]]\nname = \"account\"\n[[apps]]\nname = \"account\"\npath = \"legacy/account\"\n";
        let settings = Settings::from_toml_str(content, temp.path()).unwrap();

        assert!(matches!(
            settings.validate().unwrap_err().downcast_ref::<PagewrightError>(),
            Some(PagewrightError::DuplicateApp { name }) if name == "account"
        ));
    }

    #[test]
    fn test_app_asset_dir_follows_app_path() {
        let settings = Settings::from_toml_str(SAMPLE, Path::new("/srv")).unwrap();
        assert_eq!(settings.app_asset_dir(settings.app("homepage").unwrap()), "homepage");
        assert_eq!(settings.app_asset_dir(settings.app("account").unwrap()), "apps/account");

        let outside = AppConfig::new("vendor", "/opt/vendor");
        assert_eq!(settings.app_asset_dir(&outside), "vendor");
    }

    #[test]
    fn test_asset_root_follows_debug() {
        let mut settings = Settings::from_toml_str(SAMPLE, Path::new("/srv")).unwrap();
        assert_eq!(settings.asset_root().unwrap(), Path::new("/srv/static"));

        settings.debug = true;
        assert_eq!(settings.asset_root().unwrap(), Path::new("/srv/project"));
    }

    #[test]
    fn test_require_app() {
        let settings = Settings::from_toml_str(SAMPLE, Path::new("/srv")).unwrap();
        assert!(settings.is_app("account"));
        assert!(matches!(
            settings.require_app("blog").unwrap_err().downcast_ref::<PagewrightError>(),
            Some(PagewrightError::UnknownApp { name }) if name == "blog"
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, SAMPLE).unwrap();

        let settings = Settings::load_from(&path).await.unwrap();
        assert_eq!(settings.base_dir().unwrap(), normalize_path(&temp.path().join("project")));
        assert_eq!(settings.apps.len(), 2);
    }

    #[tokio::test]
    async fn test_load_with_optional_missing_file() {
        let temp = TempDir::new().unwrap();
        let settings =
            Settings::load_with_optional(Some(temp.path().join("nope.toml"))).await.unwrap();
        assert!(settings.base_dir.is_none());
    }
}
