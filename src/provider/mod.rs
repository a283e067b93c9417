//! Per-template asset providers
//!
//! A *provider* is a small unit of work attached to a template: compile the
//! template's stylesheet, emit a `<link>` or `<script>` tag for its companion
//! file, and so on. Providers are configured in named groups (the `template`
//! group runs on every render, the `webpack` group feeds the bundle command)
//! and are instantiated once per ancestor of the rendered template.
//!
//! # Architecture
//!
//! ```text
//! Settings [providers.<group>]
//!        │
//!        ▼
//! ProviderRegistry ──factories()──► ProviderGroup (Vec<ProviderFactory>)
//!                                           │  each factory owns its options
//!                                           │  and its StalenessTracker
//!                                           ▼
//! ProviderRun::run(library, leaf) ──► ColumnData per ancestor (base first)
//!                                           │
//!                                           ▼
//!                         links(group) / asset_paths() / enabled()
//! ```
//!
//! # Built-in kinds
//!
//! | kind           | group     | does                                                      |
//! |----------------|-----------|-----------------------------------------------------------|
//! | `compile`      | `styles`  | runs a configured command when the source is newer        |
//! | `compile_scss` | `styles`  | `{app}/styles/{stem}.scss` → `.css` with `sass`           |
//! | `compile_less` | `styles`  | `{app}/styles/{stem}.less` → `.css` with `lessc`          |
//! | `css_link`     | `styles`  | `<link>` tag for `{app}/styles/{stem}.css`                |
//! | `js_link`      | `scripts` | `<script>` tag for `{app}/scripts/{stem}.js`              |
//!
//! Applications add kinds with [`ProviderRegistry::register`].
//!
//! # Modules
//!
//! - `options` - [`ProviderSpec`] (settings file) and [`ProviderOptions`] (resolved)
//! - `compile` - [`CompileProvider`] and the [`StalenessTracker`] memo
//! - `links` - [`LinkProvider`] for stylesheets and scripts
//! - `factory` - [`ProviderRegistry`], [`ProviderFactory`], [`ProviderGroup`]
//! - `run` - [`ProviderRun`] over an ancestor chain

mod compile;
mod factory;
mod links;
mod options;
mod run;

pub use compile::{CheckState, CompileFlavor, CompileOutcome, CompileProvider, StalenessTracker};
pub use factory::{ProviderConstructor, ProviderFactory, ProviderGroup, ProviderRegistry};
pub use links::{LinkKind, LinkProvider};
pub use options::{ComputeFn, OptionValue, ProviderOptions, ProviderSpec};
pub use run::{ColumnData, ProviderRun, RunContext};

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, Settings};
use crate::template::TemplateId;

/// Provider group run for every rendered template.
pub const TEMPLATE_PROVIDERS: &str = "template";

/// Provider group the bundle command uses to discover scripts.
pub const WEBPACK_PROVIDERS: &str = "webpack";

/// Output group of stylesheet providers; always present in `links`.
pub const STYLES_GROUP: &str = "styles";

/// Output group of script providers; always present in `links`.
pub const SCRIPTS_GROUP: &str = "scripts";

pub const KIND_COMPILE: &str = "compile";
pub const KIND_COMPILE_SCSS: &str = "compile_scss";
pub const KIND_COMPILE_LESS: &str = "compile_less";
pub const KIND_CSS_LINK: &str = "css_link";
pub const KIND_JS_LINK: &str = "js_link";

/// A provider instance for one template in one run.
///
/// All work happens at construction; afterwards the instance only answers
/// questions. Disabled providers contribute nothing.
pub trait Provider: fmt::Debug + Send + Sync {
    /// The registry kind this provider was built from.
    fn kind(&self) -> &str;

    /// The output group (`styles`, `scripts`, ...) its HTML belongs to.
    fn group(&self) -> &str;

    fn enabled(&self) -> bool;

    /// Markup to place in the page, if this provider emits any.
    fn html(&self) -> Option<&str> {
        None
    }

    /// The file-backed view of this provider, used by the bundle command.
    fn as_asset(&self) -> Option<&dyn AssetProvider> {
        None
    }
}

/// A provider backed by a file on disk.
pub trait AssetProvider {
    fn asset_path(&self) -> &Path;
}

/// What a provider knows about the template it is built for.
#[derive(Debug, Clone, Copy)]
pub struct ProviderContext<'a> {
    pub template: &'a TemplateId,
    /// The owning app, when the template's app is registered
    pub app: Option<&'a AppConfig>,
    pub settings: &'a Settings,
}

impl<'a> ProviderContext<'a> {
    pub fn new(template: &'a TemplateId, settings: &'a Settings) -> Self {
        Self {
            template,
            app: settings.app(template.app()),
            settings,
        }
    }

    /// The owning app's directory relative to the asset root, when the app
    /// is registered.
    pub fn app_dir(&self) -> Option<String> {
        self.app.map(|app| self.settings.app_asset_dir(app))
    }

    /// Substitutes `{app}`, `{app_dir}`, `{template}` (the stem) and
    /// `{base_dir}` in a literal option value.
    pub fn expand(&self, pattern: &str) -> String {
        let base_dir =
            self.settings.base_dir.as_deref().map(|dir| dir.display().to_string()).unwrap_or_default();
        let app_dir = self.app_dir().unwrap_or_else(|| self.template.app().to_string());
        options::expand_placeholders(
            pattern,
            &[
                ("app", self.template.app()),
                ("app_dir", &app_dir),
                ("template", self.template.stem()),
                ("base_dir", &base_dir),
            ],
        )
    }

    /// Resolves an optional path option: literals are expanded, computed
    /// values are called.
    pub fn resolve(&self, value: Option<&OptionValue<String>>) -> Option<String> {
        value.map(|value| match value {
            OptionValue::Literal(pattern) => self.expand(pattern),
            OptionValue::Computed(compute) => compute(self),
        })
    }

    /// Joins a relative asset path to the asset root (`base_dir` in debug
    /// mode, `static_root` otherwise). Absolute paths are returned as-is.
    ///
    /// # Errors
    ///
    /// Fails in debug mode when `base_dir` is not set
    pub fn asset_path(&self, relative: &str) -> Result<PathBuf> {
        Ok(self.settings.asset_root()?.join(relative))
    }
}
