//! pagewright - view dispatch and template rendering with asset providers
//!
//! Pages are Tera templates living in registered apps. Rendering a template
//! first runs a configurable chain of *providers* over the template and each
//! template it extends: compile providers turn SCSS or LESS into CSS when the
//! source changed, and link providers emit `<link>`/`<script>` tags for the
//! page's companion files. The same providers, run offline, produce bundler
//! entry files listing every page's scripts.
//!
//! # Architecture Overview
//!
//! ```text
//! Request ─► Router ─► view ─► TemplateRenderer ─► ProviderRun ─► providers
//!               ▲        │                            (base template first)
//!               └────────┘ internal redirect
//! ```
//!
//! # Core Modules
//!
//! - [`router`] - Path convention, view registry, route cache and dispatch loop
//! - [`template`] - Template identities, discovery, inheritance and rendering
//! - [`provider`] - Provider trait, compile and link providers, factories and runs
//! - [`bundle`] - Bundler entry-file generation
//! - [`command`] - External compiler invocation
//! - [`config`] - Settings file loading
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - The `pagewright` command line
//! - [`utils`] - File system helpers
//!
//! # Settings (pagewright.toml)
//!
//! ```toml
//! base_dir = "."
//! static_url = "/static/"
//! debug = true
//!
//! [[apps]]
//! name = "homepage"
//!
//! [[apps]]
//! name = "account"
//!
//! [[providers.template]]
//! kind = "compile_scss"
//!
//! [[providers.template]]
//! kind = "css_link"
//!
//! [[providers.template]]
//! kind = "js_link"
//!
//! [[providers.webpack]]
//! kind = "js_link"
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! pagewright bundle --single static/bundle.js
//! pagewright render homepage/index.html
//! ```

pub mod bundle;
pub mod cli;
pub mod command;
pub mod config;
pub mod core;
pub mod provider;
pub mod router;
pub mod template;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
