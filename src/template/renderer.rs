//! Rendering templates with their providers.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tera::Context as TeraContext;

use super::{TemplateId, TemplateLibrary};
use crate::config::Settings;
use crate::provider::{ProviderGroup, ProviderRegistry, ProviderRun, TEMPLATE_PROVIDERS};

#[derive(Serialize)]
struct TemplateInfo<'a> {
    app: &'a str,
    path: &'a str,
    name: String,
}

/// Renders templates after running the `template` provider group over their
/// ancestors.
///
/// Cheap to share: everything is behind `Arc`, and the provider factories keep
/// their staleness memos across renders.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    settings: Arc<Settings>,
    library: Arc<TemplateLibrary>,
    providers: ProviderGroup,
}

impl TemplateRenderer {
    pub fn new(settings: Arc<Settings>, library: Arc<TemplateLibrary>, providers: ProviderGroup) -> Self {
        Self {
            settings,
            library,
            providers,
        }
    }

    /// Loads the template library and the `template` provider group.
    ///
    /// # Errors
    ///
    /// Template discovery errors and unknown provider kinds
    pub fn from_settings(settings: Arc<Settings>, registry: &ProviderRegistry) -> Result<Self> {
        let library = Arc::new(TemplateLibrary::load(&settings)?);
        let providers = registry.factories(&settings, TEMPLATE_PROVIDERS)?;
        Ok(Self::new(settings, library, providers))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn providers(&self) -> &ProviderGroup {
        &self.providers
    }

    /// Runs the provider group for `id` without rendering.
    ///
    /// # Errors
    ///
    /// Ancestor resolution and provider construction errors
    pub fn run_providers(&self, id: &TemplateId) -> Result<ProviderRun> {
        ProviderRun::run(self.library.as_ref(), id, &self.providers, &self.settings)
    }

    /// Renders `id` with `context` plus `links` and `template`.
    ///
    /// # Errors
    ///
    /// Provider errors (a failed compile aborts the render) and Tera errors
    pub fn render(&self, id: &TemplateId, context: &TeraContext) -> Result<String> {
        let run = self.run_providers(id)?;

        let mut context = context.clone();
        context.insert("links", &run.links_by_group());
        context.insert(
            "template",
            &TemplateInfo {
                app: id.app(),
                path: id.path(),
                name: id.name(),
            },
        );

        let html = self.library.render(id, &context)?;
        tracing::debug!("Rendered {} ({} bytes)", id, html.len());
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::PagewrightError;
    use crate::provider::ProviderSpec;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> (TempDir, Arc<Settings>) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("homepage/templates")).unwrap();
        fs::create_dir_all(root.join("homepage/styles")).unwrap();
        fs::write(
            root.join("homepage/templates/base.html"),
            "<head>{{ links.styles | safe }}</head>{% block body %}{% endblock %}",
        )
        .unwrap();
        fs::write(
            root.join("homepage/templates/index.html"),
            r#"{% extends "homepage/base.html" %}{% block body %}{{ template.app }} {{ greeting }}{% endblock %}"#,
        )
        .unwrap();
        fs::write(root.join("homepage/styles/base.css"), "").unwrap();
        fs::write(root.join("homepage/styles/index.css"), "").unwrap();

        let mut settings = Settings::default();
        settings.base_dir = Some(root.to_path_buf());
        settings.debug = true;
        settings.apps.push(AppConfig::new("homepage", root.join("homepage")));
        settings.providers.insert(
            TEMPLATE_PROVIDERS.to_string(),
            vec![ProviderSpec {
                kind: "css_link".to_string(),
                ..ProviderSpec::default()
            }],
        );
        (temp, Arc::new(settings))
    }

    #[test]
    fn test_render_injects_links_base_first() {
        let (_temp, settings) = project();
        let renderer = TemplateRenderer::from_settings(settings, &ProviderRegistry::with_builtins()).unwrap();

        let mut context = TeraContext::new();
        context.insert("greeting", "hello");
        let html = renderer.render(&TemplateId::new("homepage", "index.html"), &context).unwrap();

        let base = html.find("homepage/styles/base.css").unwrap();
        let index = html.find("homepage/styles/index.css").unwrap();
        assert!(base < index);
        assert!(html.ends_with("</head>homepage hello"));
    }

    #[test]
    fn test_standard_link_groups_always_defined() {
        let (temp, settings) = project();
        fs::write(
            temp.path().join("homepage/templates/plain.html"),
            "[{{ links.styles }}][{{ links.scripts }}]",
        )
        .unwrap();
        let mut settings = (*settings).clone();
        settings.providers.clear();
        let renderer = TemplateRenderer::from_settings(Arc::new(settings), &ProviderRegistry::with_builtins()).unwrap();

        let html = renderer.render(&TemplateId::new("homepage", "plain.html"), &TeraContext::new()).unwrap();
        assert_eq!(html, "[][]");
    }

    #[test]
    fn test_render_unknown_template() {
        let (_temp, settings) = project();
        let renderer = TemplateRenderer::from_settings(settings, &ProviderRegistry::with_builtins()).unwrap();

        let err = renderer.render(&TemplateId::new("homepage", "nope.html"), &TeraContext::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<PagewrightError>(), Some(PagewrightError::TemplateNotFound { .. })));
    }
}
