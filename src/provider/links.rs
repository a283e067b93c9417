//! Stylesheet and script link providers.
//!
//! A link provider looks for a template's companion file (by default
//! `styles/{stem}.css` or `scripts/{stem}.js` in the app's directory) and, when it exists,
//! emits a tag pointing at it under `static_url`. The file's modification time
//! is appended as a query string so browsers refetch it after a change.

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{
    AssetProvider, KIND_CSS_LINK, KIND_JS_LINK, Provider, ProviderContext, ProviderFactory, RunContext, SCRIPTS_GROUP,
    STYLES_GROUP,
};
use crate::template::TemplateId;
use crate::utils::fs::{modified_version, relative_path, to_forward_slashes};

/// Which tag a link provider emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Css,
    Js,
}

impl LinkKind {
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Css => KIND_CSS_LINK,
            Self::Js => KIND_JS_LINK,
        }
    }

    const fn default_group(self) -> &'static str {
        match self {
            Self::Css => STYLES_GROUP,
            Self::Js => SCRIPTS_GROUP,
        }
    }

    fn default_filepath(self, ctx: &ProviderContext<'_>) -> Option<String> {
        let app_dir = ctx.app_dir()?;
        let stem = ctx.template.stem();
        Some(match self {
            Self::Css => format!("{app_dir}/styles/{stem}.css"),
            Self::Js => format!("{app_dir}/scripts/{stem}.js"),
        })
    }

    fn tag(self, url: &str, attrs: &[String]) -> String {
        let attrs: String = attrs.iter().map(|attr| format!(" {attr}")).collect();
        match self {
            Self::Css => format!(r#"<link rel="stylesheet" type="text/css" href="{url}"{attrs} />"#),
            Self::Js => format!(r#"<script src="{url}"{attrs}></script>"#),
        }
    }
}

/// Emits a tag for a template's companion file when that file exists.
#[derive(Debug)]
pub struct LinkProvider {
    link: LinkKind,
    group: String,
    template: TemplateId,
    filepath: PathBuf,
    url: Option<String>,
    html: Option<String>,
    enabled: bool,
}

impl LinkProvider {
    /// Locates the file and builds the tag.
    ///
    /// A missing file, or a URL already emitted in this run when
    /// `skip_duplicates` is set, leaves the provider disabled.
    ///
    /// # Errors
    ///
    /// Fails when the asset root cannot be determined or the file's
    /// metadata cannot be read
    pub fn create(
        link: LinkKind,
        ctx: &ProviderContext<'_>,
        factory: &ProviderFactory,
        run: &mut RunContext,
    ) -> Result<Self> {
        let options = factory.options();
        let mut provider = Self {
            link,
            group: options.group_or(link.default_group()).to_string(),
            template: ctx.template.clone(),
            filepath: PathBuf::new(),
            url: None,
            html: None,
            enabled: false,
        };

        let Some(relative) = ctx.resolve(options.filepath.as_ref()).or_else(|| link.default_filepath(ctx))
        else {
            tracing::debug!(
                target: "provider",
                "{} skipped for {}: template app is not registered",
                link.kind(),
                ctx.template
            );
            return Ok(provider);
        };

        let root = ctx.settings.asset_root()?;
        provider.filepath = root.join(&relative);
        if !provider.filepath.is_file() {
            tracing::trace!(target: "provider", "{} not found: {}", link.kind(), provider.filepath.display());
            return Ok(provider);
        }

        let url = format!(
            "{}/{}",
            ctx.settings.static_url.trim_end_matches('/'),
            to_forward_slashes(&relative_path(root, &provider.filepath))
        );

        let first = run.mark_emitted(url.clone());
        if options.skip_duplicates && !first {
            tracing::debug!(target: "provider", "{} skipped duplicate {} for {}", link.kind(), url, ctx.template);
            return Ok(provider);
        }

        let versioned = format!("{url}?{}", modified_version(&provider.filepath)?);
        provider.html = Some(link.tag(&versioned, &options.link_attrs));
        provider.url = Some(versioned);
        provider.enabled = true;

        tracing::debug!(target: "provider", "{} created for {}", link.kind(), provider.filepath.display());
        Ok(provider)
    }

    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    /// The versioned URL, when enabled.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Provider for LinkProvider {
    fn kind(&self) -> &str {
        self.link.kind()
    }

    fn group(&self) -> &str {
        &self.group
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    fn as_asset(&self) -> Option<&dyn AssetProvider> {
        Some(self)
    }
}

impl AssetProvider for LinkProvider {
    fn asset_path(&self) -> &Path {
        &self.filepath
    }
}

pub(crate) fn create_css_link(
    ctx: &ProviderContext<'_>,
    factory: &ProviderFactory,
    run: &mut RunContext,
) -> Result<Box<dyn Provider>> {
    Ok(Box::new(LinkProvider::create(LinkKind::Css, ctx, factory, run)?))
}

pub(crate) fn create_js_link(
    ctx: &ProviderContext<'_>,
    factory: &ProviderFactory,
    run: &mut RunContext,
) -> Result<Box<dyn Provider>> {
    Ok(Box::new(LinkProvider::create(LinkKind::Js, ctx, factory, run)?))
}
