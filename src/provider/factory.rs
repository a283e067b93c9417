//! Provider registry and factories.
//!
//! The registry maps kind names to constructors. Turning a settings group into
//! a [`ProviderGroup`] happens once at startup; the resulting factories are
//! shared by every render, and each carries the [`StalenessTracker`] that
//! remembers which sources it has already checked.

use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::compile::{StalenessTracker, create_compile, create_compile_less, create_compile_scss};
use super::links::{create_css_link, create_js_link};
use super::{
    KIND_COMPILE, KIND_COMPILE_LESS, KIND_COMPILE_SCSS, KIND_CSS_LINK, KIND_JS_LINK, Provider,
    ProviderContext, ProviderOptions, RunContext,
};
use crate::config::Settings;
use crate::core::PagewrightError;

/// Builds one provider for one template.
pub type ProviderConstructor =
    fn(&ProviderContext<'_>, &ProviderFactory, &mut RunContext) -> Result<Box<dyn Provider>>;

/// A configured provider kind, ready to be instantiated per template.
#[derive(Clone)]
pub struct ProviderFactory {
    kind: String,
    constructor: ProviderConstructor,
    options: Arc<ProviderOptions>,
    tracker: Arc<StalenessTracker>,
}

impl fmt::Debug for ProviderFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderFactory")
            .field("kind", &self.kind)
            .field("options", &self.options)
            .field("checked", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl ProviderFactory {
    pub fn new(kind: impl Into<String>, constructor: ProviderConstructor, options: ProviderOptions) -> Self {
        Self {
            kind: kind.into(),
            constructor,
            options: Arc::new(options),
            tracker: Arc::new(StalenessTracker::new()),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    pub fn tracker(&self) -> &StalenessTracker {
        &self.tracker
    }

    /// Instantiates the provider for `ctx.template`.
    ///
    /// # Errors
    ///
    /// Whatever the kind's constructor reports
    pub fn create(&self, ctx: &ProviderContext<'_>, run: &mut RunContext) -> Result<Box<dyn Provider>> {
        tracing::trace!(target: "provider", "Creating {} for {}", self.kind, ctx.template);
        (self.constructor)(ctx, self, run)
    }
}

/// The ordered factories of one named group.
#[derive(Debug, Clone, Default)]
pub struct ProviderGroup {
    name: String,
    factories: Vec<ProviderFactory>,
}

impl ProviderGroup {
    pub fn new(name: impl Into<String>, factories: Vec<ProviderFactory>) -> Self {
        Self {
            name: name.into(),
            factories,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn factories(&self) -> &[ProviderFactory] {
        &self.factories
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Kind name to constructor lookup.
///
/// # Examples
///
/// ```rust,no_run
/// use pagewright::config::Settings;
/// use pagewright::provider::{ProviderRegistry, TEMPLATE_PROVIDERS};
///
/// # fn example(settings: &Settings) -> anyhow::Result<()> {
/// let registry = ProviderRegistry::with_builtins();
/// let group = registry.factories(settings, TEMPLATE_PROVIDERS)?;
/// println!("{} providers per template", group.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.constructors.keys().collect();
        kinds.sort();
        f.debug_struct("ProviderRegistry").field("kinds", &kinds).finish()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ProviderRegistry {
    /// A registry with no kinds at all.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry with the built-in compile and link kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(KIND_COMPILE, create_compile);
        registry.register(KIND_COMPILE_SCSS, create_compile_scss);
        registry.register(KIND_COMPILE_LESS, create_compile_less);
        registry.register(KIND_CSS_LINK, create_css_link);
        registry.register(KIND_JS_LINK, create_js_link);
        registry
    }

    /// Adds or replaces a kind.
    pub fn register(&mut self, kind: impl Into<String>, constructor: ProviderConstructor) {
        self.constructors.insert(kind.into(), constructor);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Builds a factory for `kind` with code-supplied options.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::UnknownProviderKind`] if `kind` is not registered
    pub fn factory(&self, group: &str, kind: &str, options: ProviderOptions) -> Result<ProviderFactory> {
        let constructor = self.constructors.get(kind).copied().ok_or_else(|| {
            PagewrightError::UnknownProviderKind {
                kind: kind.to_string(),
                group: group.to_string(),
            }
        })?;
        Ok(ProviderFactory::new(kind, constructor, options))
    }

    /// Builds the factories for a settings group, in configured order.
    ///
    /// A group missing from the settings is empty.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::UnknownProviderKind`] on the first unknown kind
    pub fn factories(&self, settings: &Settings, group: &str) -> Result<ProviderGroup> {
        let factories = settings
            .provider_specs(group)
            .iter()
            .map(|spec| self.factory(group, &spec.kind, ProviderOptions::from(spec)))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            target: "provider",
            "Loaded provider group '{}': [{}]",
            group,
            factories.iter().map(ProviderFactory::kind).collect::<Vec<_>>().join(", ")
        );
        Ok(ProviderGroup::new(group, factories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderSpec;
    use crate::template::TemplateId;

    #[derive(Debug)]
    struct Banner(String);

    impl Provider for Banner {
        fn kind(&self) -> &str {
            "banner"
        }

        fn group(&self) -> &str {
            "banners"
        }

        fn enabled(&self) -> bool {
            true
        }

        fn html(&self) -> Option<&str> {
            Some(&self.0)
        }
    }

    fn create_banner(
        ctx: &ProviderContext<'_>,
        _factory: &ProviderFactory,
        _run: &mut RunContext,
    ) -> Result<Box<dyn Provider>> {
        Ok(Box::new(Banner(format!("<!-- {} -->", ctx.template))))
    }

    fn settings_with(group: &str, kinds: &[&str]) -> Settings {
        let mut settings = Settings::default();
        settings.providers.insert(
            group.to_string(),
            kinds
                .iter()
                .map(|kind| ProviderSpec {
                    kind: (*kind).to_string(),
                    ..ProviderSpec::default()
                })
                .collect(),
        );
        settings
    }

    #[test]
    fn test_factories_keep_configured_order() {
        let settings = settings_with("template", &["compile_scss", "css_link", "js_link"]);
        let group = ProviderRegistry::with_builtins().factories(&settings, "template").unwrap();

        let kinds: Vec<&str> = group.factories().iter().map(ProviderFactory::kind).collect();
        assert_eq!(kinds, vec!["compile_scss", "css_link", "js_link"]);
        assert_eq!(group.name(), "template");
    }

    #[test]
    fn test_unknown_kind() {
        let settings = settings_with("template", &["css_link", "compile_stylus"]);
        let err = ProviderRegistry::with_builtins().factories(&settings, "template").unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PagewrightError>(),
            Some(PagewrightError::UnknownProviderKind { kind, group })
                if kind == "compile_stylus" && group == "template"
        ));
    }

    #[test]
    fn test_missing_group_is_empty() {
        let group = ProviderRegistry::with_builtins().factories(&Settings::default(), "webpack").unwrap();
        assert!(group.is_empty());
    }

    #[test]
    fn test_custom_kind() {
        let mut registry = ProviderRegistry::with_builtins();
        registry.register("banner", create_banner);
        assert!(registry.contains("banner"));

        let settings = settings_with("template", &["banner"]);
        let group = registry.factories(&settings, "template").unwrap();

        let id = TemplateId::new("homepage", "index.html");
        let provider = group.factories()[0]
            .create(&ProviderContext::new(&id, &settings), &mut RunContext::default())
            .unwrap();
        assert_eq!(provider.html(), Some("<!-- homepage/index.html -->"));
    }

    #[test]
    fn test_each_factory_owns_its_tracker() {
        let settings = settings_with("template", &["compile_scss", "compile_scss"]);
        let group = ProviderRegistry::with_builtins().factories(&settings, "template").unwrap();

        let first = group.factories()[0].tracker() as *const StalenessTracker;
        let second = group.factories()[1].tracker() as *const StalenessTracker;
        assert_ne!(first, second);

        // clones share the tracker
        let clone = group.clone();
        assert!(std::ptr::eq(clone.factories()[0].tracker(), group.factories()[0].tracker()));
    }
}
