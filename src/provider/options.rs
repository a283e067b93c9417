//! Provider configuration.
//!
//! [`ProviderSpec`] is the settings-file shape of one `[[providers.<group>]]`
//! entry. [`ProviderOptions`] is the resolved form a factory holds, which can
//! also be built in code with computed values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::ProviderContext;

/// A function computing an option value from the provider's context.
pub type ComputeFn<T> = Arc<dyn Fn(&ProviderContext<'_>) -> T + Send + Sync>;

/// An option that is either fixed or computed per template.
pub enum OptionValue<T> {
    /// Used as given. String literals may contain `{app}`, `{app_dir}`,
    /// `{template}` and `{base_dir}` placeholders.
    Literal(T),
    Computed(ComputeFn<T>),
}

impl<T> OptionValue<T> {
    pub fn computed(compute: impl Fn(&ProviderContext<'_>) -> T + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(compute))
    }
}

impl<T: Clone> Clone for OptionValue<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal(value) => Self::Literal(value.clone()),
            Self::Computed(compute) => Self::Computed(Arc::clone(compute)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OptionValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for OptionValue<String> {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for OptionValue<String> {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<Vec<String>> for OptionValue<Vec<String>> {
    fn from(value: Vec<String>) -> Self {
        Self::Literal(value)
    }
}

impl<const N: usize> From<[&str; N]> for OptionValue<Vec<String>> {
    fn from(value: [&str; N]) -> Self {
        Self::Literal(value.iter().map(|s| (*s).to_string()).collect())
    }
}

/// One provider entry in the settings file.
///
/// ```toml
/// [[providers.template]]
/// kind = "compile"
/// sourcepath = "{app}/styles/{template}.styl"
/// targetpath = "{app}/styles/{template}.css"
/// command = ["stylus", "{source}", "--out", "{target}"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSpec {
    /// Registry kind (`compile_scss`, `css_link`, ...)
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcepath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targetpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    /// Command line for compile providers; also accepts `{source}` and `{target}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_duplicates: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_attrs: Option<Vec<String>>,
}

/// Resolved options of one provider factory.
///
/// Unset values fall back to the kind's defaults at construction time.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub group: Option<String>,
    pub sourcepath: Option<OptionValue<String>>,
    pub targetpath: Option<OptionValue<String>>,
    pub filepath: Option<OptionValue<String>>,
    pub command: Option<OptionValue<Vec<String>>>,
    /// Disable link providers whose URL was already emitted in the same run
    pub skip_duplicates: bool,
    /// Extra attributes appended verbatim to emitted tags
    pub link_attrs: Vec<String>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            group: None,
            sourcepath: None,
            targetpath: None,
            filepath: None,
            command: None,
            skip_duplicates: true,
            link_attrs: Vec::new(),
        }
    }
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn sourcepath(mut self, value: impl Into<OptionValue<String>>) -> Self {
        self.sourcepath = Some(value.into());
        self
    }

    pub fn targetpath(mut self, value: impl Into<OptionValue<String>>) -> Self {
        self.targetpath = Some(value.into());
        self
    }

    pub fn filepath(mut self, value: impl Into<OptionValue<String>>) -> Self {
        self.filepath = Some(value.into());
        self
    }

    pub fn command(mut self, value: impl Into<OptionValue<Vec<String>>>) -> Self {
        self.command = Some(value.into());
        self
    }

    pub const fn skip_duplicates(mut self, skip: bool) -> Self {
        self.skip_duplicates = skip;
        self
    }

    pub fn link_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.link_attrs = attrs.into_iter().map(Into::into).collect();
        self
    }

    /// The configured group, or `default` when unset.
    pub fn group_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.group.as_deref().unwrap_or(default)
    }
}

impl From<&ProviderSpec> for ProviderOptions {
    fn from(spec: &ProviderSpec) -> Self {
        Self {
            group: spec.group.clone(),
            sourcepath: spec.sourcepath.clone().map(OptionValue::Literal),
            targetpath: spec.targetpath.clone().map(OptionValue::Literal),
            filepath: spec.filepath.clone().map(OptionValue::Literal),
            command: spec.command.clone().map(OptionValue::Literal),
            skip_duplicates: spec.skip_duplicates.unwrap_or(true),
            link_attrs: spec.link_attrs.clone().unwrap_or_default(),
        }
    }
}

/// Replaces each `{name}` in `pattern` with its value. Unknown names are left alone.
pub(crate) fn expand_placeholders(pattern: &str, vars: &[(&str, &str)]) -> String {
    let mut expanded = pattern.to_string();
    for (name, value) in vars {
        expanded = expanded.replace(&format!("{{{name}}}"), value);
    }
    expanded
}
