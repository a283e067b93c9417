//! URL path convention: `/app/module.function/param1/param2`.

use serde::Serialize;
use std::fmt;

use crate::config::Settings;

/// Function name used when a page segment has no `.function` suffix.
pub const DEFAULT_FUNCTION: &str = "process_request";

/// The parts of a request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingData {
    pub app: String,
    pub module: String,
    pub function: String,
    /// Remaining path segments, in order
    pub urlparams: Vec<String>,
}

impl RoutingData {
    pub fn new(app: impl Into<String>, module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            module: module.into(),
            function: function.into(),
            urlparams: Vec::new(),
        }
    }

    /// Splits `path` into app, module, function and parameters.
    ///
    /// - a first segment naming a registered app selects it; otherwise the
    ///   default app is used and the segment is taken as the page
    /// - an empty page falls back to `default_page`
    /// - `page.function` names a function; a bare page uses [`DEFAULT_FUNCTION`]
    ///
    /// ```rust,no_run
    /// use pagewright::config::Settings;
    /// use pagewright::router::RoutingData;
    ///
    /// # fn example(settings: &Settings) {
    /// let routing = RoutingData::parse("/account/login.check/42/", settings);
    /// assert_eq!(routing.module, "login");
    /// assert_eq!(routing.function, "check");
    /// assert_eq!(routing.urlparams, vec!["42"]);
    /// # }
    /// ```
    pub fn parse(path: &str, settings: &Settings) -> Self {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty()).peekable();

        let app = match segments.peek() {
            Some(first) if settings.is_app(first) => segments.next().unwrap_or_default().to_string(),
            _ => settings.default_app.clone(),
        };

        let page = segments.next().unwrap_or_default();
        let page = if page.is_empty() { settings.default_page.as_str() } else { page };
        let (module, function) = match page.split_once('.') {
            Some((module, function)) if !function.is_empty() => (module, function),
            Some((module, _)) => (module, DEFAULT_FUNCTION),
            None => (page, DEFAULT_FUNCTION),
        };

        Self {
            app,
            module: module.to_string(),
            function: function.to_string(),
            urlparams: segments.map(str::to_string).collect(),
        }
    }

    /// The `(app, module, function)` triple views are registered under.
    pub fn key(&self) -> ViewKey {
        ViewKey::new(&self.app, &self.module, &self.function)
    }
}

impl fmt::Display for RoutingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.app, self.module, self.function)
    }
}

/// Registration key of a view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub app: String,
    pub module: String,
    pub function: String,
}

impl ViewKey {
    pub fn new(app: &str, module: &str, function: &str) -> Self {
        Self {
            app: app.to_string(),
            module: module.to_string(),
            function: function.to_string(),
        }
    }
}
