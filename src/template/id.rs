//! Template identity.

use serde::Serialize;
use std::fmt;

use crate::core::PagewrightError;

/// A template, identified by its app and its path under the app's `templates/`
/// directory (forward slashes).
///
/// The canonical name `app/path` is what `{% extends %}` tags refer to and
/// what the entry file registers template functions under.
///
/// ```rust,no_run
/// use pagewright::template::TemplateId;
///
/// let id = TemplateId::new("homepage", "account/login.html");
/// assert_eq!(id.name(), "homepage/account/login.html");
/// assert_eq!(id.stem(), "account/login");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TemplateId {
    app: String,
    path: String,
}

impl TemplateId {
    pub fn new(app: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            path: path.into(),
        }
    }

    /// Parses a canonical `app/path` name.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::TemplateNotFound`] when the name has no app segment
    pub fn parse(name: &str) -> Result<Self, PagewrightError> {
        match name.trim_start_matches('/').split_once('/') {
            Some((app, path)) if !app.is_empty() && !path.is_empty() => Ok(Self::new(app, path)),
            _ => Err(PagewrightError::TemplateNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path without its final extension.
    pub fn stem(&self) -> &str {
        let file_start = self.path.rfind('/').map_or(0, |i| i + 1);
        match self.path[file_start..].rfind('.') {
            Some(dot) if dot > 0 => &self.path[..file_start + dot],
            _ => &self.path,
        }
    }

    /// The canonical `app/path` name.
    pub fn name(&self) -> String {
        format!("{}/{}", self.app, self.path)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app, self.path)
    }
}
