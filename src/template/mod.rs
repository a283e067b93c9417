//! Templates: identity, discovery, inheritance and rendering
//!
//! Templates are Tera files under each app's `templates/` directory, addressed
//! as `app/path` (for example `homepage/account/login.html`). Inheritance uses
//! Tera's `{% extends "app/path" %}`; the same tags define the ancestor chain
//! that providers run over.
//!
//! Rendering a template:
//!
//! 1. resolve the ancestor chain, base first
//! 2. run the `template` provider group over it (compile stylesheets, collect links)
//! 3. render with the caller's context plus `links` (group name to HTML) and
//!    `template` (`app`, `path`, `name`)
//!
//! ```html
//! <head>{{ links.styles | safe }}</head>
//! <body>{% block body %}{% endblock %}{{ links.scripts | safe }}</body>
//! ```

mod id;
mod library;
mod renderer;

pub use id::TemplateId;
pub use library::TemplateLibrary;
pub(crate) use library::format_tera_error;
pub use renderer::TemplateRenderer;

use anyhow::Result;

/// Anything that can list a template's ancestors.
pub trait AncestorSource {
    /// The chain from the most-base ancestor to `leaf` inclusive.
    ///
    /// # Errors
    ///
    /// Fails if `leaf` or an ancestor is unknown, or on an inheritance cycle
    fn ancestors(&self, leaf: &TemplateId) -> Result<Vec<TemplateId>>;
}
