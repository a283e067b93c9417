//! Template discovery and inheritance.
//!
//! Every registered app contributes the files under its `templates/` directory.
//! Files and directories whose names start with `__` are private and skipped.
//! Inheritance is read from `{% extends "app/path" %}` tags; the resulting
//! chains are validated up front so a missing parent or a cycle fails at load
//! time rather than on the first request.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tera::{Context as TeraContext, Tera};
use walkdir::WalkDir;

use super::{AncestorSource, TemplateId};
use crate::config::Settings;
use crate::core::PagewrightError;
use crate::utils::fs::to_forward_slashes;

const EXTENDS_PATTERN: &str = r#"\{%-?\s*extends\s+["']([^"']+)["']\s*-?%\}"#;

/// All templates of all registered apps, parsed into one Tera instance.
#[derive(Debug)]
pub struct TemplateLibrary {
    parents: BTreeMap<TemplateId, Option<TemplateId>>,
    tera: Tera,
}

impl TemplateLibrary {
    /// Discovers and parses the templates of every app in `settings`.
    ///
    /// Apps without a `templates/` directory contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a template cannot be read, names a parent that does
    /// not exist, is part of an inheritance cycle, or fails to parse
    pub fn load(settings: &Settings) -> Result<Self> {
        let mut sources = Vec::new();
        for app in &settings.apps {
            let dir = app.templates_dir();
            if !dir.is_dir() {
                tracing::debug!("App '{}' has no templates directory", app.name);
                continue;
            }
            for (path, content) in discover(&dir)? {
                sources.push((TemplateId::new(&app.name, path), content));
            }
        }
        tracing::debug!("Discovered {} templates in {} apps", sources.len(), settings.apps.len());
        Self::from_sources(sources)
    }

    /// Builds a library from in-memory `(id, source)` pairs.
    ///
    /// # Errors
    ///
    /// See [`TemplateLibrary::load`]
    pub fn from_sources(sources: impl IntoIterator<Item = (TemplateId, String)>) -> Result<Self> {
        let extends = Regex::new(EXTENDS_PATTERN).context("Invalid extends pattern")?;

        let mut parents = BTreeMap::new();
        let mut raw = Vec::new();
        for (id, content) in sources {
            let parent = match extends.captures(&content) {
                Some(caps) => Some(TemplateId::parse(&caps[1])?),
                None => None,
            };
            raw.push((id.name(), content));
            parents.insert(id, parent);
        }

        let library = Self {
            parents,
            tera: Tera::default(),
        };
        for id in library.parents.keys() {
            library.ancestors(id)?;
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(raw).map_err(|e| PagewrightError::RenderFailed {
            name: "template library".to_string(),
            reason: format_tera_error(&e),
        })?;

        Ok(Self {
            tera,
            ..library
        })
    }

    pub fn contains(&self, id: &TemplateId) -> bool {
        self.parents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Templates belonging to `app`, in path order.
    pub fn templates_for<'a>(&'a self, app: &'a str) -> impl Iterator<Item = &'a TemplateId> + 'a {
        self.parents.keys().filter(move |id| id.app() == app)
    }

    /// The template `id` directly extends, if any.
    pub fn parent_of(&self, id: &TemplateId) -> Option<&TemplateId> {
        self.parents.get(id).and_then(Option::as_ref)
    }

    /// Renders `id` with `context`.
    ///
    /// # Errors
    ///
    /// [`PagewrightError::TemplateNotFound`] or [`PagewrightError::RenderFailed`]
    pub fn render(&self, id: &TemplateId, context: &TeraContext) -> Result<String> {
        if !self.contains(id) {
            return Err(PagewrightError::TemplateNotFound {
                name: id.name(),
            }
            .into());
        }
        self.tera.render(&id.name(), context).map_err(|e| {
            PagewrightError::RenderFailed {
                name: id.name(),
                reason: format_tera_error(&e),
            }
            .into()
        })
    }
}

impl AncestorSource for TemplateLibrary {
    fn ancestors(&self, leaf: &TemplateId) -> Result<Vec<TemplateId>> {
        if !self.contains(leaf) {
            return Err(PagewrightError::TemplateNotFound {
                name: leaf.name(),
            }
            .into());
        }

        let mut chain = vec![leaf.clone()];
        let mut seen: HashSet<&TemplateId> = HashSet::from([leaf]);
        let mut current = leaf;
        while let Some(parent) = self.parent_of(current) {
            if !self.contains(parent) {
                return Err(PagewrightError::TemplateNotFound {
                    name: parent.name(),
                }
                .into());
            }
            if !seen.insert(parent) {
                let mut names: Vec<String> = chain.iter().map(TemplateId::name).collect();
                names.push(parent.name());
                return Err(PagewrightError::TemplateCycle {
                    chain: names.join(" -> "),
                }
                .into());
            }
            chain.push(parent.clone());
            current = parent;
        }

        chain.reverse();
        Ok(chain)
    }
}

fn discover(dir: &Path) -> Result<Vec<(String, String)>> {
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with("__"));

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let content = std::fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read template {}", entry.path().display()))?;
        found.push((to_forward_slashes(relative), content));
    }
    Ok(found)
}

/// Flattens a Tera error and its sources into one message.
pub(crate) fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }
    messages.dedup();
    messages.join(": ")
}
