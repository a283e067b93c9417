//! Running a provider group over a template's ancestor chain.

use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

use super::{Provider, ProviderContext, ProviderGroup, SCRIPTS_GROUP, STYLES_GROUP};
use crate::config::Settings;
use crate::template::{AncestorSource, TemplateId};

/// The providers built for one ancestor, in factory order.
#[derive(Debug)]
pub struct ColumnData {
    template: TemplateId,
    providers: Vec<Box<dyn Provider>>,
}

impl ColumnData {
    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    pub fn providers(&self) -> impl Iterator<Item = &dyn Provider> {
        self.providers.iter().map(|provider| &**provider)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &dyn Provider> {
        self.providers().filter(|provider| provider.enabled())
    }
}

/// State shared by all providers of one run.
#[derive(Debug, Default)]
pub struct RunContext {
    emitted: HashSet<String>,
    columns: Vec<ColumnData>,
}

impl RunContext {
    /// Records `url` as emitted; returns false if it already was.
    pub fn mark_emitted(&mut self, url: impl Into<String>) -> bool {
        self.emitted.insert(url.into())
    }

    /// Columns of the ancestors processed so far, base first.
    pub fn columns(&self) -> &[ColumnData] {
        &self.columns
    }
}

/// The result of running one provider group for one template.
///
/// Ancestors are processed base first; within an ancestor, providers follow
/// factory order. Every query below keeps that order.
#[derive(Debug)]
pub struct ProviderRun {
    context: RunContext,
}

impl ProviderRun {
    /// Resolves `leaf`'s ancestors through `source` and runs `group` over them.
    ///
    /// # Errors
    ///
    /// Fails if the chain cannot be resolved or any provider fails to construct
    pub fn run(
        source: &dyn AncestorSource,
        leaf: &TemplateId,
        group: &ProviderGroup,
        settings: &Settings,
    ) -> Result<Self> {
        let chain = source.ancestors(leaf)?;
        Self::run_chain(&chain, group, settings)
    }

    /// Runs `group` over an explicit chain, base first.
    ///
    /// # Errors
    ///
    /// The first provider construction error
    pub fn run_chain(chain: &[TemplateId], group: &ProviderGroup, settings: &Settings) -> Result<Self> {
        let mut context = RunContext::default();

        for template in chain {
            let ctx = ProviderContext::new(template, settings);
            let providers = group
                .factories()
                .iter()
                .map(|factory| factory.create(&ctx, &mut context))
                .collect::<Result<Vec<_>>>()?;
            context.columns.push(ColumnData {
                template: template.clone(),
                providers,
            });
        }

        tracing::debug!(
            target: "provider",
            "Ran provider group '{}' over {} templates",
            group.name(),
            chain.len()
        );
        Ok(Self {
            context,
        })
    }

    pub fn columns(&self) -> &[ColumnData] {
        &self.context.columns
    }

    pub fn column(&self, template: &TemplateId) -> Option<&ColumnData> {
        self.context.columns.iter().find(|column| column.template() == template)
    }

    /// Enabled providers across all columns.
    pub fn enabled(&self) -> impl Iterator<Item = &dyn Provider> {
        self.context.columns.iter().flat_map(ColumnData::enabled)
    }

    /// HTML of the enabled providers in `group`, one per line.
    pub fn links(&self, group: &str) -> String {
        self.enabled()
            .filter(|provider| provider.group() == group)
            .filter_map(Provider::html)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// [`links`](Self::links) for `styles`, `scripts` and every other group
    /// any provider belongs to, enabled or not. Groups with nothing to emit
    /// map to an empty string.
    pub fn links_by_group(&self) -> BTreeMap<String, String> {
        let mut groups: BTreeSet<&str> = BTreeSet::from([STYLES_GROUP, SCRIPTS_GROUP]);
        groups.extend(self.context.columns.iter().flat_map(ColumnData::providers).map(|provider| provider.group()));
        groups.into_iter().map(|group| (group.to_string(), self.links(group))).collect()
    }

    /// Files of the enabled file-backed providers.
    pub fn asset_paths(&self) -> Vec<PathBuf> {
        self.enabled()
            .filter_map(Provider::as_asset)
            .map(|asset| asset.asset_path().to_path_buf())
            .collect()
    }
}
