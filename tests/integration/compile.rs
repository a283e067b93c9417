//! Compile providers across renders and restarts.
//!
//! The compiler is a `sh -c` one-liner that copies the source and appends a
//! line to `compile.log` per invocation.

#![cfg(unix)]

use pagewright::config::Settings;
use pagewright::provider::{ProviderRegistry, ProviderSpec};
use pagewright::template::{TemplateId, TemplateRenderer};
use pagewright::test_utils::{ProjectBuilder, TestProject, init_test_logging};
use predicates::prelude::*;
use std::fs::File;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tera::Context;

use super::pagewright;

fn compile_spec() -> ProviderSpec {
    ProviderSpec {
        kind: "compile".to_string(),
        sourcepath: Some("{app}/styles/{template}.styl".to_string()),
        targetpath: Some("{app}/styles/{template}.css".to_string()),
        command: Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            r#"echo run >> "$2"; cp "$0" "$1""#.to_string(),
            "{source}".to_string(),
            "{target}".to_string(),
            "{base_dir}/compile.log".to_string(),
        ]),
        ..ProviderSpec::default()
    }
}

/// Sources exist under both `static/` and the project root, so either debug
/// setting finds them.
fn site(debug: bool) -> TestProject {
    ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_debug(debug)
        .with_provider_spec("template", compile_spec())
        .with_provider("template", "css_link")
        .with_template("homepage", "base.html", "{{ links.styles | safe }}{% block body %}{% endblock %}")
        .with_template("homepage", "index.html", r#"{% extends "homepage/base.html" %}{% block body %}ok{% endblock %}"#)
        .with_file("static/homepage/styles/index.styl", "body { color: red }")
        .with_file("homepage/styles/index.styl", "body { color: red }")
        .build()
        .unwrap()
}

fn renderer(settings: Settings) -> TemplateRenderer {
    TemplateRenderer::from_settings(Arc::new(settings), &ProviderRegistry::with_builtins()).unwrap()
}

fn runs(project: &TestProject) -> usize {
    project.read("compile.log").map(|log| log.lines().count()).unwrap_or(0)
}

/// Makes a compiled target older than its source.
fn age(path: &std::path::Path) {
    let earlier = SystemTime::now() - Duration::from_secs(60);
    File::options().write(true).open(path).unwrap().set_modified(earlier).unwrap();
}

#[test]
fn test_compiles_once_per_process_without_debug() {
    init_test_logging(None);
    let project = site(false);
    let index = TemplateId::new("homepage", "index.html");

    let first = renderer(project.settings().unwrap());
    let html = first.render(&index, &Context::new()).unwrap();
    assert_eq!(runs(&project), 1);
    assert_eq!(project.read("static/homepage/styles/index.css").unwrap(), "body { color: red }");
    assert!(html.contains("/static/homepage/styles/index.css?"));

    // Memoized: a stale target is not noticed until restart
    age(&project.path("static/homepage/styles/index.css"));
    first.render(&index, &Context::new()).unwrap();
    assert_eq!(runs(&project), 1);

    // A fresh renderer is a restart
    let second = renderer(project.settings().unwrap());
    second.render(&index, &Context::new()).unwrap();
    assert_eq!(runs(&project), 2);

    // Up to date after that compile
    let third = renderer(project.settings().unwrap());
    third.render(&index, &Context::new()).unwrap();
    assert_eq!(runs(&project), 2);
}

#[test]
fn test_debug_mode_recompiles_changed_sources() {
    let project = site(true);
    let index = TemplateId::new("homepage", "index.html");
    let renderer = renderer(project.settings().unwrap());

    renderer.render(&index, &Context::new()).unwrap();
    renderer.render(&index, &Context::new()).unwrap();
    assert_eq!(runs(&project), 1);

    age(&project.path("homepage/styles/index.css"));
    renderer.render(&index, &Context::new()).unwrap();
    assert_eq!(runs(&project), 2);
}

#[test]
fn test_base_template_without_source_is_skipped() {
    let project = site(false);
    let renderer = renderer(project.settings().unwrap());

    let html = renderer.render(&TemplateId::new("homepage", "base.html"), &Context::new()).unwrap();
    assert_eq!(runs(&project), 0);
    assert!(!html.contains("<link"));
}

#[test]
fn test_failed_compile_fails_the_render() {
    let mut spec = compile_spec();
    spec.command = Some(vec!["sh".to_string(), "-c".to_string(), "echo 'bad syntax on line 1' >&2; exit 2".to_string()]);
    let project = ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_provider_spec("template", spec)
        .with_template("homepage", "index.html", "ok")
        .with_file("homepage/styles/index.styl", "body {")
        .build()
        .unwrap();

    pagewright(&project)
        .args(["render", "homepage/index.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Command failed"))
        .stderr(predicate::str::contains("bad syntax on line 1"));
}
