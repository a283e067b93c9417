//! Integration tests for the `pagewright render` command.

use pagewright::provider::ProviderSpec;
use pagewright::test_utils::{ProjectBuilder, TestProject};
use predicates::prelude::*;

use super::pagewright;

fn site() -> TestProject {
    ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_provider("template", "css_link")
        .with_provider("template", "js_link")
        .with_template(
            "homepage",
            "base.html",
            "<head>{{ links.styles | safe }}</head><body>{% block body %}{% endblock %}{{ links.scripts | safe }}</body>",
        )
        .with_template(
            "homepage",
            "index.html",
            r#"{% extends "homepage/base.html" %}{% block body %}<h1>{{ title }}</h1>{% endblock %}"#,
        )
        .with_style("homepage", "base")
        .with_style("homepage", "index")
        .with_script("homepage", "index")
        .build()
        .unwrap()
}

#[test]
fn test_render_prints_html_with_links() {
    let project = site();

    let output = pagewright(&project)
        .args(["render", "homepage/index.html", "--var", "title=Welcome"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let html = String::from_utf8(output.stdout).unwrap();
    let base = html.find(r#"href="/static/homepage/styles/base.css?"#).unwrap();
    let index = html.find(r#"href="/static/homepage/styles/index.css?"#).unwrap();
    assert!(base < index);
    assert!(html.contains(r#"<script src="/static/homepage/scripts/index.js?"#));
    assert!(html.contains("<h1>Welcome</h1>"));
}

#[test]
fn test_render_to_file() {
    let project = site();

    pagewright(&project)
        .args(["render", "homepage/index.html", "--output", "out/index.html"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(project.read("out/index.html").unwrap().contains("<head><link rel=\"stylesheet\""));
}

#[test]
fn test_render_unknown_template() {
    let project = site();

    pagewright(&project)
        .args(["render", "homepage/missing.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template 'homepage/missing.html' not found"));
}

#[test]
fn test_render_unknown_provider_kind() {
    let project = ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_provider("template", "compile_stylus")
        .with_template("homepage", "index.html", "hi")
        .build()
        .unwrap();

    pagewright(&project)
        .args(["render", "homepage/index.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown provider kind 'compile_stylus'"));
}

#[test]
fn test_render_inheritance_cycle() {
    let project = ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_template("homepage", "a.html", r#"{% extends "homepage/b.html" %}"#)
        .with_template("homepage", "b.html", r#"{% extends "homepage/a.html" %}"#)
        .build()
        .unwrap();

    pagewright(&project)
        .args(["render", "homepage/a.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("inheritance cycle"));
}

#[test]
fn test_render_missing_compile_option() {
    let project = ProjectBuilder::new()
        .unwrap()
        .with_app("homepage")
        .with_provider_spec(
            "template",
            ProviderSpec {
                kind: "compile".to_string(),
                sourcepath: Some("{app}/styles/{template}.styl".to_string()),
                ..ProviderSpec::default()
            },
        )
        .with_template("homepage", "index.html", "hi")
        .build()
        .unwrap();

    pagewright(&project)
        .args(["render", "homepage/index.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must set `targetpath`"));
}

#[test]
fn test_render_rejects_malformed_settings() {
    let project = site();
    project.write("pagewright.toml", "base_dir = \".\"\nunknown_key = 1\n").unwrap();

    pagewright(&project).args(["render", "homepage/index.html"]).assert().failure();
}
