//! Integration tests for `sitegen render`

use predicates::prelude::*;
use sitegen::test_utils::TestSite;

use super::sitegen;

fn site_with_templates() -> TestSite {
    let site = TestSite::new().unwrap();
    site.add_template("greeting.html", "<p>Hello {{$name}}!</p>").unwrap();
    site.add_template(
        "list.html",
        "{{%for label, count in items:\n{{$label}}: {{$count}}\n%}}",
    )
    .unwrap();
    site.add_template(
        "card.html",
        "<div>{{#include greeting: {\"name\": \"card\"} #}}</div>\n<p>{{$name}}</p>",
    )
    .unwrap();
    site
}

#[test]
fn test_render_to_stdout() {
    let site = site_with_templates();

    sitegen(&site)
        .args(["render", "greeting", "--var", "name=World", "--document", "none"])
        .assert()
        .success()
        .stdout("<p>Hello World!</p>\n");
}

#[test]
fn test_render_html_frame() {
    let site = site_with_templates();

    sitegen(&site)
        .args(["render", "greeting.html", "--var", "name=You"])
        .assert()
        .success()
        .stdout("<!DOCTYPE html>\n<p>Hello You!</p>\n");
}

#[test]
fn test_render_data_file() {
    let site = site_with_templates();
    site.add_file("items.yaml", "items:\n  - [apples, 3]\n  - [pears, 5]\n").unwrap();

    sitegen(&site)
        .args(["render", "list", "--data", "items.yaml", "--document", "none"])
        .assert()
        .success()
        .stdout("apples: 3\npears: 5\n");
}

#[test]
fn test_render_include_overrides_are_scoped() {
    let site = site_with_templates();

    sitegen(&site)
        .args(["render", "card", "--var", "name=outer", "--document", "none"])
        .assert()
        .success()
        .stdout("<div><p>Hello card!</p></div>\n<p>outer</p>\n");
}

#[test]
fn test_render_unresolved_variable_warns() {
    let site = site_with_templates();

    sitegen(&site)
        .args(["render", "greeting", "--var", "nmae=World", "--document", "none"])
        .assert()
        .success()
        .stdout("<p>Hello !</p>\n")
        .stderr(predicate::str::contains("unresolved variable"));
}

#[test]
fn test_render_to_file() {
    let site = site_with_templates();
    let output = site.root.join("out/greeting.xml");

    sitegen(&site)
        .args(["render", "greeting", "--var", "name=Feed", "--document", "xml", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rendered 'greeting'"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(written.ends_with("<p>Hello Feed!</p>\n"));
}

#[test]
fn test_render_failure_leaves_output_untouched() {
    let site = site_with_templates();
    site.add_template("broken.html", "ok\n{{%for x in xs:\n{{$x}}").unwrap();
    let output = site.add_file("out/broken.html", "previous").unwrap();

    sitegen(&site)
        .args(["render", "broken", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("template 'broken'"));

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous");
}

#[test]
fn test_render_missing_template() {
    let site = site_with_templates();

    sitegen(&site)
        .args(["render", "nope"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_render_invalid_var() {
    let site = site_with_templates();

    sitegen(&site)
        .args(["render", "greeting", "--var", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid variable 'novalue'"));
}
