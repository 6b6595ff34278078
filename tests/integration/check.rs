//! Integration tests for `sitegen check`

use predicates::prelude::*;
use sitegen::test_utils::TestSite;

use super::sitegen;

#[test]
fn test_check_clean_templates() {
    let site = TestSite::new().unwrap();
    site.add_template("index.html", "{{%if a:\n{{%for x in xs:\n{{$x}}\n%}}\n%}}").unwrap();
    site.add_template("partials/nav.html", "<nav>{{$title}}</nav>").unwrap();

    sitegen(&site)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checked 2 templates (0 warnings)"));
}

#[test]
fn test_check_reports_nesting_errors() {
    let site = TestSite::new().unwrap();
    site.add_template("good.html", "plain").unwrap();
    site.add_template("stray.html", "text\n%}}").unwrap();
    site.add_template("weird.html", "{{%while x:").unwrap();

    sitegen(&site)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("stray.html"))
        .stdout(predicate::str::contains("unrecognized directive"))
        .stderr(predicate::str::contains("1 of 3 templates have errors"));
}

#[test]
fn test_check_missing_directory() {
    let site = TestSite::new().unwrap();

    sitegen(&site)
        .args(["check", "--templates", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}
