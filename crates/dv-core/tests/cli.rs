//! CLI tests for the `dv` binary.
//!
//! These run the binary over the demo data set and check output and exit
//! codes.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a Command for the dv binary.
fn dv() -> Command {
    let mut cmd = Command::cargo_bin("dv").expect("dv binary should exist");
    cmd.env_remove("DV_CONFIG")
        .env_remove("RUST_LOG")
        .env("DV_LOG", "off");
    cmd
}

// ============================================================================
// Help
// ============================================================================

mod help {
    use super::*;

    #[test]
    fn help_lists_commands() {
        dv().arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("render"))
            .stdout(predicate::str::contains("fragment"))
            .stdout(predicate::str::contains("routes"))
            .stdout(predicate::str::contains("--log-format"));
    }

    #[test]
    fn version_flag_works() {
        dv().arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("dv"));
    }

    #[test]
    fn unknown_command_fails() {
        dv().arg("explode")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}

// ============================================================================
// Rendering
// ============================================================================

mod render {
    use super::*;
    use std::io::Write;

    #[test]
    fn render_company_page() {
        dv().args(["render", "companies.company", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Acme Corporation"))
            .stdout(predicate::str::contains("lazy-panel"))
            .stdout(predicate::str::contains(
                "/admin/companies/company/1/lazy/contacts/",
            ));
    }

    #[test]
    fn render_escapes_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nminify = false").unwrap();

        dv().arg("--config")
            .arg(file.path())
            .args(["render", "companies.company", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Globex &amp; Partners"))
            .stdout(predicate::str::contains("Globex & Partners").not());
    }

    #[test]
    fn render_missing_object_is_not_found() {
        dv().args(["render", "companies.company", "999"])
            .assert()
            .code(12)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn render_rejects_malformed_type_key() {
        dv().args(["render", "company", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("<app>.<model>"));
    }

    #[test]
    fn fragment_prints_table_only() {
        dv().args(["fragment", "companies.company", "1", "contacts"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Contact 10 of Acme Corporation"))
            .stdout(predicate::str::contains("Contact 11 of Acme Corporation").not())
            .stdout(predicate::str::contains("<!DOCTYPE html>").not());
    }

    #[test]
    fn fragment_unknown_key_is_not_found() {
        dv().args(["fragment", "companies.company", "1", "orders"])
            .assert()
            .code(12)
            .stderr(predicate::str::contains("lazy_orders"));
    }
}

// ============================================================================
// Inspection
// ============================================================================

mod inspect {
    use super::*;
    use std::io::Write;

    #[test]
    fn routes_lists_both_types() {
        dv().arg("routes")
            .assert()
            .success()
            .stdout(predicate::str::contains("companies_company_detail"))
            .stdout(predicate::str::contains(
                "/admin/companies/contact/<id>/lazy/<fragment_key>/",
            ));
    }

    #[test]
    fn routes_json_is_valid() {
        let output = dv().args(["routes", "--json"]).output().unwrap();
        assert!(output.status.success());
        let routes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(routes.as_array().unwrap().len(), 4);
    }

    #[test]
    fn config_prints_defaults() {
        dv().arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("namespace = \"admin\""))
            .stdout(predicate::str::contains("default_table_limit = 10"));
    }

    #[test]
    fn config_file_changes_namespace() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "namespace = \"backoffice\"").unwrap();

        dv().arg("--config")
            .arg(file.path())
            .args(["render", "companies.company", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "/backoffice/companies/company/1/lazy/contacts/",
            ));
    }

    #[test]
    fn invalid_config_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "namespace = \"a/b\"").unwrap();

        dv().arg("--config")
            .arg(file.path())
            .arg("config")
            .assert()
            .code(11)
            .stderr(predicate::str::contains("namespace"));
    }

    #[test]
    fn missing_config_file_fails() {
        dv().args(["--config", "/nonexistent/dv.toml", "config"])
            .assert()
            .code(11);
    }
}
