//! Integration tests for the `drugdb` binary.
//!
//! Commands that need a backend run against the mock server on a random
//! port; the rest point at a closed port and check offline behaviour.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("drugdb"));
    // Keep the developer's .env and shell settings out of the tests.
    for key in [
        "DRUGDB_API_URL",
        "DRUGDB_API_TIMEOUT",
        "DRUGDB_HEALTH_TIMEOUT",
        "DRUGDB_ITEMS_PER_PAGE",
        "DRUGDB_MAX_SEARCH_RESULTS",
        "DRUGDB_ENABLE_DEBUG_LOGS",
        "DRUGDB_ENABLE_MOCK_DATA_FALLBACK",
        "DRUGDB_ENVIRONMENT",
        "DRUGDB_APP_NAME",
        "DRUGDB_APP_VERSION",
        "RUST_LOG",
    ] {
        cmd.env_remove(key);
    }
    cmd.current_dir(std::env::temp_dir());
    cmd
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_seeded(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Browse and manage the drug database"));
}

#[test]
fn test_invalid_config_lists_every_violation() {
    cli()
        .args(["categories", "--api-url", "ftp://example"])
        .env("DRUGDB_ITEMS_PER_PAGE", "0")
        .env("DRUGDB_API_TIMEOUT", "soon")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration validation failed"))
        .stderr(predicate::str::contains("API URL must start with http:// or https://"))
        .stderr(predicate::str::contains("Items per page must be between 1 and 100"))
        .stderr(predicate::str::contains("API timeout must be a whole number"));
}

#[test]
fn test_health_reports_unavailable_backend() {
    cli()
        .args(["health", "--api-url", closed_port_url().as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Backend API is not available"));
}

#[test]
fn test_health_reports_running_backend() {
    cli()
        .args(["health", "--api-url", start_server().as_str()])
        .env("DRUGDB_APP_NAME", "Formulary")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Formulary "))
        .stdout(predicate::str::contains("Backend API is connected and running"));
}

#[test]
fn test_add_with_missing_fields_never_calls_backend() {
    cli()
        .args(["add", "--api-url", closed_port_url().as_str(), "--name", "Aspirin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Add New Drug"))
        .stderr(predicate::str::contains("Category is required"))
        .stderr(predicate::str::contains("At least one dosage form is required"))
        .stderr(predicate::str::contains("Connection Error").not());
}

#[test]
fn test_list_offline_shows_connection_error() {
    cli()
        .args(["list", "--api-url", closed_port_url().as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Cannot connect to the API server. Please ensure the backend is running.",
        ));
}

#[test]
fn test_list_offline_falls_back_to_sample_data() {
    cli()
        .args(["list", "--api-url", closed_port_url().as_str(), "--name", "ibu"])
        .env("DRUGDB_ENABLE_MOCK_DATA_FALLBACK", "true")
        .assert()
        .success()
        .stderr(predicate::str::contains("Showing sample data"))
        .stdout(predicate::str::contains("Ibuprofen"))
        .stdout(predicate::str::contains("Metformin").not());
}

#[test]
fn test_list_and_show_against_server() {
    let url = start_server();
    cli()
        .args(["list", "--api-url", url.as_str(), "--category", "cardio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lisinopril"));

    cli()
        .args(["show", "metformin", "--api-url", url.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Metformin (metformin)"))
        .stdout(predicate::str::contains("Category: Antidiabetic"));
}

#[test]
fn test_add_edit_delete_round_trip() {
    let url = start_server();
    cli()
        .args([
            "add", "--api-url", url.as_str(),
            "--name", "Cetirizine",
            "--new-category", "Antihistamines",
            "--description", "Allergy relief",
            "--ingredient", "Cetirizine hydrochloride",
            "--dosage-form", "Tablet",
            "--dosage-form", "Syrup",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cetirizine has been added."))
        .stdout(predicate::str::contains("Dosage forms: Tablet, Syrup"))
        .stdout(predicate::str::contains("Side effects").not());

    cli()
        .args(["edit", "cetirizine", "--api-url", url.as_str(), "--description", "Non-drowsy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cetirizine has been updated."))
        .stdout(predicate::str::contains("Non-drowsy"));

    cli()
        .args(["delete", "cetirizine", "--api-url", url.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cetirizine has been deleted successfully."));

    cli()
        .args(["show", "cetirizine", "--api-url", url.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Drug not found. It may have already been deleted."));
}
