//! CLI File Round-Trip Tests
//!
//! Runs parsed commands against store, universe and config files in a
//! temporary directory and inspects the files afterwards.

use std::path::{Path, PathBuf};

use clap::Parser;
use fieldguard::cli::{run_command, Cli, CliError};
use fieldguard::config::EngineConfig;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::write(
            ws.universe_path(),
            json!({
                "deadlines": {
                    "application_close": "2999-01-01T00:00:00Z",
                    "confirmation_close": "2999-02-01T00:00:00Z"
                },
                "limits": {"max_confirmed": 100},
                "counters": {"confirmed": 0}
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            ws.config_path(),
            json!({
                "store_path": ws.store_path(),
                "universe_path": ws.universe_path(),
                "generic_denial_message": "Request refused"
            })
            .to_string(),
        )
        .unwrap();
        ws
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn store_path(&self) -> PathBuf {
        self.path("store.json")
    }

    fn universe_path(&self) -> PathBuf {
        self.path("universe.json")
    }

    fn config_path(&self) -> PathBuf {
        self.path("fieldguard.json")
    }

    fn seed(&self, users: Value) {
        std::fs::write(self.store_path(), json!({"user": users}).to_string()).unwrap();
    }

    fn users(&self) -> Vec<Value> {
        read_json(&self.store_path())["user"].as_array().cloned().unwrap_or_default()
    }

    async fn run(&self, args: &[&str]) -> Result<(), CliError> {
        let config_path = self.config_path();
        let mut full = vec!["fieldguard", "--config", config_path.to_str().unwrap()];
        full.extend_from_slice(args);

        let cli = Cli::try_parse_from(full).unwrap();
        let config = EngineConfig::load(&cli.config).unwrap();
        run_command(cli, config).await
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn applicant() -> Value {
    json!({
        "_id": "u1",
        "email": "ada@example.com",
        "roles": {"hacker": true},
        "status": {"applied": false, "accepted": false},
        "application": {}
    })
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_config_points_at_workspace_files() {
    let ws = Workspace::new();
    let config = EngineConfig::load(&ws.config_path()).unwrap();

    assert_eq!(config.store_path, ws.store_path());
    assert_eq!(config.universe_path, ws.universe_path());
    assert_eq!(config.generic_denial_message, "Request refused");
    assert_eq!(config.default_page_size, 50);
}

/// A create by an admin lands in the store file.
#[tokio::test]
async fn test_create_saves_store() {
    let ws = Workspace::new();

    ws.run(&[
        "--user-id",
        "a1",
        "--role",
        "admin",
        "create",
        "--type",
        "user",
        "--submission",
        r#"{"email": "new@example.com", "roles": {"hacker": true}}"#,
    ])
    .await
    .unwrap();

    let users = ws.users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], json!("new@example.com"));
    assert!(users[0]["_id"].is_string());
}

/// The owner's draft is persisted while the application window is open.
#[tokio::test]
async fn test_owner_update_saves_store() {
    let ws = Workspace::new();
    ws.seed(json!([applicant()]));

    ws.run(&[
        "update",
        "--type",
        "user",
        "--filter",
        r#"{"_id": "u1"}"#,
        "--submission",
        r#"{"application": {"first_name": "Ada"}}"#,
        "--user-id",
        "u1",
        "--role",
        "hacker",
    ])
    .await
    .unwrap();

    assert_eq!(ws.users()[0]["application"], json!({"first_name": "Ada"}));
}

/// A refused write reports the error code and leaves the file untouched.
#[tokio::test]
async fn test_refused_update_leaves_store() {
    let ws = Workspace::new();
    ws.seed(json!([applicant()]));
    let before = read_json(&ws.store_path());

    let err = ws
        .run(&[
            "--user-id",
            "u1",
            "--role",
            "hacker",
            "update",
            "--type",
            "user",
            "--filter",
            r#"{"_id": "u1"}"#,
            "--submission",
            r#"{"status": {"accepted": true}}"#,
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::RequestFailed("FG_WRITE_DENIED")));
    assert_eq!(read_json(&ws.store_path()), before);
}

/// Reads never write the store file.
#[tokio::test]
async fn test_read_does_not_create_store() {
    let ws = Workspace::new();

    ws.run(&["--role", "admin", "--user-id", "a1", "read", "--type", "user", "--filter", "{}"])
        .await
        .unwrap();

    assert!(!ws.store_path().exists());
}

/// Deletes by an admin remove the document from the file.
#[tokio::test]
async fn test_delete_saves_store() {
    let ws = Workspace::new();
    ws.seed(json!([applicant(), {"_id": "u2", "email": "bob@example.com"}]));

    ws.run(&[
        "--user-id",
        "a1",
        "--role",
        "admin",
        "delete",
        "--type",
        "user",
        "--filter",
        r#"{"_id": "u1"}"#,
    ])
    .await
    .unwrap();

    let users = ws.users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["_id"], json!("u2"));
}

/// Unknown object types fail before any file is touched.
#[tokio::test]
async fn test_unknown_type_fails() {
    let ws = Workspace::new();

    let err = ws
        .run(&["--role", "admin", "read", "--type", "ghost", "--filter", "{}"])
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::RequestFailed("FG_INVALID_OBJECT_TYPE")));
    assert!(!ws.store_path().exists());
}
