use assert_cmd::Command;
use backlog_domain::{IssueRecord, SprintRecord};
use backlog_persistence::{RecordStore, SqliteStore};
use chrono::Utc;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const ENV_VARS: &[&str] = &[
    "BACKLOG_CONFIG",
    "BACKLOG_DB",
    "BACKLOG_DEBUG_LOG",
    "JIRA_BASE_URL",
    "JIRA_EMAIL",
    "JIRA_API_TOKEN",
    "JIRA_MAX_RETRIES",
    "JIRA_TIMEOUT_SECS",
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "OPENAI_MODEL",
];

const UNREACHABLE_JIRA: &str = r#"
[jira]
base_url = "http://127.0.0.1:1"
email = "dev@example.com"
api_token = "fake-token"
timeout_secs = 2
max_retries = 0
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(config: &str) -> Self {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("backlog.db")
    }

    fn backlog(&self) -> Command {
        let mut cmd = Command::cargo_bin("backlog").unwrap();
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd.args([
            "--config",
            self.config().to_str().unwrap(),
            "--db",
            self.db().to_str().unwrap(),
        ]);
        cmd
    }
}

fn parse_json_output(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("Failed to parse JSON output")
}

fn run_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    parse_json_output(&output)
}

fn run_failure(cmd: &mut Command) -> Value {
    let output = cmd.assert().failure().code(1).get_output().stderr.clone();
    let stderr = String::from_utf8_lossy(&output);
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.starts_with('{'))
        .expect("no JSON error line on stderr");
    serde_json::from_str(line).unwrap()
}

fn seed(db: &Path) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let store = SqliteStore::new(db);
        store
            .upsert_board_sprints(
                3,
                &[
                    SprintRecord::new(54, "Sprint 54", "closed"),
                    SprintRecord::new(55, "Sprint 55", "active"),
                ],
            )
            .await
            .unwrap();
        let sprint = store.find_sprint(55).await.unwrap().unwrap();
        store
            .replace_sprint_issues(
                sprint.id,
                &[
                    IssueRecord::new("A-1", "Fix bug"),
                    IssueRecord::new("A-2", "Sub task").subtask_of("A-1"),
                ],
                Utc::now(),
            )
            .await
            .unwrap();
    });
}

fn seed_summary(db: &Path, jira_id: i64, text: &str) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let store = SqliteStore::new(db);
        let sprint = store.find_sprint(jira_id).await.unwrap().unwrap();
        store.store_summary(sprint.id, text, Utc::now()).await.unwrap();
    });
}

#[test]
fn test_completions() {
    let ws = Workspace::new("");
    ws.backlog()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backlog"));
}

#[test]
fn test_uncached_sprint_is_not_found() {
    let ws = Workspace::new(UNREACHABLE_JIRA);
    let json = run_failure(ws.backlog().args(["sprint", "issues", "--id", "55"]));

    assert_eq!(json["success"], false);
    assert_eq!(json["class"], "not_found");
    assert!(json["error"].as_str().unwrap().contains("55"));
}

#[test]
fn test_unreachable_jira_is_upstream_failure() {
    let ws = Workspace::new(UNREACHABLE_JIRA);
    let json = run_failure(ws.backlog().args(["board", "sprints", "--board-id", "3"]));

    assert_eq!(json["class"], "upstream_failure");
}

#[test]
fn test_missing_jira_config_is_internal() {
    let ws = Workspace::new("");
    let json = run_failure(ws.backlog().args(["sprint", "issues", "--id", "55", "--refresh"]));

    assert_eq!(json["class"], "internal");
    assert!(json["error"].as_str().unwrap().contains("JIRA_BASE_URL"));
}

#[test]
fn test_missing_explicit_config_file() {
    let ws = Workspace::new("");
    let mut cmd = Command::cargo_bin("backlog").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    let missing = ws.dir.path().join("absent.toml");
    let json = run_failure(cmd.args([
        "--config",
        missing.to_str().unwrap(),
        "board",
        "sprints",
        "--board-id",
        "3",
    ]));

    assert_eq!(json["class"], "internal");
}

#[test]
fn test_cached_board_sprints_without_remote() {
    let ws = Workspace::new(UNREACHABLE_JIRA);
    seed(&ws.db());

    let json = run_stdout(ws.backlog().args(["board", "sprints", "--board-id", "3"]));

    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["count"], 2);
    let items = json["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["jira_id"], 54);
    assert_eq!(items[1]["jira_id"], 55);
    assert_eq!(items[1]["state"], "active");
    assert_eq!(items[1]["board_id"], 3);
    assert!(items[0]["issues_synced"].is_null());
    assert!(items[1]["issues_synced"].is_string());
}

#[test]
fn test_cached_sprint_issues_without_remote() {
    let ws = Workspace::new(UNREACHABLE_JIRA);
    seed(&ws.db());

    let json = run_stdout(ws.backlog().args(["sprint", "issues", "--id", "55"]));

    let data = &json["data"];
    assert_eq!(data["jira_id"], 55);
    assert_eq!(data["name"], "Sprint 55");
    assert_eq!(data["board_id"], 3);
    assert!(data["issues_synced"].is_string());
    assert!(data["summary_updated"].is_null());
    let issues = data["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0]["jira_key"], "A-1");
    assert_eq!(issues[0]["is_subtask"], false);
    assert!(issues[0]["parent_key"].is_null());
    assert_eq!(issues[1]["jira_key"], "A-2");
    assert_eq!(issues[1]["is_subtask"], true);
    assert_eq!(issues[1]["parent_key"], "A-1");
}

#[test]
fn test_refresh_bypasses_cache() {
    let ws = Workspace::new(UNREACHABLE_JIRA);
    seed(&ws.db());

    let json = run_failure(ws.backlog().args(["sprint", "issues", "--id", "55", "--refresh"]));
    assert_eq!(json["class"], "upstream_failure");

    // The failed refresh left the cached backlog intact.
    let json = run_stdout(ws.backlog().args(["sprint", "issues", "--id", "55"]));
    assert_eq!(json["data"]["issues"].as_array().unwrap().len(), 2);
}

#[test]
fn test_summary_without_api_key_is_dependency_failure() {
    let ws = Workspace::new(UNREACHABLE_JIRA);
    seed(&ws.db());

    let json = run_failure(ws.backlog().args(["sprint", "summary", "--id", "55"]));

    assert_eq!(json["class"], "dependency_failure");
    assert!(json["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
}

#[test]
fn test_cached_summary_served_without_api_key() {
    let ws = Workspace::new(UNREACHABLE_JIRA);
    seed(&ws.db());
    seed_summary(&ws.db(), 55, "1) Fix bug");

    let json = run_stdout(ws.backlog().args(["sprint", "summary", "--id", "55"]));

    assert_eq!(json["data"]["sprint_id"], 55);
    assert_eq!(json["data"]["summary"], "1) Fix bug");
}
