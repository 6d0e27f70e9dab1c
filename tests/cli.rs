//! Integration tests for the `kanban` binary.

mod common;

use std::sync::Arc;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `kanban` command isolated from the caller's config and environment.
fn kanban(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("kanban");
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("KANBAN_API_URL")
        .env_remove("KANBAN_TOKEN")
        .env_remove("KANBAN_LOG_FORMAT")
        .env_remove("KANBAN_CROSS_SCOPE_NUMBERING")
        .env_remove("RUST_LOG");
    cmd
}

/// Run a prepared command off the async runtime so the fake API keeps serving.
async fn run(mut cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap()
}

mod cli_basics {
    use super::*;

    #[test]
    fn test_kanban_help() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("move-task"));
    }

    #[test]
    fn test_kanban_version() {
        let dir = TempDir::new().unwrap();
        kanban(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_move_requires_target() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .args(["move-column", "b1", "c1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--to"));
    }
}

mod config_commands {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created kanban.toml"));

        let content = std::fs::read_to_string(dir.path().join(".kanban/kanban.toml")).unwrap();
        assert!(content.contains("[api]"));
        assert!(content.contains("cross_scope_numbering = \"preserve\""));

        kanban(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_show_redacts_token() {
        let dir = TempDir::new().unwrap();
        kanban(&dir)
            .args(["--token", "hunter2", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("********"))
            .stdout(predicate::str::contains("hunter2").not());
    }

    #[test]
    fn test_config_show_reads_env_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "KANBAN_API_URL=http://from-dotenv:9\n").unwrap();
        kanban(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("http://from-dotenv:9"));
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".kanban")).unwrap();
        std::fs::write(
            dir.path().join(".kanban/kanban.toml"),
            "[reorder]\ncross_scope_numbering = \"shuffle\"\n",
        )
        .unwrap();
        kanban(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("kanban.toml"));
    }
}

mod board_commands {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_columns_lists_in_order() {
        let dir = TempDir::new().unwrap();
        let base_url = common::serve(common::seeded()).await;

        let mut cmd = kanban(&dir);
        cmd.args(["--api-url", base_url.as_str(), "columns", "b1"]);
        run(cmd)
            .await
            .success()
            .stdout(predicate::str::contains("Columns of b1"))
            .stdout(predicate::str::contains("Column c3"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_move_column_prints_new_order() {
        let dir = TempDir::new().unwrap();
        let api = common::seeded();
        let base_url = common::serve(Arc::clone(&api)).await;

        let mut cmd = kanban(&dir);
        cmd.args(["--api-url", base_url.as_str(), "--token", "t0k", "move-column", "b1", "c3", "--to", "1"]);
        run(cmd)
            .await
            .success()
            .stdout(predicate::str::contains("now at position 1"));

        assert_eq!(api.column_ids("b1"), vec!["c3", "c1", "c2"]);
        assert_eq!(
            api.auth_headers.lock().unwrap()[0].as_deref(),
            Some("Bearer t0k")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_move_task_json_output() {
        let dir = TempDir::new().unwrap();
        let api = common::seeded();
        let base_url = common::serve(Arc::clone(&api)).await;

        let mut cmd = kanban(&dir);
        cmd.args([
            "--api-url", base_url.as_str(), "--json", "move-task", "b1", "c1", "t1", "--to", "2", "--into",
            "c2",
        ]);
        let output = run(cmd).await.success().get_output().stdout.clone();
        let body: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(body["result"]["outcome"], "committed");
        assert_eq!(body["result"]["entity"]["columnId"], "c2");
        assert_eq!(body["scopes"]["c2"][1]["id"], "t1");
        assert_eq!(api.task_ids("c2"), vec!["u1", "t1"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rejected_move_prints_restored_scope_and_fails() {
        let dir = TempDir::new().unwrap();
        let api = common::seeded();
        api.fail_next(1);
        let base_url = common::serve(Arc::clone(&api)).await;

        let mut cmd = kanban(&dir);
        cmd.args(["--api-url", base_url.as_str(), "move-task", "b1", "c1", "t3", "--to", "1"]);
        run(cmd)
            .await
            .failure()
            .stderr(predicate::str::contains("local order restored"))
            .stderr(predicate::str::contains("database unavailable"))
            .stdout(predicate::str::contains("Task t3"));

        assert_eq!(api.task_ids("c1"), vec!["t1", "t2", "t3"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_out_of_range_rejected_when_configured() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".kanban")).unwrap();
        std::fs::write(
            dir.path().join(".kanban/kanban.toml"),
            "[reorder]\nreject_out_of_range = true\n",
        )
        .unwrap();
        let api = common::seeded();
        let base_url = common::serve(Arc::clone(&api)).await;

        let mut cmd = kanban(&dir);
        cmd.args(["--api-url", base_url.as_str(), "move-column", "b1", "c1", "--to", "9"]);
        run(cmd)
            .await
            .failure()
            .stderr(predicate::str::contains("outside 1..=3"));

        assert!(api.updates.lock().unwrap().is_empty());
    }
}
