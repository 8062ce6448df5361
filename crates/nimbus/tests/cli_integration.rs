//! CLI integration tests for the nimbus command-line interface.
//!
//! Parsing and help tests need nothing. The end-to-end tests drive a canned
//! tool server written as a shell script, so they only run on Unix.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the nimbus binary, isolated from the user's config.
fn nimbus(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nimbus").unwrap();
    cmd.env("NIMBUS_CONFIG_DIR", config_dir.path())
        .env_remove("NIMBUS_CONFIG")
        .env_remove("GOOGLE_AI_API_KEY")
        .current_dir(config_dir.path());
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nimbus"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nimbus"));
}

#[test]
fn test_global_flags_accepted() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir)
        .args(["--verbose", "--no-llm", "--help"])
        .assert()
        .success();
}

#[test]
fn test_ask_requires_prompt() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir)
        .arg("ask")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PROMPT"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir).arg("forecast").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_shows_defaults() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("No config files loaded"))
        .stdout(predicate::str::contains("command = \"python3\""))
        .stdout(predicate::str::contains("# API key: not set"));
}

#[test]
fn test_config_masks_api_key() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("nimbus.toml"),
        "[llm]\napi_key = \"AIza-very-secret\"\n",
    )
    .unwrap();

    nimbus(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("nimbus.toml"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("AIza-very-secret").not());
}

#[test]
fn test_config_path() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir)
        .args(["--config", "/nonexistent/nimbus.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_llm_flag_without_key_fails() {
    let dir = TempDir::new().unwrap();
    nimbus(&dir)
        .args(["--llm", "ask", "Seattle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_AI_API_KEY"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Server Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unlaunchable_server_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("nimbus.toml"),
        "[server]\ncommand = \"nimbus-no-such-server\"\nargs = []\ncwd = \".\"\n",
    )
    .unwrap();

    nimbus(&dir)
        .args(["--no-llm", "tools"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect to weather server"));
}

#[cfg(unix)]
mod canned_server {
    use super::*;

    /// Answers the handshake, `tools/list` and one `tools/call` in order,
    /// after a non-protocol banner line.
    const SCRIPT: &str = r#"echo 'SERVER STARTING...'
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"canned","version":"1.0.0"}}}'
echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"get_forecast","description":"Get weather forecast for a location.","inputSchema":{}}]}}'
echo '{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"Sunny, high near 72F"}]}}'
cat > /dev/null
"#;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("server.sh"), SCRIPT).unwrap();
        std::fs::write(
            dir.path().join("nimbus.toml"),
            "[server]\nname = \"canned\"\ncommand = \"sh\"\nargs = [\"server.sh\"]\ncwd = \".\"\nstartup_timeout_secs = 5\nrequest_timeout_secs = 5\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_tools_lists_server_tools() {
        let dir = setup();
        nimbus(&dir)
            .args(["--no-llm", "tools"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "- get_forecast: Get weather forecast for a location.",
            ));
    }

    #[test]
    fn test_tools_json_shows_adapted_schema() {
        let dir = setup();
        let output = nimbus(&dir)
            .args(["--no-llm", "tools", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let tools: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(tools[0]["name"], "get_forecast");
        assert_eq!(
            tools[0]["parameters"],
            serde_json::json!({"type": "object", "properties": {}})
        );
    }

    #[test]
    fn test_ask_forecast() {
        let dir = setup();
        nimbus(&dir)
            .args(["--no-llm", "ask", "What's the weather in Seattle?"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "🌤️ Weather forecast for Seattle:\n\nSunny, high near 72F",
            ));
    }

    #[test]
    fn test_ask_unknown_city_shows_guidance() {
        let dir = setup();
        nimbus(&dir)
            .args(["--no-llm", "ask", "weather in London"])
            .assert()
            .success()
            .stdout(predicate::str::contains("City not found"));
    }

    #[test]
    fn test_chat_help_and_quit() {
        let dir = setup();
        nimbus(&dir)
            .args(["--no-llm", "chat"])
            .write_stdin("/help\n/tools\n/quit\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Available weather tools: get_forecast"))
            .stdout(predicate::str::contains("👋 Goodbye!"));
    }
}
