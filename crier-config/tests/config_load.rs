use crier_config::{CrierConfigLoader, resolve_config_path};
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("crier.yaml");
    fs::write(&path, contents).expect("write config file");
    path
}

#[test]
#[serial]
fn loads_typed_config_from_yaml_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
version: "1"
feed:
  bearer_token: "file-token"
  handles: ["alpha", "beta"]
  page_size: 25
chat:
  bot_token: "bot-token"
  channel_id: "1405060708090100"
monitor:
  interval_secs: 120
  diagnostics: verbose
"#,
    );

    let cfg = CrierConfigLoader::new().with_file(&path).load().unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.version.as_deref(), Some("1"));
    assert_eq!(cfg.feed.page_size, 25);
    assert_eq!(cfg.normalized_handles(), vec!["alpha", "beta"]);
    assert_eq!(cfg.channel_id().unwrap(), 1405060708090100);
    assert_eq!(cfg.interval().as_secs(), 120);
    assert_eq!(
        cfg.monitor.diagnostics,
        crier_config::DiagnosticsLevel::Verbose
    );
}

#[test]
#[serial]
fn environment_overlay_wins_over_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
feed:
  bearer_token: "file-token"
  handles: ["alpha"]
chat:
  bot_token: "bot-token"
  channel_id: "1405060708090100"
monitor:
  interval_secs: 300
"#,
    );

    temp_env::with_var("CRIER_MONITOR__INTERVAL_SECS", Some("45"), || {
        let cfg = CrierConfigLoader::new().with_file(&path).load().unwrap();
        assert_eq!(cfg.interval().as_secs(), 45);
    });
}

#[test]
#[serial]
fn environment_alone_is_a_valid_deployment() {
    temp_env::with_vars(
        [
            ("CRIER_FEED__BEARER_TOKEN", Some("env-token")),
            ("CRIER_FEED__HANDLES", Some("alpha,beta,gamma")),
            ("CRIER_CHAT__BOT_TOKEN", Some("env-bot")),
            ("CRIER_CHAT__CHANNEL_ID", Some("1405060708090100")),
        ],
        || {
            let cfg = CrierConfigLoader::new().load().unwrap();
            cfg.validate().unwrap();
            assert_eq!(cfg.normalized_handles(), vec!["alpha", "beta", "gamma"]);
            assert_eq!(cfg.feed.bearer_token, "env-token");
        },
    );
}

#[test]
#[serial]
fn file_values_expand_from_environment() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
feed:
  bearer_token: "${CRIER_TEST_SECRET}"
  handles: ["alpha"]
chat:
  bot_token: "bot-token"
  channel_id: "1405060708090100"
"#,
    );

    temp_env::with_var("CRIER_TEST_SECRET", Some("expanded-secret"), || {
        let cfg = CrierConfigLoader::new().with_file(&path).load().unwrap();
        assert_eq!(cfg.feed.bearer_token, "expanded-secret");
    });
}

#[test]
fn explicit_config_path_wins() {
    let explicit = Path::new("/tmp/some/other/crier.yaml");
    let resolved = resolve_config_path(Some(explicit)).unwrap();
    assert_eq!(resolved, explicit.to_path_buf());
}
