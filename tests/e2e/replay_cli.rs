use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const EVENTS: &str = r#"[{"kind": "add_dir", "path": "/proj"}, {"kind": "add_file", "path": "/proj/a.txt", "text": "one\n"}]

[{"kind": "add_dir", "path": "/proj/src"}, {"kind": "add_file", "path": "/proj/src/lib.rs", "text": "pub fn f() {}\n"}, {"kind": "add_file", "path": "/proj/logo.png", "bytes": [137, 80, 78, 71, 0, 0]}]
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("events.jsonl"), EVENTS).unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"work_dir": "/proj"}"#).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn replay(&self, saves: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fsmirror"));
        cmd.arg("replay")
            .arg(self.path("events.jsonl"))
            .arg("--config")
            .arg(self.path("config.json"))
            .arg("--log-file")
            .arg(self.path("fsmirror.log"));
        for save in saves {
            cmd.arg("--save").arg(save);
        }
        cmd.output().unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn snapshot_keys(stdout: &str) -> Vec<String> {
    // The snapshot is the pretty-printed JSON object leading the output
    let end = stdout.find("\n}\n").unwrap() + 2;
    let snapshot: serde_json::Value = serde_json::from_str(&stdout[..end]).unwrap();
    snapshot.as_object().unwrap().keys().cloned().collect()
}

#[test]
fn test_replay_prints_snapshot_and_modifications() {
    let ws = Workspace::new();
    let output = ws.replay(&["/proj/a.txt=two\n"]);
    let out = stdout(&output);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        snapshot_keys(&out),
        vec!["/proj", "/proj/a.txt", "/proj/logo.png", "/proj/src", "/proj/src/lib.rs"]
    );
    assert!(out.contains("files: 3\n"), "{out}");
    assert!(out.contains("<file_modifications>"), "{out}");
    assert!(out.contains("/proj/a.txt"));
}

#[test]
fn test_replay_without_saves_reports_no_modifications() {
    let ws = Workspace::new();
    let output = ws.replay(&[]);
    let out = stdout(&output);

    assert!(output.status.success());
    assert!(out.contains("files: 3\n"));
    assert!(out.trim_end().ends_with("no modifications"), "{out}");
}

#[test]
fn test_failed_save_still_prints_snapshot_and_exits_nonzero() {
    let ws = Workspace::new();
    let output = ws.replay(&["/etc/hosts=127.0.0.1", "/proj/a.txt=two\n"]);
    let out = stdout(&output);
    let err = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(out.contains("files: 3\n"), "{out}");
    assert!(out.contains("<file_modifications>"));
    assert!(err.contains("1 of 2 saves failed"), "{err}");
}

#[test]
fn test_malformed_events_file_is_rejected() {
    let ws = Workspace::new();
    std::fs::write(ws.path("events.jsonl"), "[{\"kind\": \"add_dir\"}]\n").unwrap();
    let output = ws.replay(&[]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains(":1: invalid event batch"), "{err}");
}

#[test]
fn test_dump_config_reflects_config_file() {
    let ws = Workspace::new();
    let output = Command::new(env!("CARGO_BIN_EXE_fsmirror"))
        .arg("dump-config")
        .arg("--config")
        .arg(ws.path("config.json"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let config: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["work_dir"], "/proj");
    assert_eq!(config["buffer_window_ms"], 100);
}
