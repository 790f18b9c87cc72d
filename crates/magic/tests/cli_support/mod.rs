#![allow(dead_code)]

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

pub fn magic_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_magic"))
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("fixtures")
}

pub fn data_models_dir() -> PathBuf {
    fixtures_dir().join("data_models")
}

pub fn contribution_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("contributions").join(name)
}

/// Isolated MAGIC_HOME plus quiet logging.
pub struct CliEnv {
    pub home: TempDir,
    home_str: String,
}

impl CliEnv {
    pub fn new() -> Self {
        let home = TempDir::new().expect("create temp home");
        let home_str = home.path().to_string_lossy().to_string();
        Self { home, home_str }
    }

    pub fn vars(&self) -> [(&str, &str); 2] {
        [("MAGIC_HOME", self.home_str.as_str()), ("RUST_LOG", "error")]
    }
}

pub fn run_cli(args: &[String], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(magic_bin());
    cmd.args(args);
    cmd.env_remove("MAGIC_DATA_MODELS");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute magic CLI")
}

pub fn assert_cli_success(output: &Output, args: &[String]) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn parse_json_output(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout
        .find(|c| c == '{' || c == '[')
        .unwrap_or_else(|| {
            panic!(
                "no JSON payload found in output\nstdout:\n{}\nstderr:\n{}",
                stdout,
                String::from_utf8_lossy(&output.stderr)
            )
        });
    let json_text = &stdout[json_start..];
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    serde_json::Value::deserialize(&mut deserializer).unwrap_or_else(|err| {
        panic!(
            "failed to parse JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

pub fn run_cli_json<T: DeserializeOwned>(args: &[String], envs: &[(&str, &str)]) -> T {
    let output = run_cli(args, envs);
    assert_cli_success(&output, args);
    let value = parse_json_output(&output);
    serde_json::from_value(value).unwrap_or_else(|err| {
        panic!(
            "failed to deserialize JSON output: {}\nstdout:\n{}\nstderr:\n{}",
            err,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

pub fn run_cli_json_error(args: &[String], envs: &[(&str, &str)]) -> serde_json::Value {
    let output = run_cli(args, envs);
    assert!(
        !output.status.success(),
        "command unexpectedly succeeded: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    parse_json_output(&output)
}

pub fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
