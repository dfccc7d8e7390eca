use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

use sheetwright::workspace::Workspace;

use super::fixtures::{CLIENTS_CSV, TASKS_CSV, WORKERS_CSV};

/// Offline config so tests never reach a model endpoint
const OFFLINE_CONFIG: &str = r#"---
project:
  name: test-project
ai:
  provider: offline
---

# Test Config
"#;

/// TestHarness provides an isolated, initialized workspace in a temp directory.
///
/// The binary runs with HOME pointed at the temp directory so no global
/// config leaks in.
pub struct TestHarness {
    pub dir: TempDir,
    pub workspace: Workspace,
    pub binary: PathBuf,
}

impl TestHarness {
    /// Initialized workspace with the offline AI provider
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let workspace =
            Workspace::init(dir.path(), "test-project", false).expect("Failed to init workspace");
        fs::write(workspace.config_path(), OFFLINE_CONFIG).expect("Failed to write config");

        TestHarness {
            dir,
            workspace,
            binary: PathBuf::from(env!("CARGO_BIN_EXE_sheetwright")),
        }
    }

    /// Workspace with the three sample files imported through the CLI
    #[allow(dead_code)]
    pub fn with_sample_data() -> Self {
        let harness = Self::new();
        let clients = harness.write_file("clients.csv", CLIENTS_CSV);
        let workers = harness.write_file("workers.csv", WORKERS_CSV);
        let tasks = harness.write_file("tasks.csv", TASKS_CSV);

        let output = harness
            .run(&[
                "import",
                clients.to_str().unwrap(),
                workers.to_str().unwrap(),
                tasks.to_str().unwrap(),
            ])
            .expect("Failed to run import");
        assert!(output.status.success(), "import failed: {}", stderr(&output));
        harness
    }

    /// Returns the base directory path (the TempDir path).
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the temp directory and return its path
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    #[allow(dead_code)]
    /// Executes the sheetwright binary with the given arguments in the harness directory.
    pub fn run(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(&self.binary)
            .args(args)
            .current_dir(self.path())
            .env("HOME", self.path())
            .env_remove("SHEETWRIGHT_QUIET")
            .env_remove("SHEETWRIGHT_LOG")
            .env_remove("GEMINI_API_KEY")
            .env_remove("OPENAI_API_KEY")
            .output()
    }
}

#[allow(dead_code)]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[allow(dead_code)]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
