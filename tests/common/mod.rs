#![allow(dead_code)]

pub mod fixtures;

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper struct to run ticketdesk commands in an isolated temp directory
pub struct TicketdeskTest {
    pub temp_dir: TempDir,
    binary_path: &'static str,
}

impl TicketdeskTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TicketdeskTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_ticketdesk"),
        }
    }

    /// Write `content` to `name` inside the temp directory and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub fn run(&self, args: &[&str]) -> Output {
        // An explicit config path keeps the user's real config out of the run.
        let config = self.temp_dir.path().join("ticketdesk.yaml");
        Command::new(self.binary_path)
            .args(args)
            .arg("--config")
            .arg(&config)
            .current_dir(self.temp_dir.path())
            .env_remove("TICKETDESK_PAGE_SIZE")
            .env_remove("TICKETDESK_PUSH_CHANNEL")
            .output()
            .expect("Failed to execute ticketdesk command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}
