//! Common test utilities for CLI integration tests

#![allow(dead_code)]

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tempfile::TempDir;

/// Path of the `catalog` binary built for this test run
pub fn catalog_binary() -> &'static str {
    env!("CARGO_BIN_EXE_catalog")
}

/// Scratch directory for definition and config files
pub struct CliTestContext {
    pub address: String,
    pub test_dir: TempDir,
}

impl CliTestContext {
    /// Context talking to the agent at `address`
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            address: address.into(),
            test_dir: TempDir::new()?,
        })
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(catalog_binary());
        cmd.args(["--address", &self.address]).args(args);
        cmd
    }

    /// Run a CLI command and return its output
    pub fn run_cli_command(&self, args: &[&str]) -> Result<CliOutput> {
        let output = self.command(args).output()?;

        Ok(CliOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
        })
    }

    /// Start a long-running CLI command
    pub fn spawn_cli_command(&self, args: &[&str]) -> Result<Child> {
        Ok(self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?)
    }

    /// Write a file into the test directory
    pub fn create_file(&self, filename: &str, content: &str) -> Result<PathBuf> {
        let path = self.test_dir.path().join(filename);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Get the test directory path
    pub fn test_dir(&self) -> &Path {
        self.test_dir.path()
    }
}

#[derive(Debug)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl CliOutput {
    pub fn from_child(child: Child) -> Result<Self> {
        let output = child.wait_with_output()?;
        Ok(Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
        })
    }

    pub fn assert_success(&self) -> &Self {
        if !self.success {
            panic!(
                "Command failed with exit code {:?}\nSTDOUT:\n{}\nSTDERR:\n{}",
                self.exit_code, self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.success {
            panic!(
                "Command succeeded but was expected to fail\nSTDOUT:\n{}\nSTDERR:\n{}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_contains(&self, text: &str) -> &Self {
        if !self.stdout.contains(text) && !self.stderr.contains(text) {
            panic!(
                "Output does not contain '{}'\nSTDOUT:\n{}\nSTDERR:\n{}",
                text, self.stdout, self.stderr
            );
        }
        self
    }
}
