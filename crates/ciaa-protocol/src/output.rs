//! Classified command output

use serde::{Deserialize, Serialize};

/// Result of one command executed through the sentinel protocol.
///
/// The shell does not separate stdout from stderr, so all captured lines land
/// in `stdout` when the exit status is zero and in `stderr` otherwise. At most
/// one of the two is ever non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit status reported by `$?`
    pub exit_status: i32,
    /// Lines captured from a successful command
    pub stdout: Vec<String>,
    /// Lines captured from a failed command
    pub stderr: Vec<String>,
}

impl CommandOutput {
    /// Build output from captured lines, classified by exit status
    pub fn classify(exit_status: i32, lines: Vec<String>) -> Self {
        if exit_status == 0 {
            Self {
                exit_status,
                stdout: lines,
                stderr: Vec::new(),
            }
        } else {
            Self {
                exit_status,
                stdout: Vec::new(),
                stderr: lines,
            }
        }
    }

    /// Whether the command exited with status zero
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// Captured lines regardless of classification
    pub fn lines(&self) -> &[String] {
        if self.success() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}
