//! One-shot command execution

use anyhow::{Context, Result};

use ciaa_session::ShellSession;

use crate::output::format_output;

/// Run `commands` in order and print their output.
///
/// Returns `true` when every command exited with status zero. The session
/// is disconnected on every path.
pub async fn exec_command(
    session: &ShellSession,
    commands: &[String],
    json: bool,
) -> Result<bool> {
    let result = run_all(session, commands, json).await;
    session.disconnect().await;
    result
}

async fn run_all(session: &ShellSession, commands: &[String], json: bool) -> Result<bool> {
    let mut all_succeeded = true;

    for command in commands {
        let output = session
            .execute(command)
            .await
            .with_context(|| format!("Failed to execute {:?}", command))?;

        if !output.success() {
            tracing::info!("{:?} exited with status {}", command, output.exit_status);
            all_succeeded = false;
        }

        if json {
            println!("{}", serde_json::to_string(&output)?);
        } else {
            for line in format_output(&output) {
                println!("{}", line);
            }
        }
    }

    Ok(all_succeeded)
}
