//! Interactive prompt

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use ciaa_core::CommandExecutor;
use ciaa_session::ShellSession;

use crate::output::{format_output, print_info, print_success, print_warning};

/// Prompt shown before each command
pub const PROMPT: &str = "ciaa> ";

/// Read commands from `input` and run them until EOF, `exit` or `quit`.
///
/// Returns the number of commands that completed.
pub async fn run_repl<R, W>(
    executor: &dyn CommandExecutor,
    input: R,
    out: &mut W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut completed = 0;

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if matches!(command, "exit" | "quit") {
            break;
        }

        match executor.execute(command).await {
            Ok(output) => {
                completed += 1;
                for line in format_output(&output) {
                    writeln!(out, "{}", line)?;
                }
            }
            Err(e) => {
                writeln!(out, "✗ {}", e)?;
                if !executor.is_connected() {
                    writeln!(out, "✗ Session closed")?;
                    break;
                }
            }
        }
    }

    Ok(completed)
}

/// Run the interactive prompt on stdin/stdout, then disconnect
pub async fn shell_command(session: &ShellSession) -> Result<()> {
    print_info("Type commands (exit, quit or Ctrl+C to leave)");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let result = tokio::select! {
        result = run_repl(session, stdin, &mut stdout) => result.map(Some),
        _ = tokio::signal::ctrl_c() => Ok(None),
    };

    session.disconnect().await;
    match result? {
        Some(completed) => tracing::debug!("Prompt closed after {} commands", completed),
        None => print_warning("Interrupted"),
    }
    print_success("Disconnected");
    Ok(())
}
