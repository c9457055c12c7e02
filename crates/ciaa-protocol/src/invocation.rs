//! Per-command state machine for the sentinel protocol
//!
//! One [`Invocation`] covers a single command from the moment its request is
//! built until the sentinel line carrying its exit status has been read:
//!
//! ```text
//! Idle -> Writing -> AwaitingSentinel -> Classifying -> Done
//!                           |
//!                           +-> Failed (malformed sentinel line)
//! ```
//!
//! Lines are fed one at a time. The sentinel line ends the invocation and is
//! checked first. Echoes of the written input reset the captured buffer.
//! Anything else is sanitized and captured.

use crate::error::ProtocolError;
use crate::output::CommandOutput;
use crate::sanitize::strip_control;
use crate::sentinel::{parse_exit_status, sentinel_command, FINISH_PHRASE};

/// Lifecycle phase of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, request not built yet
    Idle,
    /// Request built and being written to the channel
    Writing,
    /// Request flushed, reading lines until the sentinel shows up
    AwaitingSentinel,
    /// Sentinel seen, sorting captured lines
    Classifying,
    /// Output produced
    Done,
    /// Sentinel line could not be parsed
    Failed,
}

/// A single command travelling through the sentinel protocol
#[derive(Debug)]
pub struct Invocation {
    /// Command text with surrounding newlines removed
    command: String,
    /// The synthetic sentinel command written after `command`
    sentinel: String,
    /// Sanitized lines captured so far
    buffer: Vec<String>,
    /// Current phase
    phase: Phase,
}

impl Invocation {
    /// Create an invocation for `command`
    pub fn new(command: &str) -> Self {
        Self {
            command: command.trim_matches(|c| c == '\n' || c == '\r').to_string(),
            sentinel: sentinel_command(),
            buffer: Vec::new(),
            phase: Phase::Idle,
        }
    }

    /// The normalized command text
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the invocation reached a terminal phase
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Done | Phase::Failed)
    }

    /// Build the bytes to write: the command, then the sentinel command.
    pub fn request(&mut self) -> String {
        self.phase = Phase::Writing;
        format!("{}\n{}\n", self.command, self.sentinel)
    }

    /// Record that the request was flushed to the channel
    pub fn mark_sent(&mut self) {
        self.phase = Phase::AwaitingSentinel;
    }

    /// Feed one raw output line.
    ///
    /// Returns the classified output once the sentinel line arrives.
    pub fn feed(&mut self, line: &str) -> Result<Option<CommandOutput>, ProtocolError> {
        if self.is_finished() {
            tracing::trace!("Ignoring line after invocation finished: {:?}", line);
            return Ok(None);
        }

        // The sentinel echo starts with `echo `, so a terminator can never be
        // mistaken for input echo. The reverse can: `end` prefixes the phrase.
        if line.starts_with(FINISH_PHRASE) {
            let exit_status = match parse_exit_status(line) {
                Ok(status) => status,
                Err(e) => {
                    self.phase = Phase::Failed;
                    return Err(e);
                }
            };
            tracing::debug!(
                "Command {:?} finished with exit status {}",
                self.command,
                exit_status
            );
            return Ok(Some(self.finish(exit_status)));
        }

        if self.is_input_echo(line) {
            tracing::trace!("Input echo, discarding {} captured lines", self.buffer.len());
            self.buffer.clear();
            return Ok(None);
        }

        self.buffer.push(strip_control(line));
        Ok(None)
    }

    /// Lines that start with the written input are terminal echo.
    ///
    /// An empty command would prefix-match every line, so only the sentinel
    /// echo is considered in that case.
    fn is_input_echo(&self, line: &str) -> bool {
        line.starts_with(&self.sentinel)
            || (!self.command.is_empty() && line.starts_with(&self.command))
    }

    fn finish(&mut self, exit_status: i32) -> CommandOutput {
        self.phase = Phase::Classifying;

        let mut output = CommandOutput::classify(exit_status, std::mem::take(&mut self.buffer));
        self.trim_artifacts(&mut output.stdout);
        self.trim_artifacts(&mut output.stderr);

        self.phase = Phase::Done;
        output
    }

    /// Drop prompt fragments that survived the echo filter.
    fn trim_artifacts(&self, lines: &mut Vec<String>) {
        if lines.last().is_some_and(|l| l.contains(&self.sentinel)) {
            lines.pop();
        }
        if !self.command.is_empty() && lines.first().is_some_and(|l| l.contains(&self.command)) {
            lines.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentinel_line(status: &str) -> String {
        format!("{} {}\r", FINISH_PHRASE, status)
    }

    fn run(command: &str, lines: &[&str]) -> CommandOutput {
        let mut inv = Invocation::new(command);
        inv.request();
        inv.mark_sent();
        for line in lines {
            if let Some(out) = inv.feed(line).unwrap() {
                return out;
            }
        }
        panic!("sentinel never reached");
    }

    #[test]
    fn test_request_contains_command_then_sentinel() {
        let mut inv = Invocation::new("uname -a\n\n");
        assert_eq!(inv.phase(), Phase::Idle);
        assert_eq!(
            inv.request(),
            "uname -a\necho end of stdOUT buffer. finished with exit status $?\n"
        );
        assert_eq!(inv.phase(), Phase::Writing);
        inv.mark_sent();
        assert_eq!(inv.phase(), Phase::AwaitingSentinel);
    }

    #[test]
    fn test_success_goes_to_stdout() {
        let out = run(
            "echo A",
            &["echo A\r", &sentinel_command(), "A\r", &sentinel_line("0")],
        );
        assert_eq!(out.exit_status, 0);
        assert_eq!(out.stdout, vec!["A"]);
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn test_failure_goes_to_stderr() {
        let out = run("cat /nope", &["cat: /nope: No such file\r", &sentinel_line("1")]);
        assert_eq!(out.exit_status, 1);
        assert!(out.stdout.is_empty());
        assert_eq!(out.stderr, vec!["cat: /nope: No such file"]);
    }

    #[test]
    fn test_no_output_command() {
        let out = run("true", &["true\r", &sentinel_line("0")]);
        assert_eq!(out, CommandOutput::classify(0, vec![]));

        let out = run("false", &["false\r", &sentinel_line("1")]);
        assert_eq!(out.exit_status, 1);
        assert!(out.stdout.is_empty());
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn test_echo_resets_buffer() {
        let out = run(
            "ls",
            &["motd junk\r", "ls\r", "a.elf\r", "b.elf\r", &sentinel_line("0")],
        );
        assert_eq!(out.stdout, vec!["a.elf", "b.elf"]);
    }

    #[test]
    fn test_prompt_prefixed_echo_is_trimmed() {
        let prompt_echo_sentinel = format!("root@ciaa:~# {}\r", sentinel_command());
        let out = run(
            "echo A",
            &["root@ciaa:~# echo A\r", "A\r", &prompt_echo_sentinel, &sentinel_line("0")],
        );
        assert_eq!(out.stdout, vec!["A"]);
    }

    #[test]
    fn test_control_sequences_stripped() {
        let out = run("ls --color", &["\x1b[01;34mdir\x1b[0m\r", "a\u{8}b\r", &sentinel_line("0")]);
        assert_eq!(out.stdout, vec!["dir", "ab"]);
    }

    #[test]
    fn test_phrase_inside_line_does_not_terminate() {
        let mut inv = Invocation::new("cat notes");
        inv.request();
        inv.mark_sent();

        assert!(inv.feed("the end of stdOUT buffer is here\r").unwrap().is_none());
        assert!(inv.feed("  end of stdOUT buffer. finished with exit status 0").unwrap().is_none());
        let out = inv.feed(&sentinel_line("0")).unwrap().unwrap();
        assert_eq!(
            out.stdout,
            vec![
                "the end of stdOUT buffer is here",
                "  end of stdOUT buffer. finished with exit status 0"
            ]
        );
    }

    #[test]
    fn test_malformed_sentinel_fails() {
        let mut inv = Invocation::new("true");
        inv.request();
        inv.mark_sent();

        let err = inv.feed(&sentinel_line("abc")).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedExitStatus { .. }));
        assert_eq!(inv.phase(), Phase::Failed);
        assert!(inv.is_finished());
    }

    #[test]
    fn test_empty_command_still_terminates() {
        let out = run("\n", &["\r", &sentinel_line("0")]);
        assert_eq!(out.stdout, vec![""]);
    }

    #[test]
    fn test_command_prefixing_the_phrase_terminates() {
        for command in ["e", "en", "end", "end of"] {
            let out = run(
                command,
                &[
                    &format!("{}\r", command),
                    &sentinel_command(),
                    &format!("sh: {}: not found\r", command),
                    &sentinel_line("127"),
                ],
            );
            assert_eq!(out.exit_status, 127, "command {:?}", command);
            assert!(out.stdout.is_empty());
        }
    }

    #[test]
    fn test_lines_after_done_are_ignored() {
        let mut inv = Invocation::new("true");
        inv.request();
        inv.mark_sent();
        assert!(inv.feed(&sentinel_line("0")).unwrap().is_some());
        assert_eq!(inv.phase(), Phase::Done);
        assert!(inv.feed("late").unwrap().is_none());
    }
}
