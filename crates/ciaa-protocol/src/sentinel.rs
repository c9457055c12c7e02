//! Sentinel phrase and exit status parsing

use crate::error::ProtocolError;
use crate::sanitize::strip_control;

/// Phrase echoed after every command to mark the end of its output.
///
/// Remote tooling recognizes this exact text, so it must not change.
pub const FINISH_PHRASE: &str = "end of stdOUT buffer. finished with exit status";

/// The synthetic command written after each real command.
pub fn sentinel_command() -> String {
    format!("echo {} $?", FINISH_PHRASE)
}

/// Parse the exit status carried by a sentinel line.
///
/// The status is the final whitespace-delimited token of the line.
pub fn parse_exit_status(line: &str) -> Result<i32, ProtocolError> {
    let clean = strip_control(line);
    clean
        .split_whitespace()
        .next_back()
        .and_then(|token| token.parse::<i32>().ok())
        .ok_or_else(|| ProtocolError::MalformedExitStatus {
            line: line.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_command_is_exact() {
        assert_eq!(
            sentinel_command(),
            "echo end of stdOUT buffer. finished with exit status $?"
        );
    }

    #[test]
    fn test_parse_exit_status() {
        let line = format!("{} 0", FINISH_PHRASE);
        assert_eq!(parse_exit_status(&line).unwrap(), 0);

        let line = format!("{} 127\r", FINISH_PHRASE);
        assert_eq!(parse_exit_status(&line).unwrap(), 127);
    }

    #[test]
    fn test_parse_exit_status_with_color_reset() {
        let line = format!("{} 2\x1b[0m", FINISH_PHRASE);
        assert_eq!(parse_exit_status(&line).unwrap(), 2);
    }

    #[test]
    fn test_parse_exit_status_missing_value() {
        // `$?` expanded to nothing leaves "status" as the last token
        let err = parse_exit_status(FINISH_PHRASE).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedExitStatus { .. }));

        let line = format!("{} oops", FINISH_PHRASE);
        assert!(parse_exit_status(&line).is_err());
    }
}
