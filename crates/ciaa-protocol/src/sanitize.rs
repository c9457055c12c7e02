//! Terminal control sequence stripping

use std::sync::OnceLock;

use regex::Regex;

/// CSI sequences, introduced either by the 8-bit `0x9B` or by `ESC [`.
const CSI_PATTERN: &str = r"(?:\x{9B}|\x1B\[)[0-?]*[ -/]*[@-~]";

fn csi_regex() -> &'static Regex {
    static CSI: OnceLock<Regex> = OnceLock::new();
    CSI.get_or_init(|| Regex::new(CSI_PATTERN).expect("CSI pattern is a valid regex"))
}

/// Remove ANSI/VT100 control sequences, backspaces and carriage returns.
pub fn strip_control(line: &str) -> String {
    csi_regex()
        .replace_all(line, "")
        .chars()
        .filter(|c| *c != '\u{8}' && *c != '\r')
        .collect()
}
