//! In-process stand-in for the board's interactive shell
//!
//! Speaks over a `tokio::io::duplex` pipe the way a login shell on a PTY
//! does: each input line is echoed after the prompt, output lines end in
//! `\r\n`, and `$?` tracks the last command.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ciaa_protocol::{sentinel_command, FINISH_PHRASE};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

pub const PROMPT: &str = "root@ciaa:~# ";

/// How the fake shell echoes input
#[derive(Debug, Clone, Copy)]
pub enum Echo {
    /// No echo at all
    Off,
    /// Echo each line after the prompt
    Prompt,
}

/// Lines the fake shell received, in order
pub type Received = Arc<Mutex<Vec<String>>>;

/// Start a fake shell and return the client end of its pipe
pub fn spawn_shell(echo: Echo) -> (DuplexStream, Received) {
    let (client, server) = tokio::io::duplex(4096);
    let received = Received::default();
    tokio::spawn(serve(server, echo, Arc::clone(&received)));
    (client, received)
}

async fn serve(server: DuplexStream, echo: Echo, received: Received) {
    let (reader, mut writer) = tokio::io::split(server);
    let mut lines = BufReader::new(reader).lines();
    let sentinel = sentinel_command();
    let mut status = 0;
    let mut garble_next_status = false;

    while let Ok(Some(line)) = lines.next_line().await {
        received.lock().unwrap().push(line.clone());

        let mut out = String::new();
        if let Echo::Prompt = echo {
            out.push_str(&format!("{}{}\r\n", PROMPT, line));
        }

        if line == sentinel {
            if garble_next_status {
                garble_next_status = false;
                out.push_str(&format!("{} ?\r\n", FINISH_PHRASE));
            } else {
                out.push_str(&format!("{} {}\r\n", FINISH_PHRASE, status));
            }
        } else if let Some(text) = line.strip_prefix("echo ") {
            out.push_str(&format!("{}\r\n", text));
            status = 0;
        } else {
            match line.as_str() {
                "true" | "" => status = 0,
                "false" => status = 1,
                "colors" => {
                    out.push_str("\x1b[1;32mready\x1b[0m\r\n");
                    out.push_str("prog\u{8}\u{8}\u{8}\u{8}progress 100%\r\n");
                    status = 0;
                }
                "mention" => {
                    out.push_str("the end of stdOUT buffer is nowhere near\r\n");
                    status = 0;
                }
                "fifo-check" => {
                    out.push_str("reading fifo 0x43c00200\r\n");
                    out.push_str("error: fifo empty\r\n");
                    status = 2;
                }
                "garble" => {
                    garble_next_status = true;
                    status = 0;
                }
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    out.push_str("SLOW\r\n");
                    status = 0;
                }
                "hang" => {
                    let _ = writer.write_all(out.as_bytes()).await;
                    futures::future::pending::<()>().await;
                }
                "hangup" => return,
                other => {
                    out.push_str(&format!("sh: {}: not found\r\n", other));
                    status = 127;
                }
            }
        }

        if writer.write_all(out.as_bytes()).await.is_err() {
            return;
        }
    }
}
