//! Duplex shell channel driven by the sentinel protocol

use futures::StreamExt;
use russh::client::Handle;
use russh::Disconnect;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedRead;

use ciaa_core::ExecutionError;
use ciaa_protocol::{CommandOutput, Invocation, ShellLineCodec};

use crate::ssh::ClientHandler;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Input sink and line-oriented output source of one interactive shell
pub(crate) struct ShellChannel {
    /// Shell stdin
    writer: BoxedWriter,
    /// Shell output, one decoded line at a time
    lines: FramedRead<BoxedReader, ShellLineCodec>,
    /// SSH connection carrying the channel, if any
    remote: Option<Handle<ClientHandler>>,
    /// A command was written and its sentinel not yet read
    in_flight: bool,
}

impl ShellChannel {
    pub(crate) fn new<S>(stream: S, remote: Option<Handle<ClientHandler>>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let reader: BoxedReader = Box::new(reader);
        Self {
            writer: Box::new(writer),
            lines: FramedRead::new(reader, ShellLineCodec::new()),
            remote,
            in_flight: false,
        }
    }

    /// Write one command plus its sentinel and read until the sentinel line.
    ///
    /// If the returned future is dropped early, the channel stays marked as
    /// in flight and refuses further exchanges.
    pub(crate) async fn exchange(
        &mut self,
        command: &str,
    ) -> Result<CommandOutput, ExecutionError> {
        if self.in_flight {
            tracing::warn!("Channel still holds output of an abandoned command");
            return Err(ExecutionError::ChannelClosed);
        }
        self.in_flight = true;

        let mut invocation = Invocation::new(command);
        let request = invocation.request();

        tracing::debug!("Sending command {:?}", invocation.command());
        self.writer.write_all(request.as_bytes()).await?;
        self.writer.flush().await?;
        invocation.mark_sent();

        while let Some(line) = self.lines.next().await {
            let fed = invocation.feed(&line?);
            if invocation.is_finished() {
                self.in_flight = false;
            }
            if let Some(output) = fed? {
                return Ok(output);
            }
        }

        tracing::warn!("Shell output ended while waiting for the sentinel");
        Err(ExecutionError::ChannelClosed)
    }

    /// Shut down stdin and end the SSH connection
    pub(crate) async fn close(mut self) {
        if let Err(e) = self.writer.shutdown().await {
            tracing::debug!("Shell stdin shutdown: {}", e);
        }
        if let Some(remote) = self.remote.take() {
            if let Err(e) = remote
                .disconnect(Disconnect::ByApplication, "session closed", "en")
                .await
            {
                tracing::debug!("SSH disconnect: {}", e);
            }
        }
    }
}
