//! Single point all modem interaction funnels through.

use embedded_io_async::{Read, Write};

use crate::command::AtCommand;
use crate::transport::LineReader;

/// One-command-at-a-time AT engine over a shared UART.
///
/// There is no queuing and no reentrancy: the surrounding system is
/// single-threaded and a second call while one is outstanding is a
/// programming error, not a state to be handled.
pub struct AtClient<W, R> {
    writer: W,
    reader: LineReader<R>,
}

impl<W: Write, R: Read> AtClient<W, R> {
    pub fn new(writer: W, serial: R) -> Self {
        Self {
            writer,
            reader: LineReader::new(serial),
        }
    }

    /// Sends one command and waits for its expected token.
    ///
    /// The inbound buffer is always cleared first so stale chatter cannot
    /// satisfy the match. Returns true iff the token arrived before the
    /// command's timeout. Retry policy belongs to callers.
    pub async fn send(&mut self, cmd: &AtCommand) -> bool {
        self.reader.clear_buffer().await;

        debug!("Sending command: {}", cmd.text.as_str());
        if self.writer.write_all(cmd.text.as_bytes()).await.is_err()
            || self.writer.write_all(b"\r\n").await.is_err()
        {
            error!("Failed writing '{}' to the modem", cmd.text.as_str());
            return false;
        }
        self.writer.flush().await.ok();

        let (matched, _response) = self
            .reader
            .read_until_or_timeout(cmd.expected.as_bytes(), cmd.timeout)
            .await;
        if matched {
            debug!("Command succeeded");
        } else {
            error!("Timeout waiting for '{}' response", cmd.expected);
        }
        matched
    }

    pub(crate) fn reader_mut(&mut self) -> &mut LineReader<R> {
        &mut self.reader
    }
}
