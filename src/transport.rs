//! Raw byte-stream access to the modem UART.

use embassy_time::{with_timeout, Duration, Instant, Timer};
use embedded_io_async::Read;
use heapless::Vec;

/// Upper bound on accumulated response text for a single wait.
pub const RESPONSE_CAPACITY: usize = 256;

/// Grace period used when draining stale inbound bytes.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(20);

/// Polls the modem serial line and assembles response text.
///
/// Bytes are consumed one at a time so that anything arriving after a match
/// is left for the next call's buffer clear rather than swallowed here.
pub struct LineReader<R> {
    serial: R,
}

impl<R: Read> LineReader<R> {
    pub fn new(serial: R) -> Self {
        Self { serial }
    }

    /// Discards all currently buffered inbound bytes.
    ///
    /// Used to desynchronize from unsolicited boot-time chatter before a
    /// command is issued. Returns once the line has been quiet for a short
    /// grace period.
    pub async fn clear_buffer(&mut self) {
        trace!("Clearing modem receive buffer");
        let mut byte = [0u8; 1];
        while let Ok(Ok(n)) = with_timeout(DRAIN_TIMEOUT, self.serial.read(&mut byte)).await {
            if n == 0 {
                break;
            }
        }
    }

    /// Appends inbound bytes to an accumulator until `expected` occurs as a
    /// contiguous substring or `timeout` elapses.
    ///
    /// Returns `(true, accumulated)` immediately on a match and
    /// `(false, accumulated)` no earlier than the full timeout otherwise.
    /// An empty `expected` matches immediately; callers must supply a real
    /// token. The linear rescan per byte is fine at UART byte rates.
    pub async fn read_until_or_timeout(
        &mut self,
        expected: &[u8],
        timeout: Duration,
    ) -> (bool, Vec<u8, RESPONSE_CAPACITY>) {
        let deadline = Instant::now() + timeout;
        let mut accumulated = Vec::new();
        if expected.is_empty() {
            return (true, accumulated);
        }

        let mut byte = [0u8; 1];
        loop {
            let now = Instant::now();
            if now >= deadline {
                return (false, accumulated);
            }
            match with_timeout(deadline - now, self.serial.read(&mut byte)).await {
                Ok(Ok(n)) if n > 0 => {
                    // A full accumulator keeps the wait alive; RAK3172
                    // responses never get close to the capacity.
                    accumulated.push(byte[0]).ok();
                    if contains(&accumulated, expected) {
                        return (true, accumulated);
                    }
                }
                Ok(Ok(_)) => {
                    // Transport closed. Wait out the deadline so a missing
                    // token is never reported early.
                    Timer::at(deadline).await;
                    return (false, accumulated);
                }
                Ok(Err(_)) => {
                    warn!("Modem serial read error");
                    Timer::at(deadline).await;
                    return (false, accumulated);
                }
                Err(_) => return (false, accumulated),
            }
        }
    }

    /// Assembles the next LF-terminated line, or returns `None` once
    /// `deadline` passes. The trailing CR-LF is stripped.
    pub async fn next_line(&mut self, deadline: Instant) -> Option<Vec<u8, RESPONSE_CAPACITY>> {
        let mut line: Vec<u8, RESPONSE_CAPACITY> = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            match with_timeout(deadline - now, self.serial.read(&mut byte)).await {
                Ok(Ok(n)) if n > 0 => match byte[0] {
                    b'\n' => {
                        if line.last() == Some(&b'\r') {
                            line.pop();
                        }
                        return Some(line);
                    }
                    b => {
                        if line.push(b).is_err() {
                            // Oversized line, hand back what fits.
                            return Some(line);
                        }
                    }
                },
                Ok(_) => {
                    Timer::at(deadline).await;
                    return None;
                }
                Err(_) => return None,
            }
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack.windows(needle.len()).any(|w| w == needle)
}
