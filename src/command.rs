//! AT commands for the RAK3172 LoRaWAN module.
//!
//! The module speaks a line-oriented text protocol; every command is
//! terminated with CR-LF and acknowledged with a line containing `OK`.

use core::fmt::Write;

use embassy_time::Duration;
use heapless::String;

/// Generic acknowledgment token for accepted commands.
pub const OK: &str = "OK";

/// Longest command is `AT+APPSKEY=` followed by 32 hex chars.
pub const CMD_CAPACITY: usize = 48;

/// One AT command together with the response token that signals success and
/// the time budget for that token to arrive. Constructed per call, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtCommand {
    pub text: String<CMD_CAPACITY>,
    pub expected: &'static str,
    pub timeout: Duration,
}

impl AtCommand {
    fn ack(text: String<CMD_CAPACITY>, timeout: Duration) -> Self {
        Self {
            text,
            expected: OK,
            timeout,
        }
    }

    /// Minimal identity command, used as the readiness probe.
    pub fn probe(timeout: Duration) -> Self {
        let mut text = String::new();
        text.push_str("AT").ok();
        Self::ack(text, timeout)
    }

    /// `AT+NJM=0`: activation by personalization.
    pub fn join_mode_abp(timeout: Duration) -> Self {
        let mut text = String::new();
        text.push_str("AT+NJM=0").ok();
        Self::ack(text, timeout)
    }

    pub fn device_class(class: char, timeout: Duration) -> Self {
        let mut text = String::new();
        write!(text, "AT+CLASS={}", class).ok();
        Self::ack(text, timeout)
    }

    pub fn band(band: u8, timeout: Duration) -> Self {
        let mut text = String::new();
        write!(text, "AT+BAND={}", band).ok();
        Self::ack(text, timeout)
    }

    pub fn dev_addr(addr: &str, timeout: Duration) -> Self {
        let mut text = String::new();
        write!(text, "AT+DEVADDR={}", addr).ok();
        Self::ack(text, timeout)
    }

    pub fn apps_key(key: &str, timeout: Duration) -> Self {
        let mut text = String::new();
        write!(text, "AT+APPSKEY={}", key).ok();
        Self::ack(text, timeout)
    }

    pub fn nwks_key(key: &str, timeout: Duration) -> Self {
        let mut text = String::new();
        write!(text, "AT+NWKSKEY={}", key).ok();
        Self::ack(text, timeout)
    }

    pub fn join(timeout: Duration) -> Self {
        let mut text = String::new();
        text.push_str("AT+JOIN").ok();
        Self::ack(text, timeout)
    }

    /// `AT+SEND=<port>:<hex>` with the payload rendered as uppercase hex.
    pub fn send_uplink(port: u8, hex_payload: &str, timeout: Duration) -> Self {
        let mut text = String::new();
        write!(text, "AT+SEND={}:{}", port, hex_payload).ok();
        Self::ack(text, timeout)
    }
}
