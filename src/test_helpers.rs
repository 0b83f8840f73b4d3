//! Scripted serial port and pin doubles for driving the AT layers in tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_io_async::{ErrorType, Read, Write};

use crate::config::MonitorConfig;
use crate::sensor::AdcChannel;
use crate::traits::{FirmwareUpdater, Telemetry};

#[derive(Default)]
struct Inner {
    rx: VecDeque<u8>,
    due: VecDeque<(Instant, &'static [u8])>,
    written: Vec<u8>,
    scanned: usize,
    replies: VecDeque<&'static [u8]>,
}

/// In-memory serial port. Clones share the same state, so one instance can
/// serve as both the read and the write half of the UART.
///
/// Reads hand out one byte at a time. With nothing buffered and nothing
/// scheduled, a read never resolves, leaving timeout behavior to the caller.
#[derive(Clone, Default)]
pub struct MockPort {
    inner: Rc<RefCell<Inner>>,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `bytes` available to the reader immediately.
    pub fn feed(&self, bytes: &[u8]) {
        self.inner.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Makes `bytes` available to the reader once `delay` has passed.
    pub fn feed_after(&self, delay: Duration, bytes: &'static [u8]) {
        self.inner
            .borrow_mut()
            .due
            .push_back((Instant::now() + delay, bytes));
    }

    /// Queues a response that is released when the next complete
    /// CR-LF-terminated command has been written. Commands without a queued
    /// response get no reply at all.
    pub fn reply_with(&self, bytes: &'static [u8]) {
        self.inner.borrow_mut().replies.push_back(bytes);
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    /// Commands written so far, split on CR-LF.
    pub fn commands(&self) -> Vec<String> {
        String::from_utf8(self.written())
            .unwrap()
            .split("\r\n")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}

impl ErrorType for MockPort {
    type Error = Infallible;
}

impl Read for MockPort {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        loop {
            let pending = {
                let mut inner = self.inner.borrow_mut();
                if let Some(b) = inner.rx.pop_front() {
                    buf[0] = b;
                    return Ok(1);
                }
                inner.due.pop_front()
            };
            match pending {
                Some((at, bytes)) => {
                    Timer::at(at).await;
                    self.inner.borrow_mut().rx.extend(bytes.iter().copied());
                }
                None => core::future::pending::<()>().await,
            }
        }
    }
}

impl Write for MockPort {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        let mut inner = self.inner.borrow_mut();
        inner.written.extend_from_slice(buf);

        // Release one scripted reply per completed command line.
        while let Some(rel) = inner.written[inner.scanned..]
            .windows(2)
            .position(|w| w == b"\r\n")
        {
            inner.scanned += rel + 2;
            if let Some(reply) = inner.replies.pop_front() {
                inner.rx.extend(reply.iter().copied());
            }
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Output pin recording every level change.
#[derive(Clone, Default)]
pub struct SharedPin {
    states: Rc<RefCell<Vec<bool>>>,
}

impl SharedPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// All levels the pin was driven to, in order.
    pub fn levels(&self) -> Vec<bool> {
        self.states.borrow().clone()
    }

    pub fn last_level(&self) -> Option<bool> {
        self.states.borrow().last().copied()
    }
}

impl PinErrorType for SharedPin {
    type Error = Infallible;
}

impl OutputPin for SharedPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.states.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.states.borrow_mut().push(true);
        Ok(())
    }
}

/// Fixed-count ADC double for the sensor math tests.
pub struct FakeAdc(pub u16);

impl AdcChannel for FakeAdc {
    fn read_counts(&mut self) -> u16 {
        self.0
    }
}

pub struct FixedSensor(pub f32);

impl crate::sensor::CurrentSensor for FixedSensor {
    fn read_current_amps(&mut self) -> f32 {
        self.0
    }
}

/// Updater double recording trigger calls.
#[derive(Clone, Default)]
pub struct RecordingUpdater {
    enabled: bool,
    triggers: Rc<RefCell<usize>>,
}

impl RecordingUpdater {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            triggers: Rc::default(),
        }
    }

    pub fn triggered(&self) -> usize {
        *self.triggers.borrow()
    }
}

impl FirmwareUpdater for RecordingUpdater {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn trigger(&mut self) {
        *self.triggers.borrow_mut() += 1;
    }
}

/// Telemetry double capturing published payloads.
#[derive(Clone, Default)]
pub struct RecordingTelemetry {
    pub published: Rc<RefCell<Vec<String>>>,
}

impl Telemetry for RecordingTelemetry {
    fn is_enabled(&self) -> bool {
        true
    }

    fn publish(&mut self, payload: &str) -> bool {
        self.published.borrow_mut().push(payload.to_string());
        true
    }
}

pub const TEST_DEV_ADDR: &str = "26011bda";
pub const TEST_APPS_KEY: &str = "000102030405060708090a0b0c0d0e0f";
pub const TEST_NWKS_KEY: &str = "f0e0d0c0b0a090807060504030201000";

/// Millisecond-scale timing so the suite stays fast.
macro_rules! impl_test_timing {
    () => {
        const TX_INTERVAL: Duration = Duration::from_millis(50);
        const MIRROR_INTERVAL: Duration = Duration::from_millis(20);
        const IDLE_PACE: Duration = Duration::from_millis(1);
        const BOOT_SETTLE: Duration = Duration::from_millis(1);
        const PROBE_ATTEMPTS: usize = 3;
        const PROBE_RETRY_DELAY: Duration = Duration::from_millis(5);
        const COMMAND_TIMEOUT: Duration = Duration::from_millis(60);
        const INTER_COMMAND_DELAY: Duration = Duration::from_millis(2);
        const JOIN_TIMEOUT: Duration = Duration::from_millis(80);
        const UPLINK_TIMEOUT: Duration = Duration::from_millis(80);
        const DOWNLINK_WINDOW: Duration = Duration::from_millis(120);
        const BLINK_PERIOD: Duration = Duration::from_millis(2);
    };
}

#[derive(Clone, Default)]
pub struct TestConfig {
    pub led: SharedPin,
    pub reset: SharedPin,
}

impl MonitorConfig for TestConfig {
    type LedPin = SharedPin;
    type ResetPin = SharedPin;

    const DEV_ADDR: &'static str = TEST_DEV_ADDR;
    const APPS_KEY: &'static str = TEST_APPS_KEY;
    const NWKS_KEY: &'static str = TEST_NWKS_KEY;

    impl_test_timing!();

    fn led_pin(&mut self) -> Option<&mut SharedPin> {
        Some(&mut self.led)
    }

    fn reset_pin(&mut self) -> Option<&mut SharedPin> {
        Some(&mut self.reset)
    }
}

/// Same timings as [`TestConfig`] with the WiFi/OTA collaborators reporting
/// themselves enabled.
#[derive(Clone, Default)]
pub struct OtaEnabledConfig {
    pub led: SharedPin,
    pub reset: SharedPin,
}

impl MonitorConfig for OtaEnabledConfig {
    type LedPin = SharedPin;
    type ResetPin = SharedPin;

    const DEV_ADDR: &'static str = TEST_DEV_ADDR;
    const APPS_KEY: &'static str = TEST_APPS_KEY;
    const NWKS_KEY: &'static str = TEST_NWKS_KEY;

    const WIFI_ENABLED: bool = true;
    const OTA_ENABLED: bool = true;

    impl_test_timing!();

    fn led_pin(&mut self) -> Option<&mut SharedPin> {
        Some(&mut self.led)
    }

    fn reset_pin(&mut self) -> Option<&mut SharedPin> {
        Some(&mut self.reset)
    }
}
