//! Outer monitoring loop: provision once, then read-encode-uplink-listen on
//! every transmit-interval tick.

use core::fmt::Write as _;

use embassy_time::{Instant, Timer};
use embedded_hal::digital::OutputPin;
use embedded_io_async::{Read, Write};
use heapless::String;

use crate::config::MonitorConfig;
use crate::error::Error;
use crate::modem::{DownlinkCommand, DownlinkEvent, Rak3172};
use crate::sensor::CurrentSensor;
use crate::traits::{FirmwareUpdater, Telemetry};

/// JSON rendering of one reading for the mirror path.
pub fn format_current_json(amps: f32, timestamp_ms: u64) -> String<96> {
    let mut out = String::new();
    write!(
        out,
        "{{\"current\":{:.3},\"timestamp\":{},\"unit\":\"A\"}}",
        amps, timestamp_ms
    )
    .ok();
    out
}

/// Single-threaded, run-to-completion monitor. Owns the modem session, the
/// sensor and the optional collaborators; nothing here is a process-wide
/// singleton.
pub struct Monitor<W, R, C: MonitorConfig, S, T, U> {
    modem: Rak3172<W, R, C>,
    config: C,
    sensor: S,
    telemetry: T,
    updater: U,
}

impl<W, R, C, S, T, U> Monitor<W, R, C, S, T, U>
where
    W: Write,
    R: Read,
    C: MonitorConfig,
    S: CurrentSensor,
    T: Telemetry,
    U: FirmwareUpdater,
{
    pub fn new(modem: Rak3172<W, R, C>, config: C, sensor: S, telemetry: T, updater: U) -> Self {
        Self {
            modem,
            config,
            sensor,
            telemetry,
            updater,
        }
    }

    pub fn modem(&self) -> &Rak3172<W, R, C> {
        &self.modem
    }

    /// One-time bring-up: release the modem reset line, let boot chatter
    /// settle, run diagnostics, then provision.
    ///
    /// A diagnostics failure is logged and tolerated; a provisioning failure
    /// is fatal and the monitoring loop must not be entered.
    pub async fn init(&mut self) -> Result<(), Error> {
        if let Some(reset) = self.config.reset_pin() {
            reset.set_high().ok();
        }
        Timer::after(C::BOOT_SETTLE).await;

        if !self.sensor.check() {
            error!("Hardware diagnostics failed, continuing with caution");
        }

        self.modem.provision().await
    }

    /// Runs `init` and then the monitoring loop. Returns only if
    /// provisioning fails.
    pub async fn run(&mut self) -> Result<(), Error> {
        self.init().await?;
        info!("Starting main monitoring loop");

        let mut last_uplink = Instant::now();
        let mut last_mirror = Instant::now();
        loop {
            let amps = self.sensor.read_current_amps();
            let now = Instant::now();

            if self.telemetry.is_enabled() && now.duration_since(last_mirror) >= C::MIRROR_INTERVAL
            {
                let json = format_current_json(amps, now.as_millis());
                self.telemetry.publish(json.as_str());
                last_mirror = now;
            }

            if now.duration_since(last_uplink) >= C::TX_INTERVAL {
                info!("Current reading: {} A", amps);
                match self.modem.send_reading(amps).await {
                    Ok(()) => {
                        let event = self.modem.listen_for_downlink().await;
                        self.dispatch(event).await;
                    }
                    // Non-fatal: the next interval gets a fresh attempt.
                    Err(_) => info!("Skipping downlink listen due to send failure"),
                }
                last_uplink = now;
            }

            Timer::after(C::IDLE_PACE).await;
        }
    }

    /// Applies the side effect of a classified downlink event.
    ///
    /// The blink command blocks for three full LED cycles before returning;
    /// that latency is part of the command's contract.
    pub async fn dispatch(&mut self, event: DownlinkEvent) {
        match event {
            DownlinkEvent::TxDone | DownlinkEvent::Unrecognized | DownlinkEvent::None => {}
            DownlinkEvent::Rx(DownlinkCommand::LedOn) => {
                info!("LED ON command received");
                if let Some(led) = self.config.led_pin() {
                    led.set_high().ok();
                }
            }
            DownlinkEvent::Rx(DownlinkCommand::LedOff) => {
                info!("LED OFF command received");
                if let Some(led) = self.config.led_pin() {
                    led.set_low().ok();
                }
            }
            DownlinkEvent::Rx(DownlinkCommand::FirmwareUpdate) => {
                info!("Firmware update command received");
                if C::OTA_ENABLED && C::WIFI_ENABLED && self.updater.is_enabled() {
                    self.updater.trigger();
                } else {
                    error!("Firmware updates are disabled or WiFi is unavailable");
                }
            }
            DownlinkEvent::Rx(DownlinkCommand::Blink) => {
                info!("LED BLINK command received");
                for _ in 0..3 {
                    if let Some(led) = self.config.led_pin() {
                        led.set_high().ok();
                    }
                    Timer::after(C::BLINK_PERIOD).await;
                    if let Some(led) = self.config.led_pin() {
                        led.set_low().ok();
                    }
                    Timer::after(C::BLINK_PERIOD).await;
                }
            }
        }
    }
}
