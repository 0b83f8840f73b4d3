use embassy_time::Duration;
use embedded_hal::digital::{ErrorType, OutputPin};

/// Placeholder for boards that leave the LED or modem reset line unwired.
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Compile-time configuration of the monitor: ABP credentials, radio
/// parameters, feature switches and every timing constant. Immutable for the
/// process lifetime.
pub trait MonitorConfig {
    type LedPin: OutputPin;
    type ResetPin: OutputPin;

    /// ABP device address, 8 hex chars.
    const DEV_ADDR: &'static str;
    /// ABP application session key, 32 hex chars.
    const APPS_KEY: &'static str;
    /// ABP network session key, 32 hex chars.
    const NWKS_KEY: &'static str;

    /// RAK3172 band index. 3 selects IN865.
    const BAND: u8 = 3;
    const DEVICE_CLASS: char = 'C';
    /// Logical channel (fPort) for uplinks.
    const FPORT: u8 = 2;

    const WIFI_ENABLED: bool = false;
    const OTA_ENABLED: bool = false;

    const TX_INTERVAL: Duration = Duration::from_secs(60);
    const MIRROR_INTERVAL: Duration = Duration::from_secs(10);
    /// Pace of the idle monitoring loop between interval checks.
    const IDLE_PACE: Duration = Duration::from_millis(100);

    /// Time allowed for modem boot chatter to finish before the readiness
    /// probe starts.
    const BOOT_SETTLE: Duration = Duration::from_secs(3);
    const PROBE_ATTEMPTS: usize = 5;
    const PROBE_RETRY_DELAY: Duration = Duration::from_secs(1);

    const COMMAND_TIMEOUT: Duration = Duration::from_secs(3);
    /// Settle time between accepted configuration commands.
    const INTER_COMMAND_DELAY: Duration = Duration::from_millis(500);
    /// Network join latency is higher than local config latency.
    const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
    const UPLINK_TIMEOUT: Duration = Duration::from_secs(10);

    const DOWNLINK_WINDOW: Duration = Duration::from_secs(15);
    const BLINK_PERIOD: Duration = Duration::from_millis(300);

    fn led_pin(&mut self) -> Option<&mut Self::LedPin>;
    fn reset_pin(&mut self) -> Option<&mut Self::ResetPin>;
}
