//! Seams for the optional collaborators.
//!
//! WiFi/MQTT mirroring, BLE characteristic updates and OTA firmware pulls
//! are not implemented here; the monitor only needs these two hooks.

/// Secondary reporting path for readings (MQTT topic, BLE characteristic).
/// Fire-and-forget from the monitor's point of view.
pub trait Telemetry {
    fn is_enabled(&self) -> bool;

    /// Publishes a rendered reading. Returns false if the path dropped it.
    fn publish(&mut self, payload: &str) -> bool;
}

/// Firmware update collaborator, reached through downlink command `03`.
pub trait FirmwareUpdater {
    fn is_enabled(&self) -> bool;

    fn trigger(&mut self);
}

/// Disabled mirror path.
pub struct NoTelemetry;

impl Telemetry for NoTelemetry {
    fn is_enabled(&self) -> bool {
        false
    }

    fn publish(&mut self, _payload: &str) -> bool {
        false
    }
}

/// Disabled updater.
pub struct NoOta;

impl FirmwareUpdater for NoOta {
    fn is_enabled(&self) -> bool {
        false
    }

    fn trigger(&mut self) {
        warn!("Firmware update requested, but no updater is available");
    }
}
