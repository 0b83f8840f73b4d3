/// Provisioning steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Probe,
    JoinMode,
    DeviceClass,
    Band,
    DevAddr,
    AppSKey,
    NwkSKey,
    Join,
}

impl Step {
    /// Name used in provisioning log records.
    pub fn description(&self) -> &'static str {
        match self {
            Step::Probe => "module readiness",
            Step::JoinMode => "join mode",
            Step::DeviceClass => "device class",
            Step::Band => "radio band",
            Step::DevAddr => "device address",
            Step::AppSKey => "app session key",
            Step::NwkSKey => "network session key",
            Step::Join => "network join",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The expected token never arrived on the transport.
    Timeout,
    /// A provisioning step failed; nothing after it was attempted.
    ProvisioningStep(Step),
    /// The modem did not acknowledge the join request.
    JoinRejected,
    /// The modem did not acknowledge an uplink send command.
    SendFailed,
}
