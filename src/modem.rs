//! RAK3172 provisioning and the uplink/downlink session.

use core::marker::PhantomData;

use embassy_time::{Instant, Timer};
use embedded_io_async::{Read, Write};

use crate::client::AtClient;
use crate::command::AtCommand;
use crate::config::MonitorConfig;
use crate::error::{Error, Step};
use crate::payload::{self, UPLINK_HEX_LEN};
use crate::state::SessionState;

const TX_DONE_MARKER: &str = "+EVT:TX_DONE";
const RX_MARKERS: [&str; 2] = ["+EVT:RX_C", "+EVT:RX_"];

/// Downlink command vocabulary carried in the event payload token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DownlinkCommand {
    LedOn,
    LedOff,
    FirmwareUpdate,
    Blink,
}

impl DownlinkCommand {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "01" => Some(DownlinkCommand::LedOn),
            "02" => Some(DownlinkCommand::LedOff),
            "03" => Some(DownlinkCommand::FirmwareUpdate),
            "04" => Some(DownlinkCommand::Blink),
            _ => None,
        }
    }
}

/// Outcome of one downlink listen window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DownlinkEvent {
    /// The network confirmed the last uplink.
    TxDone,
    /// A downlink carried a known command.
    Rx(DownlinkCommand),
    /// A downlink arrived with a token outside the command vocabulary.
    Unrecognized,
    /// The window elapsed without a classifiable line.
    None,
}

/// Session driver for a RAK3172 module in ABP mode.
pub struct Rak3172<W, R, C> {
    at: AtClient<W, R>,
    state: SessionState,
    _config: PhantomData<C>,
}

impl<W: Write, R: Read, C: MonitorConfig> Rak3172<W, R, C> {
    pub fn new(writer: W, serial: R) -> Self {
        Self {
            at: AtClient::new(writer, serial),
            state: SessionState::NotJoined,
            _config: PhantomData,
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.state
    }

    /// Runs the ordered ABP provisioning sequence: readiness probe, join
    /// mode, device class, band, credentials, then the join request.
    ///
    /// Fail-fast: the first failing step aborts the rest and the session
    /// lands in `Failed`; there is no partial commit to `Joined`.
    pub async fn provision(&mut self) -> Result<(), Error> {
        info!("Initializing LoRaWAN ABP mode");
        self.state = SessionState::Joining;

        if let Err(e) = self.run_provisioning_steps().await {
            self.state = SessionState::Failed;
            return Err(e);
        }

        self.state = SessionState::Joined;
        info!("LoRaWAN initialized and joined");
        Ok(())
    }

    async fn run_provisioning_steps(&mut self) -> Result<(), Error> {
        self.wait_for_ready().await?;

        let steps: [(Step, AtCommand); 6] = [
            (Step::JoinMode, AtCommand::join_mode_abp(C::COMMAND_TIMEOUT)),
            (
                Step::DeviceClass,
                AtCommand::device_class(C::DEVICE_CLASS, C::COMMAND_TIMEOUT),
            ),
            (Step::Band, AtCommand::band(C::BAND, C::COMMAND_TIMEOUT)),
            (
                Step::DevAddr,
                AtCommand::dev_addr(C::DEV_ADDR, C::COMMAND_TIMEOUT),
            ),
            (
                Step::AppSKey,
                AtCommand::apps_key(C::APPS_KEY, C::COMMAND_TIMEOUT),
            ),
            (
                Step::NwkSKey,
                AtCommand::nwks_key(C::NWKS_KEY, C::COMMAND_TIMEOUT),
            ),
        ];

        for (step, cmd) in &steps {
            info!("Setting {}", step.description());
            if !self.at.send(cmd).await {
                error!("Failed to set {}", step.description());
                return Err(Error::ProvisioningStep(*step));
            }
            Timer::after(C::INTER_COMMAND_DELAY).await;
        }

        info!("Joining LoRaWAN network");
        if !self.at.send(&AtCommand::join(C::JOIN_TIMEOUT)).await {
            error!("Failed to join LoRaWAN network");
            return Err(Error::JoinRejected);
        }
        Ok(())
    }

    async fn wait_for_ready(&mut self) -> Result<(), Error> {
        info!("Waiting for RAK3172 module to be ready");
        for attempt in 1..=C::PROBE_ATTEMPTS {
            info!("Attempt {} to communicate with module", attempt);
            if self.at.send(&AtCommand::probe(C::COMMAND_TIMEOUT)).await {
                info!("Module is ready");
                return Ok(());
            }
            Timer::after(C::PROBE_RETRY_DELAY).await;
        }
        error!(
            "Module not responding after {} attempts",
            C::PROBE_ATTEMPTS
        );
        Err(Error::ProvisioningStep(Step::Probe))
    }

    /// Encodes `amps` into the 2-byte milliamp payload and sends it on the
    /// configured fPort.
    ///
    /// Join state is deliberately not checked first; a send before a
    /// successful join simply times out on the modem side.
    pub async fn send_reading(&mut self, amps: f32) -> Result<(), Error> {
        let hex = payload::hex_upper::<UPLINK_HEX_LEN>(&payload::encode_current(amps));
        info!("Sending payload: {} ({} A)", hex.as_str(), amps);

        let cmd = AtCommand::send_uplink(C::FPORT, &hex, C::UPLINK_TIMEOUT);
        if self.at.send(&cmd).await {
            info!("Payload sent");
            Ok(())
        } else {
            error!("Failed to send payload");
            Err(Error::SendFailed)
        }
    }

    /// Blocks up to the configured window for the first classifiable modem
    /// event line and returns it.
    ///
    /// Only one event is processed per window, even if more arrive; the
    /// remainder stays buffered for the next command's buffer clear.
    pub async fn listen_for_downlink(&mut self) -> DownlinkEvent {
        info!("Listening for downlink messages");
        let deadline = Instant::now() + C::DOWNLINK_WINDOW;

        while let Some(raw) = self.at.reader_mut().next_line(deadline).await {
            let Ok(text) = core::str::from_utf8(&raw) else {
                warn!("Discarding non-UTF8 line from modem");
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            debug!("Received: {}", text);
            if let Some(event) = classify_line(text) {
                return event;
            }
        }

        info!("No downlink received within timeout period");
        DownlinkEvent::None
    }
}

/// Single point of wire-format knowledge for modem event lines. Substring
/// matching is deliberate; it is simple and matches the line-oriented text
/// the module emits.
fn classify_line(line: &str) -> Option<DownlinkEvent> {
    if line.contains(TX_DONE_MARKER) {
        info!("Uplink transmission confirmed");
        return Some(DownlinkEvent::TxDone);
    }

    if RX_MARKERS.iter().any(|marker| line.contains(marker)) {
        // The payload token sits after the final delimiter.
        let token = line.rsplit(':').next().unwrap_or("").trim();
        info!("Downlink payload: {}", token);
        return Some(match DownlinkCommand::from_token(token) {
            Some(cmd) => DownlinkEvent::Rx(cmd),
            None => {
                info!("Unknown command: {}", token);
                DownlinkEvent::Unrecognized
            }
        });
    }

    None
}
