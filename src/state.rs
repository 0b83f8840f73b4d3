/// Join progress of the LoRaWAN session.
///
/// `Joined` is only entered after the join command's response matched its
/// expected token; any earlier step failure lands in `Failed`. ABP session
/// parameters are fixed constants, so the state is not persisted anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    NotJoined,
    Joining,
    Joined,
    Failed,
}

impl SessionState {
    pub fn is_joined(&self) -> bool {
        matches!(self, SessionState::Joined)
    }
}
