use session::ClientId;

/// Recipients of a host frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    Client(ClientId),
    All,
    Other(ClientId),
}

impl Address {
    pub fn includes(self, session_id: ClientId) -> bool {
        match self {
            Address::Client(addressed) => session_id == addressed,
            Address::All => true,
            Address::Other(excluded) => session_id != excluded,
        }
    }
}
