use msgs::ClientHostMsg;
use session::HostLink;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// Hands guesses to the host connection process.
pub struct ChannelHostLink {
    to_host: mpsc::Sender<ClientHostMsg>,
}

impl ChannelHostLink {
    pub fn new(to_host: mpsc::Sender<ClientHostMsg>) -> ChannelHostLink {
        ChannelHostLink { to_host }
    }
}

impl HostLink for ChannelHostLink {
    fn submit_guess(&mut self, guess: Vec<f32>) {
        match self.to_host.try_send(ClientHostMsg::SubmitGuess(guess)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("host connection is backed up, guess dropped"),
            Err(TrySendError::Closed(_)) => warn!("host connection is gone, guess dropped"),
        }
    }
}
