use msgs::{Address, ClientHostMsg, HostClientMsg};
use serde::Serialize;
use session::{
    ClientId, HostEvent, HostView, MatrixSnapshot, ReplicationChannel, SessionController, SessionPhase,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::{
    broadcast_msg::BroadcastMsg,
    console_cmd::{HostCmd, HELP},
};

/// Everything that can change the session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Connected(ClientId),
    Disconnected(ClientId),
    Message(ClientId, ClientHostMsg),
    Console(HostCmd),
}

/// Fans host events out to the client processes.
pub struct BroadcastChannel {
    tx: broadcast::Sender<BroadcastMsg>,
}

impl BroadcastChannel {
    pub fn new(tx: broadcast::Sender<BroadcastMsg>) -> BroadcastChannel {
        BroadcastChannel { tx }
    }

    pub fn send(&self, address: Address, msg: HostClientMsg) {
        if let Err(e) = self.tx.send(BroadcastMsg::Send(address, msg.to_bytes())) {
            debug!("no client process listening: {e}");
        }
    }

    pub fn kick(&self, session_id: ClientId) {
        if self.tx.send(BroadcastMsg::Kick(session_id)).is_err() {
            warn!(session_id, "nobody to kick");
        }
    }
}

impl ReplicationChannel for BroadcastChannel {
    fn broadcast(&mut self, event: HostEvent) {
        self.send(Address::All, HostClientMsg::Event(event));
    }

    fn send_to(&mut self, client: ClientId, event: HostEvent) {
        self.send(Address::Client(client), HostClientMsg::Event(event));
    }
}

#[derive(Debug, Serialize)]
pub struct HostStatus {
    pub phase: SessionPhase,
    pub participants: usize,
    pub submissions: usize,
    pub matrix: MatrixSnapshot,
}

pub type HostSession<V> = SessionController<BroadcastChannel, V>;

/// Applies inputs one at a time until every sender is gone.
pub async fn run_session<V: HostView>(
    mut session: HostSession<V>,
    mut inputs: mpsc::Receiver<SessionInput>,
) -> HostSession<V> {
    while let Some(input) = inputs.recv().await {
        handle_input(&mut session, input);
    }
    info!("all session inputs closed");
    session
}

pub fn handle_input<V: HostView>(session: &mut HostSession<V>, input: SessionInput) {
    match input {
        SessionInput::Connected(session_id) => {
            session.client_connected(session_id);
            session
                .channel()
                .send(Address::Other(session_id), HostClientMsg::ClientConnected(session_id));
        }
        SessionInput::Disconnected(session_id) => {
            session.client_disconnected(session_id);
            session
                .channel()
                .send(Address::Other(session_id), HostClientMsg::ClientDisconnected(session_id));
        }
        SessionInput::Message(session_id, ClientHostMsg::SubmitGuess(guess)) => {
            // Rejections are logged by the controller.
            let _ = session.submit_guess(session_id, guess);
        }
        SessionInput::Message(session_id, ClientHostMsg::Disconnect) => {
            debug!(session_id, "disconnect is handled by the client process");
        }
        SessionInput::Console(cmd) => handle_console_cmd(session, cmd),
    }
}

fn handle_console_cmd<V: HostView>(session: &mut HostSession<V>, cmd: HostCmd) {
    match cmd {
        HostCmd::Input(line) => {
            session.submit_numeric_input(&line);
        }
        HostCmd::AutoGuess(enabled) => session.toggle_auto_guess_for_all(enabled),
        HostCmd::Kick(session_id) => session.channel().kick(session_id),
        HostCmd::Status => match serde_json::to_string_pretty(&status(session)) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!("failed to serialize status: {e}"),
        },
        HostCmd::Help => println!("{HELP}"),
    }
}

pub fn status<V: HostView>(session: &HostSession<V>) -> HostStatus {
    HostStatus {
        phase: session.phase(),
        participants: session.participant_count(),
        submissions: session.round().map_or(0, |round| round.submission_count()),
        matrix: session.snapshot(),
    }
}
