use std::net::SocketAddr;

use msgs::{ClientHostMsg, HostClientMsg};
use session::ClientId;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::{broadcast, mpsc},
};
use tracing::{debug, error, info, warn};

use crate::{broadcast_msg::BroadcastMsg, session_loop::SessionInput};

pub struct ClientDb {
    pub session_id_counter: ClientId,
}

impl ClientDb {
    pub fn new() -> ClientDb {
        ClientDb { session_id_counter: 0 }
    }

    pub fn new_client(
        &mut self,
        socket: TcpStream,
        addr: SocketAddr,
        tx: &broadcast::Sender<BroadcastMsg>,
        to_session: mpsc::Sender<SessionInput>,
    ) -> ClientId {
        let session_id = self.session_id_counter;
        spawn_client_process(socket, tx.clone(), to_session, session_id, addr);
        self.session_id_counter += 1;
        info!(session_id, "accepted client {addr}");
        session_id
    }
}

/// Owns one participant socket.
///
/// Decoded client messages go to the session task; broadcast frames
/// addressed to this client go out on the socket.
pub fn spawn_client_process(
    mut socket: TcpStream,
    tx: broadcast::Sender<BroadcastMsg>,
    to_session: mpsc::Sender<SessionInput>,
    session_id: ClientId,
    addr: SocketAddr,
) {
    tokio::spawn(async move {
        if let Err(e) = socket.write_all(&HostClientMsg::Hello(session_id).to_bytes()).await {
            warn!(session_id, "disconnecting because of error while writing to client: {e}");
            return;
        }

        // Subscribe before announcing, so the snapshot sent in reply to
        // `Connected` cannot be missed.
        let mut rx = tx.subscribe();
        if to_session.send(SessionInput::Connected(session_id)).await.is_err() {
            return;
        }

        let mut static_buffer = [0; 1024];
        let mut input_buffer = Vec::new();

        'connected: loop {
            tokio::select! {
                biased;
                result = rx.recv() => {
                    let broadcast_msg = match result {
                        Ok(msg) => msg,
                        Err(e) => {
                            error!(session_id, "error while receiving broadcast: {e}");
                            break;
                        }
                    };

                    match broadcast_msg {
                        BroadcastMsg::Send(address, output_buffer) => {
                            if address.includes(session_id) {
                                if let Err(e) = socket.write_all(&output_buffer).await {
                                    warn!(session_id, "disconnecting because of error while writing to socket: {e}");
                                    break;
                                }
                            }
                        }
                        BroadcastMsg::Kick(to_kick) => {
                            if to_kick == session_id {
                                info!(session_id, "kicked");
                                break;
                            }
                        }
                    }
                }
                result = socket.read(&mut static_buffer) => {
                    let len = match result {
                        Ok(len) => len,
                        Err(e) => {
                            warn!(session_id, "error while reading from socket: {e}");
                            break;
                        }
                    };
                    if len == 0 {
                        info!(session_id, "client closed the connection {addr}");
                        break;
                    }
                    input_buffer.extend(&static_buffer[..len]);

                    loop {
                        let msg = match ClientHostMsg::dequeue_and_decode(&input_buffer) {
                            Ok(Some((cursor, msg))) => {
                                input_buffer.drain(..cursor);
                                msg
                            }
                            Ok(None) => break,
                            Err(e) => {
                                warn!(session_id, "error while decoding msg: {e:#}");
                                break 'connected;
                            }
                        };

                        match msg {
                            ClientHostMsg::Disconnect => {
                                debug!(session_id, "client said goodbye");
                                break 'connected;
                            }
                            msg => {
                                if to_session.send(SessionInput::Message(session_id, msg)).await.is_err() {
                                    break 'connected;
                                }
                            }
                        }
                    }
                }
            }
        }

        let _ = to_session.send(SessionInput::Disconnected(session_id)).await;
    });
}
