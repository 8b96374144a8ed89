use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::mpsc,
};
use tracing::{debug, error, info, warn};

use crate::{client_host_msg::ClientHostMsg, discover_host::find_local_host, host_client_msg::HostClientMsg};

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the participant finds its host.
#[derive(Debug, Clone)]
pub enum HostTarget {
    Address(String),
    Discover { service_type: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostConnectionEvent {
    Connected(String),
    Msg(HostClientMsg),
    /// The connection dropped; a new one is attempted after the back-off.
    Lost,
}

/// Keeps one connection to the host alive, reconnecting after `reconnect_delay`.
///
/// Decoded host frames go to `to_main`; messages sent on the returned sender
/// go to the host. Ends once the main side hangs up.
pub fn spawn_host_connection_process(
    target: HostTarget,
    reconnect_delay: Duration,
    to_main: mpsc::Sender<HostConnectionEvent>,
) -> mpsc::Sender<ClientHostMsg> {
    let (main_to_host, mut host_from_main) = mpsc::channel::<ClientHostMsg>(100);
    tokio::spawn(async move {
        loop {
            let addr = match resolve(&target).await {
                Some(addr) => addr,
                None => {
                    tokio::time::sleep(reconnect_delay).await;
                    continue;
                }
            };

            let mut stream = match TcpStream::connect(&addr).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("failed to connect to {addr}: {e}");
                    tokio::time::sleep(reconnect_delay).await;
                    continue;
                }
            };
            info!("connected to host at {addr}");
            let stale = drop_stale(&mut host_from_main);
            if stale > 0 {
                warn!(stale, "dropped messages queued while disconnected");
            }
            if to_main.send(HostConnectionEvent::Connected(addr.clone())).await.is_err() {
                return;
            }

            let mut static_buffer = [0; 1024];
            let mut input_buffer = Vec::new();

            'connected: loop {
                tokio::select! {
                    result = stream.read(&mut static_buffer) => {
                        let len = match result {
                            Ok(len) => len,
                            Err(e) => {
                                error!("error while reading from socket: {e}, restarting connection");
                                break 'connected;
                            }
                        };
                        if len == 0 {
                            warn!("host closed the connection");
                            break 'connected;
                        }
                        input_buffer.extend(&static_buffer[..len]);

                        loop {
                            match HostClientMsg::dequeue_and_decode(&input_buffer) {
                                Ok(Some((cursor, msg))) => {
                                    input_buffer.drain(..cursor);
                                    if to_main.send(HostConnectionEvent::Msg(msg)).await.is_err() {
                                        return;
                                    }
                                }
                                Ok(None) => break,
                                Err(e) => {
                                    error!("error while decoding host msg: {e:#}, restarting connection");
                                    break 'connected;
                                }
                            }
                        }
                    }
                    result = host_from_main.recv() => {
                        let Some(msg) = result else {
                            debug!("main hung up, leaving host");
                            let _ = stream.write_all(&ClientHostMsg::Disconnect.to_bytes()).await;
                            return;
                        };
                        if let Err(e) = stream.write_all(&msg.to_bytes()).await {
                            error!("error while writing to stream: {e}, restarting connection");
                            break 'connected;
                        }
                    }
                }
            }

            if to_main.send(HostConnectionEvent::Lost).await.is_err() {
                return;
            }
            tokio::time::sleep(reconnect_delay).await;
        }
    });
    main_to_host
}

/// Empties the outgoing queue; what was queued for an old connection
/// means nothing to the next one.
fn drop_stale(host_from_main: &mut mpsc::Receiver<ClientHostMsg>) -> usize {
    let mut dropped = 0;
    while host_from_main.try_recv().is_ok() {
        dropped += 1;
    }
    dropped
}

async fn resolve(target: &HostTarget) -> Option<String> {
    match target {
        HostTarget::Address(addr) => Some(addr.clone()),
        HostTarget::Discover { service_type } => {
            let service_type = service_type.clone();
            let result = tokio::task::spawn_blocking(move || find_local_host(&service_type, DISCOVERY_TIMEOUT)).await;
            match result {
                Ok(Ok(Some(addr))) => Some(addr),
                Ok(Ok(None)) => {
                    debug!("no host found yet");
                    None
                }
                Ok(Err(e)) => {
                    error!("host discovery failed: {e:#}");
                    None
                }
                Err(e) => {
                    error!("host discovery task failed: {e}");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_drops_guesses_queued_while_lost() {
        let (main_to_host, mut host_from_main) = mpsc::channel(4);
        main_to_host.try_send(ClientHostMsg::SubmitGuess(vec![1.0])).unwrap();
        main_to_host.try_send(ClientHostMsg::SubmitGuess(vec![2.0])).unwrap();

        assert_eq!(drop_stale(&mut host_from_main), 2);
        assert!(host_from_main.try_recv().is_err());

        main_to_host.try_send(ClientHostMsg::SubmitGuess(vec![3.0])).unwrap();
        assert_eq!(host_from_main.try_recv().unwrap(), ClientHostMsg::SubmitGuess(vec![3.0]));
    }
}
