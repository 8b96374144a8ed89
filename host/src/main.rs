use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Context;
use local_ip_address::local_ip;
use mdns_sd::ServiceDaemon;
use session::SessionController;
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc},
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    broadcast_msg::BroadcastMsg,
    client_db::ClientDb,
    config::HostConfig,
    console_cmd::HostCmd,
    console_input::console_input_thread,
    console_view::ConsoleHostView,
    register_mdns::register_mdns,
    session_loop::{run_session, BroadcastChannel, SessionInput},
};

mod broadcast_msg;
mod client_db;
mod config;
mod console_cmd;
mod console_input;
mod console_view;
mod register_mdns;
mod session_loop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = HostConfig::load();

    let addr = SocketAddr::new(IpAddr::from(Ipv4Addr::UNSPECIFIED), config.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    let mdns = if config.advertise_mdns { advertise(&config) } else { None };

    let (tx, _) = broadcast::channel::<BroadcastMsg>(config.broadcast_capacity);
    let (to_session, from_clients) = mpsc::channel::<SessionInput>(config.queue_capacity);

    spawn_console_forwarder(to_session.clone());
    tokio::spawn(accept_loop(listener, tx.clone(), to_session));

    let mut session = SessionController::new(BroadcastChannel::new(tx), ConsoleHostView);
    if config.auto_guess_all {
        session.toggle_auto_guess_for_all(true);
    }

    tokio::select! {
        _ = run_session(session, from_clients) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("failed to listen for ctrl-c: {e}");
            }
            info!("shutting down");
        }
    }

    if let Some(mdns) = mdns {
        if let Err(e) = mdns.shutdown() {
            warn!("failed to shut down mdns: {e}");
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn advertise(config: &HostConfig) -> Option<ServiceDaemon> {
    let my_local_ip = match local_ip() {
        Ok(ip) => ip,
        Err(e) => {
            warn!("no local ip, not advertising: {e}");
            return None;
        }
    };
    match register_mdns(my_local_ip, config.port, &config.service_type, &config.instance_name) {
        Ok(mdns) => {
            info!("advertising {} at {my_local_ip}:{}", config.service_type, config.port);
            Some(mdns)
        }
        Err(e) => {
            warn!("not advertising: {e:#}");
            None
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    tx: broadcast::Sender<BroadcastMsg>,
    to_session: mpsc::Sender<SessionInput>,
) {
    let mut client_db = ClientDb::new();
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                client_db.new_client(socket, addr, &tx, to_session.clone());
            }
            Err(e) => error!("failed to accept connection: {e}"),
        }
    }
}

fn spawn_console_forwarder(to_session: mpsc::Sender<SessionInput>) {
    let mut console_receiver = console_input_thread();
    tokio::spawn(async move {
        while let Some(line) = console_receiver.recv().await {
            match HostCmd::parse(&line) {
                Ok(cmd) => {
                    if to_session.send(SessionInput::Console(cmd)).await.is_err() {
                        break;
                    }
                }
                Err(e) => println!("err: {e}"),
            }
        }
    });
}
