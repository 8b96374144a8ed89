use console_cmd::ParticipantCmd;
use console_input::console_input_thread;
use console_view::ConsoleParticipantView;
use host_link::ChannelHostLink;
use msgs::spawn_host_connection_process;
use process::{process_console_cmd, process_host_event};
use session::ParticipantController;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ParticipantConfig;

mod config;
mod console_cmd;
mod console_input;
mod console_view;
mod host_link;
mod process;

#[tokio::main]
async fn main() {
    init_tracing();
    let config = ParticipantConfig::load(std::env::args().nth(1));

    let (host_to_main, mut main_from_host) = mpsc::channel(100);
    let to_host = spawn_host_connection_process(config.target(), config.reconnect_delay(), host_to_main);
    let mut console_receiver = console_input_thread();

    let mut participant = ParticipantController::new(ChannelHostLink::new(to_host), ConsoleParticipantView::default());
    participant.set_auto_guess(config.auto_guess);

    loop {
        tokio::select! {
            event = main_from_host.recv() => {
                let Some(event) = event else { break };
                process_host_event(&mut participant, event);
            }
            line = console_receiver.recv() => {
                let Some(line) = line else {
                    info!("console closed");
                    break;
                };
                let result = ParticipantCmd::parse(&line).and_then(|cmd| process_console_cmd(&mut participant, cmd));
                if let Err(e) = result {
                    println!("err: {e}");
                }
            }
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}
