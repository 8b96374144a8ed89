use msgs::{HostClientMsg, HostConnectionEvent};
use session::{HostLink, ParticipantController, ParticipantView, SessionPhase};
use tracing::{info, warn};

use crate::{
    console_cmd::{ParticipantCmd, HELP},
    console_view::ConsoleParticipantView,
};

pub type Participant<L> = ParticipantController<L, ConsoleParticipantView>;

pub fn process_host_event<L: HostLink>(participant: &mut Participant<L>, event: HostConnectionEvent) {
    match event {
        HostConnectionEvent::Connected(addr) => info!("connection to {addr} open, waiting for hello"),
        HostConnectionEvent::Msg(HostClientMsg::Hello(session_id)) => participant.connected(session_id),
        HostConnectionEvent::Msg(HostClientMsg::ClientConnected(session_id)) => {
            info!(session_id, "participant joined");
        }
        HostConnectionEvent::Msg(HostClientMsg::ClientDisconnected(session_id)) => {
            info!(session_id, "participant left");
        }
        HostConnectionEvent::Msg(HostClientMsg::Event(event)) => participant.apply_event(event),
        HostConnectionEvent::Lost => {
            warn!("lost connection to host, reconnecting");
            participant.disconnected();
        }
    }
}

pub fn process_console_cmd<L: HostLink>(participant: &mut Participant<L>, cmd: ParticipantCmd) -> anyhow::Result<()> {
    match cmd {
        ParticipantCmd::Confirm => participant.confirm()?,
        ParticipantCmd::Set { slider, value } => {
            if participant.phase() != SessionPhase::AdjustingSliders {
                anyhow::bail!("confirm first to open the guess form");
            }
            match participant.view_mut().set_slider(slider, value) {
                Some(value) => println!("x{} = {value:.2}", slider + 1),
                None => anyhow::bail!("there is no slider {}", slider + 1),
            }
        }
        ParticipantCmd::Guess(values) => {
            if participant.phase() == SessionPhase::ViewingMatrix {
                participant.confirm()?;
            }
            let columns = participant.replica().dimensions().columns as usize;
            if values.len() != columns {
                anyhow::bail!("expected {columns} values, got {}", values.len());
            }
            if participant.phase() != SessionPhase::AdjustingSliders {
                anyhow::bail!("not ready for a guess yet");
            }
            participant.view_mut().show_guess(&values);
            participant.confirm()?;
        }
        ParticipantCmd::AutoGuess(enabled) => participant.set_auto_guess(enabled),
        ParticipantCmd::ApplyAuto => {
            if !participant.apply_auto_guess() {
                anyhow::bail!("no average to apply yet");
            }
            print!("{}", participant.view().render());
        }
        ParticipantCmd::Show => print!("{}", participant.view().render()),
        ParticipantCmd::Help => println!("{HELP}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use session::{HostEvent, MatrixDimensions, MatrixSnapshot};

    use super::*;

    #[derive(Default)]
    struct Sent(Vec<Vec<f32>>);

    impl HostLink for Sent {
        fn submit_guess(&mut self, guess: Vec<f32>) {
            self.0.push(guess);
        }
    }

    fn joined() -> Participant<Sent> {
        let mut participant = ParticipantController::new(Sent::default(), ConsoleParticipantView::default());
        process_host_event(&mut participant, HostConnectionEvent::Msg(HostClientMsg::Hello(3)));
        let snapshot = MatrixSnapshot {
            dimensions: MatrixDimensions::new(2, 2),
            coefficients: vec![1.0, 0.0, 0.0, 1.0],
            augmented: vec![5.0, 6.0],
            ready: true,
            auto_guess: None,
        };
        process_host_event(
            &mut participant,
            HostConnectionEvent::Msg(HostClientMsg::Event(HostEvent::Snapshot(snapshot))),
        );
        participant
    }

    #[test]
    fn guess_command_opens_fills_and_submits() {
        let mut participant = joined();
        assert_eq!(participant.session_id(), Some(3));
        process_console_cmd(&mut participant, ParticipantCmd::Guess(vec![5.0, 600.0])).unwrap();
        assert_eq!(participant.link().0, vec![vec![5.0, 100.0]]);
    }

    #[test]
    fn set_needs_an_open_form() {
        let mut participant = joined();
        let set = ParticipantCmd::Set { slider: 1, value: 2.0 };
        assert!(process_console_cmd(&mut participant, set.clone()).is_err());

        process_console_cmd(&mut participant, ParticipantCmd::Confirm).unwrap();
        process_console_cmd(&mut participant, set).unwrap();
        process_console_cmd(&mut participant, ParticipantCmd::Confirm).unwrap();
        assert_eq!(participant.link().0, vec![vec![0.0, 2.0]]);
    }

    #[test]
    fn no_guesses_while_the_connection_is_down() {
        let mut participant = joined();
        process_console_cmd(&mut participant, ParticipantCmd::Confirm).unwrap();
        process_host_event(&mut participant, HostConnectionEvent::Lost);

        assert!(process_console_cmd(&mut participant, ParticipantCmd::Guess(vec![1.0, 2.0])).is_err());
        assert!(process_console_cmd(&mut participant, ParticipantCmd::Confirm).is_err());
        assert!(participant.link().0.is_empty());
    }

    #[test]
    fn wrong_guess_length_is_refused() {
        let mut participant = joined();
        assert!(process_console_cmd(&mut participant, ParticipantCmd::Guess(vec![1.0])).is_err());
        assert!(participant.link().0.is_empty());
    }
}
