use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::{
    aggregator::{GuessAggregator, RoundOutcome, RoundState},
    error::Rejection,
    matrix::{MatrixSnapshot, Role, SharedMatrixState},
    phase::SessionPhase,
    replication::{HostEvent, ReplicationChannel},
    state_machine::{InputOutcome, SessionStateMachine},
    view::HostView,
    ClientId,
};

/// The authoritative side of a session.
///
/// Owns the matrix, the setup wizard and the guess aggregator. Every method
/// takes `&mut self`: callers serialize all inputs (operator lines,
/// connection changes, guesses) through one owner, which makes each guess
/// insertion and its completion check a single step.
pub struct SessionController<C, V> {
    channel: C,
    view: V,
    matrix: SharedMatrixState,
    machine: SessionStateMachine,
    aggregator: Option<GuessAggregator>,
    participants: BTreeSet<ClientId>,
    auto_guess_all: Option<bool>,
}

impl<C: ReplicationChannel, V: HostView> SessionController<C, V> {
    pub fn new(channel: C, mut view: V) -> SessionController<C, V> {
        let machine = SessionStateMachine::new();
        info!("session setup started");
        view.on_prompt_changed(&machine.prompt().to_string());
        SessionController {
            channel,
            view,
            matrix: SharedMatrixState::new(Role::Host),
            machine,
            aggregator: None,
            participants: BTreeSet::new(),
            auto_guess_all: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    pub fn matrix(&self) -> &SharedMatrixState {
        &self.matrix
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.aggregator.as_ref().map(GuessAggregator::round)
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn game_started(&self) -> bool {
        self.aggregator.is_some()
    }

    pub fn snapshot(&self) -> MatrixSnapshot {
        MatrixSnapshot {
            ready: self.game_started(),
            auto_guess: self.auto_guess_all,
            ..self.matrix.snapshot()
        }
    }

    /// One line typed by the operator. An empty line confirms.
    pub fn submit_numeric_input(&mut self, text: &str) -> InputOutcome {
        let outcome = self.machine.advance(text, &mut self.matrix);
        for delta in &outcome.deltas {
            self.view.on_matrix_delta(&self.matrix, delta);
            self.channel.broadcast(HostEvent::Delta(delta.clone()));
        }
        if outcome.game_started {
            self.start_game();
        }
        self.view.on_prompt_changed(&outcome.prompt_text());
        outcome
    }

    fn start_game(&mut self) {
        let dimensions = self.matrix.dimensions();
        info!(rows = dimensions.rows, columns = dimensions.columns, "game started");
        self.aggregator = Some(GuessAggregator::new(dimensions.columns as usize));
        self.channel.broadcast(HostEvent::MatrixReady);
    }

    /// A participant connected; it gets the full snapshot before anything else.
    pub fn client_connected(&mut self, client: ClientId) {
        if !self.participants.insert(client) {
            warn!(client, "participant connected twice");
        }
        info!(client, participants = self.participants.len(), "participant joined");
        let snapshot = self.snapshot();
        self.channel.send_to(client, HostEvent::Snapshot(snapshot));
    }

    /// A participant left. Its pending guess is dropped and the round is
    /// re-checked against the remaining participants.
    pub fn client_disconnected(&mut self, client: ClientId) -> Option<RoundOutcome> {
        if !self.participants.remove(&client) {
            debug!(client, "unknown participant disconnected");
            return None;
        }
        info!(client, participants = self.participants.len(), "participant left");
        if let Some(aggregator) = self.aggregator.as_mut() {
            if aggregator.withdraw(client) {
                debug!(client, "pending guess withdrawn");
                if aggregator.round().submission_count() == 0 {
                    self.machine.abandon_round();
                }
            }
        }
        self.check_round()
    }

    pub fn submit_guess(&mut self, client: ClientId, guess: Vec<f32>) -> Result<Option<RoundOutcome>, Rejection> {
        let result = self.try_submit_guess(client, guess);
        if let Err(e) = &result {
            warn!(client, "guess rejected: {e}");
        }
        result
    }

    fn try_submit_guess(&mut self, client: ClientId, guess: Vec<f32>) -> Result<Option<RoundOutcome>, Rejection> {
        if !self.participants.contains(&client) {
            return Err(Rejection::UnknownClient(client));
        }
        let phase = self.machine.phase();
        if !phase.accepts_guesses() {
            return Err(Rejection::OutOfPhase(phase));
        }
        let Some(aggregator) = self.aggregator.as_mut() else {
            return Err(Rejection::OutOfPhase(phase));
        };
        aggregator.record(client, guess)?;
        debug!(
            client,
            submitted = aggregator.round().submission_count(),
            participants = self.participants.len(),
            "guess recorded"
        );
        self.machine.begin_round();
        Ok(self.check_round())
    }

    fn check_round(&mut self) -> Option<RoundOutcome> {
        let aggregator = self.aggregator.as_mut()?;
        let solution = self.matrix.solution()?;
        let outcome = aggregator.try_resolve(self.participants.len(), solution)?;
        self.machine.resolve_round();
        info!(round = outcome.round, average = ?outcome.average, "round resolved");
        self.view.on_round_resolved(&outcome);
        self.channel.broadcast(HostEvent::RoundResolved(outcome.clone()));
        Some(outcome)
    }

    /// Pushes the auto-guess preference to every participant.
    pub fn toggle_auto_guess_for_all(&mut self, enabled: bool) {
        info!(enabled, "auto-guess for all participants");
        self.auto_guess_all = Some(enabled);
        self.channel.broadcast(HostEvent::AutoGuessPreference(enabled));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregator::Classification, matrix::MatrixDelta, prompt::Prompt, replication::EventLog};

    #[derive(Default)]
    struct RecordingView {
        prompts: Vec<String>,
        deltas: usize,
        rounds: Vec<u64>,
    }

    impl HostView for RecordingView {
        fn on_prompt_changed(&mut self, text: &str) {
            self.prompts.push(text.to_owned());
        }

        fn on_matrix_delta(&mut self, _matrix: &SharedMatrixState, _delta: &MatrixDelta) {
            self.deltas += 1;
        }

        fn on_round_resolved(&mut self, outcome: &RoundOutcome) {
            self.rounds.push(outcome.round);
        }
    }

    fn started(inputs: &[&str]) -> SessionController<EventLog, RecordingView> {
        let mut host = SessionController::new(EventLog::default(), RecordingView::default());
        for input in inputs {
            host.submit_numeric_input(input);
        }
        host
    }

    fn resolutions(log: &EventLog) -> usize {
        log.events
            .iter()
            .filter(|(_, event)| matches!(event, HostEvent::RoundResolved(_)))
            .count()
    }

    #[test]
    fn wizard_prompts_reach_the_view() {
        let host = started(&["2", "x"]);
        assert_eq!(
            host.view().prompts,
            vec![
                Prompt::Rows.to_string(),
                Prompt::Columns.to_string(),
                Prompt::Columns.retry_text(),
            ]
        );
    }

    #[test]
    fn setup_is_replicated_before_matrix_ready() {
        let host = started(&["1", "2", "3", "4", "1", "1", "", ""]);
        let events: Vec<_> = host.channel().events.iter().map(|(_, event)| event.clone()).collect();
        assert_eq!(
            events,
            vec![
                HostEvent::Delta(MatrixDelta::Dimensions(crate::MatrixDimensions::new(1, 2))),
                HostEvent::Delta(MatrixDelta::Coefficient { index: 0, value: 3.0 }),
                HostEvent::Delta(MatrixDelta::Coefficient { index: 1, value: 4.0 }),
                HostEvent::Delta(MatrixDelta::Augmented(vec![7.0])),
                HostEvent::MatrixReady,
            ]
        );
        assert_eq!(host.view().deltas, 4);
        assert!(host.game_started());
    }

    #[test]
    fn late_joiner_gets_a_ready_snapshot_without_solution() {
        let mut host = started(&["1", "1", "2", "5", "", ""]);
        host.channel_mut().drain();
        host.client_connected(9);
        let (to, event) = &host.channel().events[0];
        assert_eq!(*to, Some(9));
        let HostEvent::Snapshot(snapshot) = event else {
            panic!("expected snapshot, got {event:?}");
        };
        assert!(snapshot.ready);
        assert_eq!(snapshot.coefficients, vec![2.0]);
        assert_eq!(snapshot.augmented, vec![10.0]);
    }

    #[test]
    fn guesses_before_game_start_are_out_of_phase() {
        let mut host = started(&["1", "1"]);
        host.client_connected(1);
        assert_eq!(
            host.submit_guess(1, vec![1.0]),
            Err(Rejection::OutOfPhase(SessionPhase::SetCoefficients))
        );
    }

    #[test]
    fn unknown_clients_are_rejected() {
        let mut host = started(&["1", "1", "2", "5", "", ""]);
        assert_eq!(host.submit_guess(4, vec![1.0]), Err(Rejection::UnknownClient(4)));
    }

    #[test]
    fn round_resolves_once_all_three_guess() {
        let mut host = started(&["1", "2", "1", "1", "10", "0", "", ""]);
        for client in 1..=3 {
            host.client_connected(client);
        }
        host.channel_mut().drain();

        assert_eq!(host.submit_guess(1, vec![0.0, 0.0]), Ok(None));
        assert_eq!(host.phase(), SessionPhase::AdjustingSliders);
        assert_eq!(host.submit_guess(2, vec![10.0, 10.0]), Ok(None));
        assert_eq!(resolutions(host.channel()), 0);

        let outcome = host.submit_guess(3, vec![20.0, 20.0]).unwrap().unwrap();
        assert_eq!(outcome.average, vec![10.0, 10.0]);
        assert_eq!(outcome.classification, vec![Classification::Exact, Classification::Close]);
        assert_eq!(resolutions(host.channel()), 1);
        assert_eq!(host.phase(), SessionPhase::ViewingMatrix);
        assert_eq!(host.round().map(RoundState::submission_count), Some(0));
        assert_eq!(host.view().rounds, vec![1]);
    }

    #[test]
    fn disconnect_mid_round_unblocks_it() {
        let mut host = started(&["1", "1", "1", "4", "", ""]);
        for client in 1..=3 {
            host.client_connected(client);
        }
        host.submit_guess(1, vec![2.0]).unwrap();
        host.submit_guess(2, vec![6.0]).unwrap();
        assert!(host.submit_guess(3, vec![100.0]).unwrap().is_some());

        host.submit_guess(1, vec![2.0]).unwrap();
        host.submit_guess(2, vec![6.0]).unwrap();
        assert_eq!(resolutions(host.channel()), 1);

        let outcome = host.client_disconnected(3).unwrap();
        assert_eq!(outcome.average, vec![4.0]);
        assert_eq!(outcome.round, 2);
        assert_eq!(resolutions(host.channel()), 2);
        assert_eq!(host.participant_count(), 2);
        assert_eq!(host.round().map(RoundState::expected_count), Some(2));
    }

    #[test]
    fn withdrawing_the_only_guess_reopens_the_round() {
        let mut host = started(&["1", "1", "1", "4", "", ""]);
        host.client_connected(1);
        host.client_connected(2);
        host.submit_guess(1, vec![3.0]).unwrap();
        assert_eq!(host.phase(), SessionPhase::AdjustingSliders);

        assert_eq!(host.client_disconnected(1), None);
        assert_eq!(host.phase(), SessionPhase::ViewingMatrix);
        assert_eq!(host.round().map(RoundState::submission_count), Some(0));
        assert_eq!(resolutions(host.channel()), 0);

        assert_eq!(host.submit_guess(2, vec![4.0]).unwrap().unwrap().round, 1);
        assert_eq!(host.phase(), SessionPhase::ViewingMatrix);
    }

    #[test]
    fn idle_without_participants() {
        let mut host = started(&["1", "1", "1", "4", "", ""]);
        assert_eq!(host.client_disconnected(1), None);
        assert_eq!(resolutions(host.channel()), 0);
    }

    #[test]
    fn auto_guess_preference_fans_out_and_sticks() {
        let mut host = started(&[]);
        host.toggle_auto_guess_for_all(true);
        assert_eq!(host.channel().events, vec![(None, HostEvent::AutoGuessPreference(true))]);
        assert_eq!(host.snapshot().auto_guess, Some(true));
    }
}
