use tracing::{debug, info, warn};

use crate::{
    aggregator::RoundOutcome,
    error::SessionError,
    matrix::{MatrixSnapshot, Role, SharedMatrixState},
    phase::SessionPhase,
    prompt::Prompt,
    replication::{HostEvent, HostLink},
    view::ParticipantView,
    ClientId,
};

/// Range of a guess form entry.
pub const SLIDER_MIN: f32 = -100.0;
pub const SLIDER_MAX: f32 = 100.0;

/// The passive side of a session.
///
/// Holds a client copy of the matrix, fed only through [`apply_event`],
/// and drives the local `Connecting → ViewingMatrix ⇄ AdjustingSliders` flow.
///
/// [`apply_event`]: ParticipantController::apply_event
pub struct ParticipantController<L, V> {
    link: L,
    view: V,
    replica: SharedMatrixState,
    phase: SessionPhase,
    session_id: Option<ClientId>,
    /// Set by the first snapshot of a connection.
    synced: bool,
    form_open: bool,
    auto_guess_every_turn: bool,
    last_average: Option<Vec<f32>>,
}

impl<L: HostLink, V: ParticipantView> ParticipantController<L, V> {
    pub fn new(link: L, mut view: V) -> ParticipantController<L, V> {
        view.on_prompt_changed(&Prompt::Connecting.to_string());
        ParticipantController {
            link,
            view,
            replica: SharedMatrixState::new(Role::Client),
            phase: SessionPhase::Connecting,
            session_id: None,
            synced: false,
            form_open: false,
            auto_guess_every_turn: false,
            last_average: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn replica(&self) -> &SharedMatrixState {
        &self.replica
    }

    pub fn session_id(&self) -> Option<ClientId> {
        self.session_id
    }

    pub fn auto_guess_every_turn(&self) -> bool {
        self.auto_guess_every_turn
    }

    pub fn last_average(&self) -> Option<&[f32]> {
        self.last_average.as_deref()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// A (new) connection to the host was established.
    ///
    /// Everything replicated so far is dropped; the host follows up with a
    /// snapshot. Events that reach the connection before that snapshot are
    /// already folded into it and are dropped.
    pub fn connected(&mut self, session_id: ClientId) {
        info!(session_id, "connected to host");
        self.session_id = Some(session_id);
        self.reset();
    }

    /// The connection to the host was lost.
    ///
    /// Nothing can be submitted until the next [`connected`].
    ///
    /// [`connected`]: ParticipantController::connected
    pub fn disconnected(&mut self) {
        info!(session_id = ?self.session_id, "lost host");
        self.session_id = None;
        self.reset();
    }

    fn reset(&mut self) {
        self.replica = SharedMatrixState::new(Role::Client);
        self.phase = SessionPhase::Connecting;
        self.synced = false;
        self.form_open = false;
        self.last_average = None;
        self.prompt(Prompt::Connecting);
    }

    pub fn apply_event(&mut self, event: HostEvent) {
        if !self.synced && !matches!(event, HostEvent::Snapshot(_) | HostEvent::AutoGuessPreference(_)) {
            debug!(event = ?event, "event before snapshot, dropping");
            return;
        }
        match event {
            HostEvent::Snapshot(snapshot) => self.apply_snapshot(&snapshot),
            HostEvent::Delta(delta) => self.replica.apply_delta(&delta),
            HostEvent::MatrixReady => self.matrix_ready(),
            HostEvent::RoundResolved(outcome) => self.round_resolved(outcome),
            HostEvent::AutoGuessPreference(enabled) => self.auto_guess_preference_changed(enabled),
        }
    }

    fn apply_snapshot(&mut self, snapshot: &MatrixSnapshot) {
        debug!(dimensions = ?snapshot.dimensions, ready = snapshot.ready, "snapshot applied");
        self.replica.apply_snapshot(snapshot);
        self.synced = true;
        if let Some(enabled) = snapshot.auto_guess {
            self.auto_guess_preference_changed(enabled);
        }
        if snapshot.ready {
            self.matrix_ready();
        }
    }

    fn matrix_ready(&mut self) {
        if self.phase != SessionPhase::Connecting {
            debug!(phase = ?self.phase, "matrix already shown");
            return;
        }
        let dimensions = self.replica.dimensions();
        info!(rows = dimensions.rows, columns = dimensions.columns, "matrix ready");
        self.phase = SessionPhase::ViewingMatrix;
        self.view
            .on_matrix_ready(dimensions, self.replica.coefficients(), self.replica.augmented());
        self.prompt(Prompt::MatrixReady);
    }

    fn round_resolved(&mut self, outcome: RoundOutcome) {
        if self.phase == SessionPhase::Connecting {
            debug!(round = outcome.round, "round outcome before matrix, ignoring");
            return;
        }
        info!(round = outcome.round, "round resolved");
        self.phase = SessionPhase::ViewingMatrix;
        self.view.on_round_resolved(&outcome);
        self.last_average = Some(outcome.average.clone());

        if self.auto_guess_every_turn {
            self.adjust();
            self.view.show_guess(&outcome.average);
            self.submit(outcome.average);
        } else {
            self.prompt(Prompt::NextGuess);
        }
    }

    fn auto_guess_preference_changed(&mut self, enabled: bool) {
        self.auto_guess_every_turn = enabled;
        self.view.on_auto_guess_preference_changed(enabled);
    }

    /// The local confirm button.
    ///
    /// Opens the guess form when viewing the matrix, submits the form when
    /// adjusting.
    pub fn confirm(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::ViewingMatrix => {
                self.adjust();
                self.prompt(Prompt::AdjustGuess);
                Ok(())
            }
            SessionPhase::AdjustingSliders => {
                let guess = self.view.read_guess();
                self.submit(guess);
                Ok(())
            }
            phase => {
                let e = SessionError::OutOfPhase { action: "confirm", phase };
                warn!("{e}");
                Err(e)
            }
        }
    }

    /// Local "auto-guess every turn" toggle.
    pub fn set_auto_guess(&mut self, enabled: bool) {
        debug!(enabled, "auto-guess every turn");
        self.auto_guess_every_turn = enabled;
    }

    /// Fills the guess form with the last average without submitting.
    pub fn apply_auto_guess(&mut self) -> bool {
        if self.phase != SessionPhase::AdjustingSliders {
            return false;
        }
        let Some(average) = self.last_average.as_deref() else {
            return false;
        };
        self.view.show_guess(average);
        true
    }

    fn adjust(&mut self) {
        if !self.form_open {
            self.view.open_guess_form(self.replica.dimensions().columns as usize);
            self.form_open = true;
        }
        self.phase = SessionPhase::AdjustingSliders;
    }

    fn submit(&mut self, guess: Vec<f32>) {
        debug!(guess = ?guess, "submitting guess");
        self.link.submit_guess(guess);
        self.prompt(Prompt::GuessSubmitted);
    }

    fn prompt(&mut self, prompt: Prompt) {
        self.view.on_prompt_changed(&prompt.to_string());
    }
}
