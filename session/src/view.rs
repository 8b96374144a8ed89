use crate::{
    aggregator::RoundOutcome,
    matrix::{MatrixDelta, MatrixDimensions, SharedMatrixState},
};

/// Presentation on the host side.
pub trait HostView {
    fn on_prompt_changed(&mut self, text: &str);

    /// Called for every matrix change while the operator fills the matrix in.
    fn on_matrix_delta(&mut self, _matrix: &SharedMatrixState, _delta: &MatrixDelta) {}

    fn on_round_resolved(&mut self, _outcome: &RoundOutcome) {}
}

/// Presentation on a participant, including its guess form.
pub trait ParticipantView {
    fn on_prompt_changed(&mut self, text: &str);
    fn on_matrix_ready(&mut self, dimensions: MatrixDimensions, coefficients: &[f32], augmented: &[f32]);
    fn on_round_resolved(&mut self, outcome: &RoundOutcome);
    fn on_auto_guess_preference_changed(&mut self, enabled: bool);

    /// Creates a guess form with one zeroed entry per unknown.
    fn open_guess_form(&mut self, columns: usize);
    /// Current values of the guess form.
    fn read_guess(&self) -> Vec<f32>;
    /// Overwrites the values of the guess form.
    fn show_guess(&mut self, guess: &[f32]);
}
