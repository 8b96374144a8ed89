//! Host setup wizard and round lifecycle.
//!
//! The operator feeds one line of text at a time into
//! [`SessionStateMachine::advance`]. Numeric phases parse the line, write the
//! value into the [`SharedMatrixState`] and move a row/column cursor; a line
//! that does not parse leaves phase and cursor untouched and asks again.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    error::SessionError,
    matrix::{MatrixDelta, MatrixDimensions, SharedMatrixState},
    phase::SessionPhase,
    prompt::Prompt,
};

/// Largest accepted row or column count.
pub const MAX_DIMENSION: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Cursor {
    pub row: usize,
    pub column: usize,
}

/// Result of feeding one line of operator input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputOutcome {
    pub accepted: bool,
    /// The prompt now in effect.
    pub prompt: Prompt,
    /// The input was unusable and `prompt` is asked again.
    pub retry: bool,
    /// Matrix changes to replicate, in the order they were applied.
    pub deltas: Vec<MatrixDelta>,
    /// This input moved the session from `StartGame` into the round loop.
    pub game_started: bool,
}

impl InputOutcome {
    pub fn prompt_text(&self) -> String {
        if self.retry {
            self.prompt.retry_text()
        } else {
            self.prompt.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: SessionPhase,
    dimensions: MatrixDimensions,
    cursor: Cursor,
    solution: Vec<f32>,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> SessionStateMachine {
        SessionStateMachine {
            phase: SessionPhase::SetRows,
            dimensions: MatrixDimensions::default(),
            cursor: Cursor::default(),
            solution: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn prompt(&self) -> Prompt {
        match self.phase {
            SessionPhase::SetRows => Prompt::Rows,
            SessionPhase::SetColumns => Prompt::Columns,
            SessionPhase::SetCoefficients => Prompt::Coefficient {
                row: self.cursor.row,
                column: self.cursor.column,
            },
            SessionPhase::SetSolution => Prompt::Solution { index: self.cursor.column },
            SessionPhase::ConfirmSetup => Prompt::ConfirmSetup,
            SessionPhase::StartGame => Prompt::StartGame,
            SessionPhase::Connecting
            | SessionPhase::ViewingMatrix
            | SessionPhase::AdjustingSliders
            | SessionPhase::GuessConfirmed => Prompt::RoundInProgress,
        }
    }

    pub fn advance(&mut self, input: &str, matrix: &mut SharedMatrixState) -> InputOutcome {
        let input = input.trim();
        match self.phase {
            SessionPhase::SetRows => match parse_dimension(input) {
                Ok(rows) => {
                    self.dimensions.rows = rows;
                    self.enter(SessionPhase::SetColumns);
                    self.accepted(Vec::new())
                }
                Err(e) => self.retry(e),
            },
            SessionPhase::SetColumns => match parse_dimension(input) {
                Ok(columns) => {
                    self.dimensions.columns = columns;
                    let deltas = matrix
                        .set_dimensions(self.dimensions.rows, columns)
                        .into_iter()
                        .collect();
                    self.cursor = Cursor::default();
                    self.enter(SessionPhase::SetCoefficients);
                    self.accepted(deltas)
                }
                Err(e) => self.retry(e),
            },
            SessionPhase::SetCoefficients => match parse_value(input) {
                Ok(value) => {
                    let deltas = matrix
                        .set_coefficient(self.cursor.row, self.cursor.column, value)
                        .into_iter()
                        .collect();
                    self.cursor.column += 1;
                    if self.cursor.column >= self.dimensions.columns as usize {
                        self.cursor.row += 1;
                        self.cursor.column = 0;
                    }
                    if self.cursor.row >= self.dimensions.rows as usize {
                        self.solution = vec![0.0; self.dimensions.columns as usize];
                        self.cursor = Cursor::default();
                        self.enter(SessionPhase::SetSolution);
                    }
                    self.accepted(deltas)
                }
                Err(e) => self.retry(e),
            },
            SessionPhase::SetSolution => match parse_value(input) {
                Ok(value) => {
                    self.solution[self.cursor.column] = value;
                    self.cursor.column += 1;
                    let mut deltas = Vec::new();
                    if self.cursor.column >= self.dimensions.columns as usize {
                        deltas.extend(matrix.set_solution(self.solution.clone()));
                        self.cursor = Cursor::default();
                        self.enter(SessionPhase::ConfirmSetup);
                    }
                    self.accepted(deltas)
                }
                Err(e) => self.retry(e),
            },
            SessionPhase::ConfirmSetup => {
                self.enter(SessionPhase::StartGame);
                self.accepted(Vec::new())
            }
            SessionPhase::StartGame => {
                self.enter(SessionPhase::ViewingMatrix);
                let mut outcome = self.accepted(Vec::new());
                outcome.game_started = true;
                outcome
            }
            phase => {
                let e = SessionError::OutOfPhase { action: "enter setup input", phase };
                warn!("{e}");
                InputOutcome {
                    accepted: false,
                    prompt: self.prompt(),
                    retry: false,
                    deltas: Vec::new(),
                    game_started: false,
                }
            }
        }
    }

    /// First guess of a round arrived.
    pub fn begin_round(&mut self) {
        if self.phase == SessionPhase::ViewingMatrix {
            self.enter(SessionPhase::AdjustingSliders);
        }
    }

    /// All guesses of a round arrived and the outcome went out.
    pub fn resolve_round(&mut self) {
        if self.phase == SessionPhase::AdjustingSliders {
            self.enter(SessionPhase::GuessConfirmed);
            self.enter(SessionPhase::ViewingMatrix);
        }
    }

    /// Every pending guess of the round was withdrawn.
    pub fn abandon_round(&mut self) {
        if self.phase == SessionPhase::AdjustingSliders {
            self.enter(SessionPhase::ViewingMatrix);
        }
    }

    fn enter(&mut self, next: SessionPhase) {
        debug!(from = ?self.phase, to = ?next, "phase transition");
        self.phase = next;
    }

    fn accepted(&self, deltas: Vec<MatrixDelta>) -> InputOutcome {
        InputOutcome {
            accepted: true,
            prompt: self.prompt(),
            retry: false,
            deltas,
            game_started: false,
        }
    }

    fn retry(&self, e: SessionError) -> InputOutcome {
        debug!(phase = ?self.phase, "{e}");
        InputOutcome {
            accepted: false,
            prompt: self.prompt(),
            retry: true,
            deltas: Vec::new(),
            game_started: false,
        }
    }
}

fn parse_dimension(input: &str) -> Result<u32, SessionError> {
    let invalid = |reason| SessionError::InvalidInput { input: input.to_owned(), reason };
    let value = input.parse::<i64>().map_err(|_| invalid("not a whole number"))?;
    if value <= 0 {
        return Err(invalid("must be positive"));
    }
    if value > MAX_DIMENSION as i64 {
        return Err(invalid("too large"));
    }
    Ok(value as u32)
}

fn parse_value(input: &str) -> Result<f32, SessionError> {
    let invalid = |reason| SessionError::InvalidInput { input: input.to_owned(), reason };
    let value = input.parse::<f32>().map_err(|_| invalid("not a number"))?;
    if !value.is_finite() {
        return Err(invalid("must be finite"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Role;

    fn feed(machine: &mut SessionStateMachine, matrix: &mut SharedMatrixState, inputs: &[&str]) -> Vec<InputOutcome> {
        inputs.iter().map(|input| machine.advance(input, matrix)).collect()
    }

    #[test]
    fn rows_then_columns_allocates_zero_matrix() {
        for (rows, columns) in [(1usize, 1usize), (2, 3), (4, 2), (64, 1)] {
            let mut machine = SessionStateMachine::new();
            let mut matrix = SharedMatrixState::new(Role::Host);
            let outcomes = feed(&mut machine, &mut matrix, &[&rows.to_string(), &columns.to_string()]);
            assert!(outcomes.iter().all(|outcome| outcome.accepted));
            assert_eq!(machine.phase(), SessionPhase::SetCoefficients);
            assert_eq!(matrix.coefficients().len(), rows * columns);
            assert!(matrix.coefficients().iter().all(|v| *v == 0.0));
            assert_eq!(outcomes[1].prompt, Prompt::Coefficient { row: 0, column: 0 });
        }
    }

    #[test]
    fn coefficients_fill_row_major() {
        let mut machine = SessionStateMachine::new();
        let mut matrix = SharedMatrixState::new(Role::Host);
        feed(&mut machine, &mut matrix, &["2", "2"]);

        let outcome = machine.advance("1", &mut matrix);
        assert_eq!(outcome.prompt, Prompt::Coefficient { row: 0, column: 1 });
        assert_eq!(outcome.deltas, vec![MatrixDelta::Coefficient { index: 0, value: 1.0 }]);

        let outcome = machine.advance("2", &mut matrix);
        assert_eq!(outcome.prompt, Prompt::Coefficient { row: 1, column: 0 });

        machine.advance("3", &mut matrix);
        let outcome = machine.advance("4", &mut matrix);
        assert_eq!(machine.phase(), SessionPhase::SetSolution);
        assert_eq!(outcome.prompt, Prompt::Solution { index: 0 });
        assert_eq!(matrix.coefficients(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn full_setup_reaches_round_loop() {
        let mut machine = SessionStateMachine::new();
        let mut matrix = SharedMatrixState::new(Role::Host);
        feed(&mut machine, &mut matrix, &["2", "2", "1", "2", "3", "4", "5"]);

        let outcome = machine.advance("6", &mut matrix);
        assert_eq!(outcome.deltas, vec![MatrixDelta::Augmented(vec![17.0, 39.0])]);
        assert_eq!(machine.phase(), SessionPhase::ConfirmSetup);
        assert_eq!(outcome.prompt, Prompt::ConfirmSetup);

        let outcome = machine.advance("", &mut matrix);
        assert_eq!(outcome.prompt, Prompt::StartGame);
        assert!(!outcome.game_started);

        let outcome = machine.advance("anything", &mut matrix);
        assert!(outcome.game_started);
        assert_eq!(machine.phase(), SessionPhase::ViewingMatrix);
        assert_eq!(matrix.solution(), Some(&[5.0, 6.0][..]));
    }

    #[test]
    fn invalid_input_keeps_phase_and_cursor() {
        let cases: &[(&[&str], &[&str])] = &[
            (&[], &["abc", "0", "-3", "2.5", "65", ""]),
            (&["2"], &["x", "0", "1e3"]),
            (&["2", "2", "1"], &["one", "NaN", "inf", ""]),
            (&["1", "2", "1", "1", "7"], &["--", "infinity"]),
        ];
        for (setup, invalid) in cases {
            let mut machine = SessionStateMachine::new();
            let mut matrix = SharedMatrixState::new(Role::Host);
            feed(&mut machine, &mut matrix, setup);
            let phase = machine.phase();
            let cursor = machine.cursor();
            let prompt = machine.prompt();
            let coefficients = matrix.coefficients().to_vec();
            for input in *invalid {
                let outcome = machine.advance(input, &mut matrix);
                assert!(!outcome.accepted, "{input:?} accepted in {phase:?}");
                assert!(outcome.retry);
                assert_eq!(outcome.prompt, prompt);
                assert!(outcome.deltas.is_empty());
                assert_eq!(machine.phase(), phase);
                assert_eq!(machine.cursor(), cursor);
                assert_eq!(matrix.coefficients(), &coefficients[..]);
            }
        }
    }

    #[test]
    fn setup_input_during_rounds_is_out_of_phase() {
        let mut machine = SessionStateMachine::new();
        let mut matrix = SharedMatrixState::new(Role::Host);
        feed(&mut machine, &mut matrix, &["1", "1", "2", "3", "", ""]);
        assert_eq!(machine.phase(), SessionPhase::ViewingMatrix);

        let outcome = machine.advance("5", &mut matrix);
        assert!(!outcome.accepted);
        assert!(!outcome.retry);
        assert_eq!(outcome.prompt, Prompt::RoundInProgress);
        assert_eq!(matrix.coefficient(0, 0), 2.0);
    }

    #[test]
    fn round_cycle_returns_to_viewing() {
        let mut machine = SessionStateMachine::new();
        let mut matrix = SharedMatrixState::new(Role::Host);
        feed(&mut machine, &mut matrix, &["1", "1", "2", "3", "", ""]);

        machine.resolve_round();
        assert_eq!(machine.phase(), SessionPhase::ViewingMatrix);
        machine.begin_round();
        assert_eq!(machine.phase(), SessionPhase::AdjustingSliders);
        machine.begin_round();
        assert_eq!(machine.phase(), SessionPhase::AdjustingSliders);
        machine.resolve_round();
        assert_eq!(machine.phase(), SessionPhase::ViewingMatrix);

        machine.abandon_round();
        assert_eq!(machine.phase(), SessionPhase::ViewingMatrix);
        machine.begin_round();
        machine.abandon_round();
        assert_eq!(machine.phase(), SessionPhase::ViewingMatrix);
    }
}
